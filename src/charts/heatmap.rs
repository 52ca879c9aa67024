use serde_json::{json, Value};

use super::{period_xs, strings, thinned_ticks, Annotation, Axis, Figure, Font, Layout, Margin, Title, Trace, TraceKind};
use crate::metrics::correlation::{display_value, CorrelationMatrix};
use crate::metrics::resample::{AggregatedPeriod, Granularity};
use crate::models::Service;

/// Light text on strongly coloured cells, grey elsewhere
fn cell_text_colour(value: Option<f64>) -> &'static str {
    match value {
        Some(v) if v < -0.5 || v > 0.7 => "white",
        _ => "#404040",
    }
}

/// Correlation grid with the diagonal running top-left to bottom-right
pub fn correlation_heatmap(matrix: &CorrelationMatrix, granularity: Granularity) -> Figure {
    let names: Vec<&str> = matrix.services.iter().map(|s| s.name()).collect();
    let rows: Vec<usize> = (0..matrix.services.len()).rev().collect();

    let annotations = rows
        .iter()
        .flat_map(|&i| {
            names.iter().enumerate().map(move |(j, column)| {
                let value = matrix.values[i][j];
                Annotation {
                    text: display_value(value),
                    x: Value::from(*column),
                    y: Value::from(matrix.services[i].name()),
                    xref: Some("x"),
                    yref: Some("y"),
                    showarrow: false,
                    font: Some(Font::new(12, cell_text_colour(value))),
                    ..Annotation::default()
                }
            })
        })
        .collect();

    let trace = Trace {
        z: Some(rows.iter().map(|&i| matrix.values[i].clone()).collect()),
        x: Some(strings(names.iter().copied())),
        y: Some(strings(rows.iter().map(|&i| matrix.services[i].name()))),
        colorscale: Some("RdBu_r"),
        zmin: matrix.min_value(),
        zmax: Some(1.0),
        hoverinfo: Some("text"),
        showscale: Some(false),
        ..Trace::of(TraceKind::Heatmap)
    };

    Figure::new(
        vec![trace],
        Layout {
            title: Some(Title {
                text: format!("Service Recovery Correlation ({})", granularity),
                x: Some(0.5),
                xanchor: Some("center"),
                font: None,
            }),
            annotations,
            height: Some(500),
            margin: Some(Margin { l: 10, r: 10, t: 100, b: 10 }),
            ..Layout::default()
        },
    )
}

/// Each service's period means as a percentage of that service's best period
pub fn normalized_rows(periods: &[AggregatedPeriod], services: &[Service]) -> Vec<Vec<Option<f64>>> {
    services
        .iter()
        .map(|&service| {
            let max = periods.iter().map(|p| p.count(service)).max().unwrap_or(0);
            periods
                .iter()
                .map(|p| {
                    if max > 0 {
                        Some(p.count(service) as f64 / max as f64 * 100.0)
                    } else {
                        Some(0.0)
                    }
                })
                .collect()
        })
        .collect()
}

pub fn recovery_heatmap(periods: &[AggregatedPeriod], granularity: Granularity) -> Figure {
    let services = Service::ALL;
    let labelled = matches!(granularity, Granularity::Month | Granularity::Quarter);

    let trace = Trace {
        z: Some(normalized_rows(periods, &services)),
        x: Some(period_xs(periods, granularity)),
        y: Some(strings(services.iter().map(|s| s.name()))),
        colorscale: Some("RdBu"),
        colorbar: Some(json!({"title": "Recovery Percentage", "len": 0.5})),
        zmin: Some(0.0),
        zmax: Some(100.0),
        ..Trace::of(TraceKind::Heatmap)
    };

    let xaxis = Axis {
        tickangle: Some(if labelled { 45 } else { 0 }),
        showgrid: None,
        ..Axis::periods(thinned_ticks(periods, granularity))
    };

    Figure::new(
        vec![trace],
        Layout {
            xaxis: Some(xaxis),
            annotations: vec![Annotation::note(
                "Metro-North and LIRR took until October 2021 to recover more than 50% of Pre-Pandemic Levels",
                0.5,
                1.08,
            )],
            ..Layout::titled(format!("Ridership Recovery by Service and Time ({})", granularity))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_support::sample_periods;
    use crate::metrics::correlation::correlation_matrix;

    #[test]
    fn test_correlation_heatmap_layout() {
        let periods = sample_periods(Granularity::Month);
        let matrix = correlation_matrix(&periods, &Service::ALL);
        let figure = correlation_heatmap(&matrix, Granularity::Month);

        let json = figure.to_json();
        let trace = &json["data"][0];
        assert_eq!(trace["type"], "heatmap");
        assert_eq!(trace["y"][0], "Staten Island Railway");
        assert_eq!(trace["x"][0], "Subways");
        assert_eq!(trace["zmax"], 1.0);
        // bottom-left cell is Subways against itself
        assert_eq!(trace["z"][6][0], 1.0);
        assert_eq!(figure.layout.annotations.len(), 49);

        let diagonal = figure
            .layout
            .annotations
            .iter()
            .find(|a| a.x == Value::from("Buses") && a.y == Value::from("Buses"))
            .unwrap();
        assert_eq!(diagonal.text, "1");
        assert_eq!(diagonal.font.as_ref().unwrap().color.as_deref(), Some("white"));
    }

    #[test]
    fn test_cell_text_colour() {
        assert_eq!(cell_text_colour(Some(-0.6)), "white");
        assert_eq!(cell_text_colour(Some(0.2)), "#404040");
        assert_eq!(cell_text_colour(None), "#404040");
    }

    #[test]
    fn test_recovery_heatmap_rows_peak_at_100() {
        let periods = sample_periods(Granularity::Quarter);
        let rows = normalized_rows(&periods, &Service::ALL);
        for row in &rows {
            let max = row.iter().flatten().cloned().fold(f64::MIN, f64::max);
            assert_eq!(max, 100.0);
            assert!(row.iter().flatten().all(|v| (0.0..=100.0).contains(v)));
        }

        let figure = recovery_heatmap(&periods, Granularity::Quarter);
        let json = figure.to_json();
        assert_eq!(json["data"][0]["zmin"], 0.0);
        assert_eq!(json["data"][0]["zmax"], 100.0);
        assert_eq!(json["layout"]["xaxis"]["tickangle"], 45);
    }

    #[test]
    fn test_zero_row_is_zero() {
        let mut periods = sample_periods(Granularity::Year);
        for p in periods.iter_mut() {
            p.counts[Service::Buses.index()] = 0;
        }
        let rows = normalized_rows(&periods, &[Service::Buses]);
        assert!(rows[0].iter().all(|v| *v == Some(0.0)));
    }
}
