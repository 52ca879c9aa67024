//! Line and scatter charts over time

use chrono::{Months, NaiveDate};
use serde_json::{json, Value};

use super::{
    numbers, period_xs, strings, thinned_ticks, Annotation, Axis, Figure, Font, Layout, Line, Margin, Marker,
    Trace, TraceKind,
};
use crate::config::{colour, tinted, Calendar, DARK_BLUE, DARK_ORANGE};
use crate::format::with_commas;
use crate::metrics::resample::{AggregatedPeriod, Granularity};
use crate::metrics::summary::PeriodMetric;
use crate::metrics::trend::TrendLine;
use crate::models::{RidershipTable, Service};

const RIDERSHIP_HOVER: &str =
    "<b>Service:</b> %{customdata}<br><b>Date:</b> %{x|%d %B %Y}<br><b>Ridership:</b> %{y:,.0f} (000's)<extra></extra>";

fn service_tags(service: Service, len: usize) -> Value {
    Value::from(vec![service.name(); len])
}

fn counts(periods: &[AggregatedPeriod], service: Service) -> Vec<Value> {
    periods.iter().map(|p| Value::from(p.count(service))).collect()
}

/// Marker on a period with an arrow pointing at it
fn event_marker(text: &str, x: Value, y: Value, ax: i32, ay: i32) -> Annotation {
    Annotation {
        text: text.to_string(),
        x,
        y,
        showarrow: true,
        arrowhead: Some(7),
        ax: Some(ax),
        ay: Some(ay),
        font: Some(Font {
            family: Some("Arial"),
            size: Some(12),
            color: Some("black".to_string()),
        }),
        align: Some("left"),
        xanchor: Some("left"),
        yanchor: Some("bottom"),
        bgcolor: Some("white"),
        opacity: Some(0.8),
        ..Annotation::default()
    }
}

/// Index of the period whose bucket holds `date`, if the series covers it
fn bucket_of(periods: &[AggregatedPeriod], granularity: Granularity, date: NaiveDate) -> Option<usize> {
    let end = granularity.bucket_end(date);
    periods.iter().position(|p| p.date == end)
}

/// Average ridership per period for each selected service.
/// Monthly charts mark the pandemic declaration and the start of reopening
/// on the buckets holding those calendar dates.
pub fn service_line_chart(
    periods: &[AggregatedPeriod],
    granularity: Granularity,
    services: &[Service],
    calendar: &Calendar,
) -> Figure {
    let xs = period_xs(periods, granularity);

    let data = services
        .iter()
        .map(|&service| Trace {
            name: Some(service.name().to_string()),
            x: Some(xs.clone()),
            y: Some(counts(periods, service)),
            mode: Some("lines"),
            line: Some(Line {
                color: Some(colour(service).to_string()),
                ..Line::default()
            }),
            customdata: Some(service_tags(service, periods.len())),
            hovertemplate: Some(RIDERSHIP_HOVER.to_string()),
            ..Trace::of(TraceKind::Scatter)
        })
        .collect();

    let mut annotations = Vec::new();
    if granularity == Granularity::Month {
        if let (Some(first), Some(last)) = (services.first(), services.last()) {
            if let Some(i) = bucket_of(periods, granularity, calendar.pandemic_declared) {
                annotations.push(event_marker(
                    "March 11, 2020<br>WHO Declared<br>Global Covid<br>Pandemic.",
                    xs[i].clone(),
                    Value::from(periods[i].count(*first)),
                    40,
                    -20,
                ));
            }
            if let Some(i) = bucket_of(periods, granularity, calendar.post_lockdown_start) {
                annotations.push(event_marker(
                    "Monday, June 8, 2020<br>NYC Starts Phase 1<br>of Reopening Plan.",
                    xs[i].clone(),
                    Value::from(periods[i].count(*last)),
                    130,
                    -190,
                ));
            }
        }
    }

    let mut xaxis = Axis::periods(thinned_ticks(periods, granularity));
    if let (Some(first), Some(last)) = (xs.first(), xs.last()) {
        xaxis.range = Some(vec![first.clone(), last.clone()]);
    }

    Figure::new(
        data,
        Layout {
            xaxis: Some(xaxis),
            yaxis: Some(Axis {
                title: Some("Average Ridership (Thousands)".to_string()),
                tickformat: Some(",0f"),
                showgrid: Some(false),
                ..Axis::default()
            }),
            annotations,
            ..Layout::titled(format!("{} Recovery Trends in Ridership by Time Period", granularity))
        },
    )
}

/// Ridership on the primary axis, recovery percentage dotted on the secondary
pub fn dual_axis_chart(periods: &[AggregatedPeriod], granularity: Granularity, services: &[Service]) -> Figure {
    let xs = period_xs(periods, granularity);
    let mut data = Vec::with_capacity(services.len() * 2);

    for &service in services {
        data.push(Trace {
            name: Some(format!("{} Ridership", service)),
            x: Some(xs.clone()),
            y: Some(counts(periods, service)),
            mode: Some("lines"),
            line: Some(Line {
                color: Some(colour(service).to_string()),
                ..Line::default()
            }),
            customdata: Some(service_tags(service, periods.len())),
            hovertemplate: Some(RIDERSHIP_HOVER.to_string()),
            ..Trace::of(TraceKind::Scatter)
        });
        data.push(Trace {
            name: Some(format!("{} Recovery %", service)),
            x: Some(xs.clone()),
            y: Some(periods.iter().map(|p| Value::from(p.pct(service))).collect()),
            mode: Some("lines"),
            line: Some(Line {
                color: Some(tinted(service).to_string()),
                dash: Some("dot"),
                ..Line::default()
            }),
            customdata: Some(service_tags(service, periods.len())),
            hovertemplate: Some(
                "<b>Service:</b> %{customdata}<br><b>Date:</b> %{x|%d %B %Y}<br><b>Recovery:</b> %{y:.0f}%<extra></extra>"
                    .to_string(),
            ),
            yaxis: Some("y2"),
            ..Trace::of(TraceKind::Scatter)
        });
    }

    Figure::new(
        data,
        Layout {
            xaxis: Some(Axis {
                automargin: Some(true),
                ..Axis::periods(thinned_ticks(periods, granularity))
            }),
            yaxis: Some(Axis {
                tickformat: Some(",0f"),
                ..Axis::default()
            }),
            yaxis2: Some(Axis {
                title: Some("Recovery Percentage (%)".to_string()),
                tickformat: Some(".0f"),
                overlaying: Some("y"),
                side: Some("right"),
                showgrid: Some(false),
                ..Axis::default()
            }),
            margin: Some(Margin { l: 50, r: 50, t: 50, b: 50 }),
            legend: Some(json!({"orientation": "v", "xanchor": "right", "yanchor": "top", "x": 1.3, "y": 1})),
            ..Layout::titled("Ridership and Recovery Percentage by Service")
        },
    )
}

/// Periods shown on a card sparkline: the last two years for yearly data,
/// otherwise the twelve months up to the latest period
pub fn sparkline_window(periods: &[AggregatedPeriod], granularity: Granularity) -> &[AggregatedPeriod] {
    let Some(last) = periods.last() else {
        return periods;
    };
    let start = if granularity == Granularity::Year {
        let max_year = last.year.unwrap_or(0);
        periods.iter().position(|p| p.year.unwrap_or(0) >= max_year - 1)
    } else {
        let cutoff = last.date.checked_sub_months(Months::new(12));
        periods.iter().position(|p| cutoff.map_or(true, |c| p.date > c))
    };
    &periods[start.unwrap_or(0)..]
}

/// Small unlabelled line for a ridership card; blue when the last change is
/// not negative, orange otherwise
pub fn sparkline(periods: &[AggregatedPeriod], granularity: Granularity, metric: &PeriodMetric) -> Figure {
    let window = sparkline_window(periods, granularity);
    let line_colour = match metric.percent_change {
        Some(change) if change < 0.0 => DARK_ORANGE,
        _ => DARK_BLUE,
    };

    let trace = Trace {
        x: Some(period_xs(window, granularity)),
        y: Some(counts(window, metric.service)),
        mode: Some("lines"),
        line: Some(Line {
            color: Some(line_colour.to_string()),
            width: Some(2.0),
            ..Line::default()
        }),
        showlegend: Some(false),
        text: Some(window.iter().map(|p| with_commas(p.count(metric.service) as f64)).collect()),
        hovertemplate: Some("%{text}<extra></extra>".to_string()),
        ..Trace::of(TraceKind::Scatter)
    };

    Figure::new(
        vec![trace],
        Layout {
            title: None,
            height: Some(60),
            margin: Some(Margin { l: 10, r: 10, t: 10, b: 10 }),
            xaxis: Some(Axis::hidden()),
            yaxis: Some(Axis::hidden()),
            ..Layout::default()
        },
    )
}

/// Daily ridership markers with a dashed least-squares trend per service
pub fn scatter_with_trend(table: &RidershipTable, services: &[Service], trends: &[TrendLine]) -> Figure {
    let dates = strings(table.records().iter().map(|r| r.date.format("%Y-%m-%d").to_string()));
    let mut data = Vec::new();

    for &service in services {
        data.push(Trace {
            name: Some(format!("{} Ridership", service)),
            x: Some(dates.clone()),
            y: Some(numbers(table.records().iter().map(|r| r.count(service)))),
            mode: Some("markers"),
            marker: Some(Marker {
                size: Some(6.0),
                ..Marker::solid(colour(service))
            }),
            showlegend: Some(true),
            customdata: Some(service_tags(service, table.len())),
            hovertemplate: Some(
                "<b>Service:</b> %{customdata}<br><b>Date:</b> %{x|%d %B %Y}<br><b>Ridership:</b> %{y:,.0f}<extra></extra>"
                    .to_string(),
            ),
            ..Trace::of(TraceKind::Scatter)
        });

        if let Some(trend) = trends.iter().find(|t| t.service == service) {
            data.push(Trace {
                name: Some(format!("{} Trendline", service)),
                x: Some(strings(trend.points.iter().map(|(d, _)| d.format("%Y-%m-%d").to_string()))),
                y: Some(numbers(trend.points.iter().map(|(_, v)| *v))),
                mode: Some("lines"),
                line: Some(Line {
                    color: Some(tinted(service).to_string()),
                    dash: Some("dash"),
                    ..Line::default()
                }),
                showlegend: Some(true),
                ..Trace::of(TraceKind::Scatter)
            });
        }
    }

    Figure::new(
        data,
        Layout {
            xaxis: Some(Axis {
                showgrid: Some(false),
                ..Axis::default()
            }),
            margin: Some(Margin { l: 50, r: 150, t: 50, b: 50 }),
            legend: Some(json!({"orientation": "v", "yanchor": "top", "y": 0.9, "xanchor": "right", "x": 1.25})),
            ..Layout::titled("Ridership Recovery Trajectories for Selected Services")
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_support::{sample_periods, sample_table};
    use crate::metrics::summary::create_metrics;
    use crate::metrics::trend::trend_lines;
    use crate::models::fixtures::date;

    #[test]
    fn test_service_line_chart() {
        let periods = sample_periods(Granularity::Month);
        let services = [Service::Subways, Service::Lirr];
        let figure = service_line_chart(&periods, Granularity::Month, &services, &Calendar::default());
        assert_eq!(figure.data.len(), 2);
        assert_eq!(figure.layout.annotations.len(), 2);
        assert!(figure.layout.annotations[0].text.starts_with("March 11, 2020"));

        let json = figure.to_json();
        assert_eq!(json["data"][0]["name"], "Subways");
        assert_eq!(json["data"][0]["line"]["color"], "#012A4A");
        assert_eq!(json["data"][1]["customdata"][0], "LIRR");
        assert_eq!(
            json["layout"]["title"]["text"],
            "Month Recovery Trends in Ridership by Time Period"
        );

        let yearly = service_line_chart(
            &sample_periods(Granularity::Year),
            Granularity::Year,
            &services,
            &Calendar::default(),
        );
        assert!(yearly.layout.annotations.is_empty());
        assert_eq!(yearly.to_json()["data"][0]["x"][0], "2019");
    }

    #[test]
    fn test_event_markers_sit_on_their_months() {
        // sample data starts in January 2019, well before the declaration
        let periods = sample_periods(Granularity::Month);
        let services = [Service::Subways, Service::Lirr];
        let figure = service_line_chart(&periods, Granularity::Month, &services, &Calendar::default());

        let pandemic = &figure.layout.annotations[0];
        assert_eq!(pandemic.x, Value::from("2020-03-31"));
        let march = periods.iter().find(|p| p.label == "2020-Mar").unwrap();
        assert_eq!(pandemic.y, Value::from(march.count(Service::Subways)));

        let reopening = &figure.layout.annotations[1];
        assert_eq!(reopening.x, Value::from("2020-06-30"));
        let june = periods.iter().find(|p| p.label == "2020-Jun").unwrap();
        assert_eq!(reopening.y, Value::from(june.count(Service::Lirr)));
    }

    #[test]
    fn test_event_markers_follow_the_calendar() {
        let periods = sample_periods(Granularity::Month);
        let calendar = Calendar {
            pandemic_declared: date(2021, 2, 14),
            post_lockdown_start: date(2030, 1, 1),
            ..Calendar::default()
        };
        let figure = service_line_chart(&periods, Granularity::Month, &[Service::Buses], &calendar);
        // reopening lies past the end of the series and is left out
        assert_eq!(figure.layout.annotations.len(), 1);
        assert_eq!(figure.layout.annotations[0].x, Value::from("2021-02-28"));

        let before_data = Calendar {
            pandemic_declared: date(2018, 6, 1),
            post_lockdown_start: date(2018, 7, 1),
            ..Calendar::default()
        };
        let figure = service_line_chart(&periods, Granularity::Month, &[Service::Buses], &before_data);
        assert!(figure.layout.annotations.is_empty());
    }

    #[test]
    fn test_dual_axis_chart() {
        let periods = sample_periods(Granularity::Quarter);
        let figure = dual_axis_chart(&periods, Granularity::Quarter, &[Service::Buses]);
        assert_eq!(figure.data.len(), 2);
        let recovery = &figure.data[1];
        assert_eq!(recovery.yaxis, Some("y2"));
        assert_eq!(recovery.line.as_ref().unwrap().dash, Some("dot"));
        assert_eq!(recovery.line.as_ref().unwrap().color.as_deref(), Some(tinted(Service::Buses)));
        assert_eq!(recovery.y.as_ref().unwrap()[0], Value::from(75));
    }

    #[test]
    fn test_sparkline_window_and_colour() {
        let monthly = sample_periods(Granularity::Month);
        let window = sparkline_window(&monthly, Granularity::Month);
        assert_eq!(window.len(), 12);
        assert_eq!(window[0].label, "2023-Nov");

        let yearly = sample_periods(Granularity::Year);
        let window = sparkline_window(&yearly, Granularity::Year);
        assert_eq!(window.iter().map(|p| p.year.unwrap()).collect::<Vec<_>>(), vec![2023, 2024]);

        let metrics = create_metrics(&monthly, &[Service::Subways]).unwrap();
        let figure = sparkline(&monthly, Granularity::Month, &metrics.entries[0]);
        // October is above September in the sample data
        assert_eq!(figure.data[0].line.as_ref().unwrap().color.as_deref(), Some(DARK_BLUE));

        let falling = PeriodMetric {
            percent_change: Some(-3.0),
            ..metrics.entries[0].clone()
        };
        let figure = sparkline(&monthly, Granularity::Month, &falling);
        assert_eq!(figure.data[0].line.as_ref().unwrap().color.as_deref(), Some(DARK_ORANGE));
    }

    #[test]
    fn test_scatter_with_trend() {
        let table = sample_table();
        let services = [Service::MetroNorth, Service::StatenIslandRailway];
        let trends = trend_lines(&table, &services);
        let figure = scatter_with_trend(&table, &services, &trends);
        assert_eq!(figure.data.len(), 4);
        assert_eq!(figure.data[0].mode, Some("markers"));
        assert_eq!(figure.data[1].line.as_ref().unwrap().dash, Some("dash"));
        assert_eq!(figure.data[1].name.as_deref(), Some("Metro-North Trendline"));
        assert_eq!(figure.data[0].x.as_ref().unwrap().len(), table.len());
    }
}
