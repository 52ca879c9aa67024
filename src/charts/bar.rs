use serde_json::{json, Value};

use super::{numbers, strings, Annotation, Axis, Figure, Font, HoverLabel, Layout, Margin, Marker, Title, Trace, TraceKind};
use crate::config::{colour, tinted};
use crate::format::percent;
use crate::metrics::recovery::ServiceRecovery;
use crate::models::{Service, SERVICE_COUNT};

/// Hover comments attached to individual services on the recovery bars
fn recovery_comment(service: Service) -> &'static str {
    match service {
        Service::AccessARide => {
            "Access-A-Ride, providing transportation for people<br>with disabilities, exceeded pre-pandemic levels,<br>reflecting consistent need for accessible<br>transportation."
        }
        Service::BridgesAndTunnels => {
            "Bridges and Tunnels, Note: The upcoming congestion<br>charge in January 2025 may lead to reduced usage of<br>Bridges and Tunnels, as drivers may opt for public<br>transportation."
        }
        _ => "",
    }
}

/// Horizontal recovery bars. `ranked` is expected weakest first, as produced
/// by `ranked_recoveries`.
pub fn recovery_bar_chart(ranked: &[ServiceRecovery]) -> Figure {
    let trace = Trace {
        x: Some(numbers(ranked.iter().map(|r| r.recovery))),
        y: Some(strings(ranked.iter().map(|r| r.service.name()))),
        text: Some(ranked.iter().map(|r| percent(r.recovery)).collect()),
        textposition: Some("auto"),
        orientation: Some("h"),
        marker: Some(Marker::per_point(ranked.iter().map(|r| colour(r.service)))),
        customdata: Some(Value::from(
            ranked
                .iter()
                .map(|r| json!([r.service.name(), recovery_comment(r.service)]))
                .collect::<Vec<_>>(),
        )),
        hovertemplate: Some(
            "<b>Service:</b> %{customdata[0]}<br><b>Recovery:</b> %{x:.1f}%<br>%{customdata[1]}<extra></extra>"
                .to_string(),
        ),
        ..Trace::of(TraceKind::Bar)
    };

    Figure::new(
        vec![trace],
        Layout {
            xaxis: Some(Axis {
                tickformat: Some(".0f"),
                showticklabels: Some(false),
                showgrid: Some(false),
                ..Axis::default()
            }),
            yaxis: Some(Axis {
                automargin: Some(true),
                ..Axis::default()
            }),
            margin: Some(Margin { l: 150, r: 20, t: 80, b: 40 }),
            hoverlabel: HoverLabel {
                align: Some("left"),
                namelength: Some(-1),
                ..HoverLabel::default()
            },
            annotations: vec![Annotation::note(
                "<b>Metro-North</b> has shown the most complete recovery.",
                0.5,
                1.08,
            )],
            ..Layout::titled("MTA Service Recovery Since 2020")
        },
    )
}

/// Pre-pandemic and current window totals side by side, in millions, sorted
/// so the largest pre-pandemic service sits on top
pub fn before_after_chart(pre: &[f64; SERVICE_COUNT], post: &[f64; SERVICE_COUNT], services: &[Service]) -> Figure {
    let mut order: Vec<Service> = services.to_vec();
    order.sort_by(|a, b| pre[a.index()].total_cmp(&pre[b.index()]));
    let Some(&largest) = order.last() else {
        return Figure::new(Vec::new(), Layout::titled("Service Ridership Comparison: Pre-Pandemic vs. Post-Pandemic"));
    };

    let names = strings(order.iter().map(|s| s.name()));
    let bars = |label: &str, totals: &[f64; SERVICE_COUNT], shade: fn(Service) -> &'static str| Trace {
        name: Some(label.to_string()),
        y: Some(names.clone()),
        x: Some(numbers(order.iter().map(|s| totals[s.index()] / 1_000_000.0))),
        orientation: Some("h"),
        marker: Some(Marker::per_point(order.iter().map(|s| shade(*s)))),
        customdata: Some(Value::from(names.clone())),
        text: Some(order.iter().map(|s| format!("{:.1}M", totals[s.index()] / 1_000_000.0)).collect()),
        textposition: Some("outside"),
        hovertemplate: Some(format!(
            "{}<br><b>Service:</b> %{{customdata}}<br><b>Ridership:</b> %{{x:.1f}}M<extra></extra>",
            label
        )),
        showlegend: Some(false),
        ..Trace::of(TraceKind::Bar)
    };
    let legend_entry = |label: &str, shade: &str| Trace {
        name: Some(label.to_string()),
        x: Some(vec![Value::Null]),
        y: Some(vec![Value::Null]),
        marker: Some(Marker::solid(shade)),
        showlegend: Some(true),
        ..Trace::of(TraceKind::Bar)
    };

    let data = vec![
        bars("Post-Pandemic", post, colour),
        bars("Pre-Pandemic", pre, tinted),
        legend_entry("Pre-Pandemic", tinted(largest)),
        legend_entry("Post-Pandemic", colour(largest)),
    ];

    Figure::new(
        data,
        Layout {
            title: Some(Title {
                text: "Service Ridership Comparison: Pre-Pandemic vs. Post-Pandemic".to_string(),
                x: Some(0.0),
                xanchor: Some("left"),
                font: Some(Font {
                    size: Some(16),
                    ..Font::default()
                }),
            }),
            barmode: Some("group"),
            legend: Some(json!({"orientation": "h", "yanchor": "bottom", "y": 1.02, "xanchor": "center", "x": 0.5})),
            margin: Some(Margin { l: 0, r: 20, t: 80, b: 50 }),
            xaxis: Some(Axis {
                showticklabels: Some(false),
                showgrid: Some(false),
                ..Axis::default()
            }),
            ..Layout::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_bar_chart() {
        let ranked = vec![
            ServiceRecovery { service: Service::Subways, recovery: 68.2 },
            ServiceRecovery { service: Service::AccessARide, recovery: 124.6 },
        ];
        let figure = recovery_bar_chart(&ranked);
        let json = figure.to_json();
        let bar = &json["data"][0];
        assert_eq!(bar["type"], "bar");
        assert_eq!(bar["orientation"], "h");
        assert_eq!(bar["text"][0], "68.2%");
        assert_eq!(bar["y"][1], "Access-A-Ride");
        assert_eq!(bar["marker"]["color"][1], colour(Service::AccessARide));
        assert!(bar["customdata"][1][1].as_str().unwrap().starts_with("Access-A-Ride"));
        assert_eq!(bar["customdata"][0][1], "");
        assert!(json["layout"]["annotations"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Metro-North"));
    }

    #[test]
    fn test_before_after_sorted_by_pre_pandemic() {
        let pre = [5.0e6, 9.0e6, 1.0e6, 2.0e6, 3.0e6, 4.0e6, 0.5e6];
        let post = [4.0e6, 6.0e6, 1.0e6, 2.0e6, 3.5e6, 4.0e6, 0.2e6];
        let figure = before_after_chart(&pre, &post, &Service::ALL);
        assert_eq!(figure.data.len(), 4);

        let json = figure.to_json();
        let post_bars = &json["data"][0];
        assert_eq!(post_bars["name"], "Post-Pandemic");
        assert_eq!(post_bars["y"][0], "Staten Island Railway");
        assert_eq!(post_bars["y"][6], "Buses");
        assert_eq!(post_bars["text"][6], "6.0M");
        assert_eq!(json["data"][1]["text"][6], "9.0M");
        // legend swatches use the largest service's colours
        assert_eq!(json["data"][3]["marker"]["color"], colour(Service::Buses));
        assert_eq!(json["layout"]["barmode"], "group");
    }
}
