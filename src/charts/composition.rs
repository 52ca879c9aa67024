use chrono::NaiveDate;
use serde_json::{json, Value};

use super::{Annotation, Axis, Figure, Font, Layout, Margin, Marker, Title, Trace, TraceKind};
use crate::config::colour;
use crate::format::with_commas;
use crate::metrics::variability::BoxStats;
use crate::models::{Service, SERVICE_COUNT};

const SHARE_NOTE: &str = "The shift in ridership share highlights evolving commuting patterns post-pandemic.";

fn centre_total(total: f64) -> Annotation {
    Annotation {
        text: format!("<b>{}</b>", with_commas(total)),
        x: Value::from(0.5),
        y: Value::from(0.5),
        showarrow: false,
        font: Some(Font::new(24, "black")),
        ..Annotation::default()
    }
}

fn donut(label: &str, totals: &[f64; SERVICE_COUNT], visible: bool) -> Trace {
    Trace {
        name: Some(label.to_string()),
        labels: Some(Service::ALL.iter().map(|s| s.name().to_string()).collect()),
        values: Some(totals.to_vec()),
        hole: Some(0.6),
        sort: Some(true),
        direction: Some("clockwise"),
        marker: Some(Marker {
            colors: Some(Service::ALL.iter().map(|s| colour(*s).to_string()).collect()),
            ..Marker::default()
        }),
        hoverinfo: Some("skip"),
        hovertemplate: Some(format!(
            "<b>Chart Type:</b> {}<br><b>Service:</b> %{{label}}<br><b>Ridership:</b> %{{value:,}}<br><b>Percentage:</b> %{{percent:.1%}}<extra></extra>",
            label
        )),
        visible: Some(visible),
        ..Trace::of(TraceKind::Pie)
    }
}

/// Service share of the baseline and current windows as two donuts; buttons
/// switch between them and swap the centre total
pub fn ridership_pie_chart(pre: &[f64; SERVICE_COUNT], post: &[f64; SERVICE_COUNT]) -> Figure {
    let pre_total = centre_total(pre.iter().sum());
    let post_total = centre_total(post.iter().sum());
    let note = Annotation::note(SHARE_NOTE, 0.5, -0.1);

    let button = |label: &str, visible: [bool; 2], total: &Annotation| {
        json!({
            "label": label,
            "method": "update",
            "args": [
                {"visible": visible},
                {"annotations": [total, note]},
            ],
        })
    };
    let updatemenus = json!([{
        "type": "buttons",
        "direction": "down",
        "showactive": true,
        "x": 0.1,
        "y": 1.1,
        "buttons": [
            button("Pre-Pandemic", [true, false], &pre_total),
            button("Post-Pandemic", [false, true], &post_total),
        ],
    }]);

    Figure::new(
        vec![donut("Pre-Pandemic", pre, true), donut("Post-Pandemic", post, false)],
        Layout {
            title: Some(Title {
                text: "Ridership Composition".to_string(),
                x: Some(0.0),
                xanchor: Some("left"),
                font: Some(Font {
                    size: Some(16),
                    ..Font::default()
                }),
            }),
            width: Some(600),
            margin: Some(Margin { l: 0, r: 0, t: 75, b: 0 }),
            legend: Some(json!({
                "orientation": "h",
                "traceorder": "normal",
                "yanchor": "top",
                "y": -0.1,
                "xanchor": "center",
                "x": 0.5,
                "font": {"size": 10},
            })),
            updatemenus: Some(updatemenus),
            annotations: vec![pre_total.clone(), note.clone()],
            ..Layout::default()
        },
    )
}

/// One box per service drawn from precomputed quartiles, with mean and
/// standard deviation markers
pub fn variability_box_plot(stats: &[BoxStats], start: NaiveDate, end: NaiveDate) -> Figure {
    let data = stats
        .iter()
        .map(|s| Trace {
            name: Some(s.service.name().to_string()),
            x: Some(vec![Value::from(s.service.name())]),
            q1: Some(vec![s.q1]),
            median: Some(vec![s.median]),
            q3: Some(vec![s.q3]),
            lowerfence: Some(vec![s.min]),
            upperfence: Some(vec![s.max]),
            mean: Some(vec![s.mean]),
            sd: Some(vec![s.sd]),
            boxmean: Some("sd"),
            marker: Some(Marker::solid(colour(s.service))),
            ..Trace::of(TraceKind::Box)
        })
        .collect();

    Figure::new(
        data,
        Layout {
            yaxis: Some(Axis {
                title: Some("Ridership".to_string()),
                ..Axis::default()
            }),
            showlegend: Some(false),
            height: Some(600),
            ..Layout::titled(format!(
                "Daily Ridership Variability by Service ({} to {})",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            ))
        },
    )
}
