//! Plotly figure builders
//!
//! Every builder is a pure function from aggregated data to a `Figure`, which
//! serializes to the JSON shape `Plotly.react` expects. Only the attributes a
//! chart sets are emitted.

use serde::Serialize;
use serde_json::Value;

use crate::config::HOVER_BACKGROUND;
use crate::metrics::resample::{AggregatedPeriod, Granularity};

pub mod bar;
pub mod composition;
pub mod heatmap;
pub mod line;

pub use bar::{before_after_chart, recovery_bar_chart};
pub use composition::{ridership_pie_chart, variability_box_plot};
pub use heatmap::{correlation_heatmap, recovery_heatmap};
pub use line::{dual_axis_chart, scatter_with_trend, service_line_chart, sparkline};

const TRANSPARENT: &str = "rgba(0,0,0,0)";

// ============================================================================
// Figure
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn new(data: Vec<Trace>, layout: Layout) -> Self {
        Self { data, layout }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    #[default]
    Scatter,
    Bar,
    Heatmap,
    Pie,
    Box,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<&'static str>,
}

/// A single colour or one colour per point
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Paint {
    Single(String),
    PerPoint(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Paint>,
    /// Slice colours; pie traces read `colors` instead of `color`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

impl Marker {
    pub fn solid(color: &str) -> Self {
        Self {
            color: Some(Paint::Single(color.to_string())),
            ..Self::default()
        }
    }

    pub fn per_point<'a>(colors: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            color: Some(Paint::PerPoint(colors.into_iter().map(str::to_string).collect())),
            ..Self::default()
        }
    }
}

/// One Plotly trace. Scatter, bar, heatmap, pie and box traces share this
/// struct; unset attributes are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<Vec<Vec<Option<f64>>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub textposition: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customdata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoverinfo: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    /// Axis binding for secondary-axis traces ("y2")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,

    // pie
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<&'static str>,

    // heatmap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zmin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zmax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showscale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorbar: Option<Value>,

    // box, from precomputed statistics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q1: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q3: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowerfence: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upperfence: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sd: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boxmean: Option<&'static str>,
}

impl Trace {
    pub fn of(kind: TraceKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }
}

// ============================================================================
// Layout
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Font {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Font {
    pub fn new(size: u32, color: &str) -> Self {
        Self {
            family: None,
            size: Some(size),
            color: Some(color.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverLabel {
    pub bgcolor: &'static str,
    pub font: Font,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namelength: Option<i32>,
}

impl Default for HoverLabel {
    /// Dark label with white text, shared by every chart
    fn default() -> Self {
        Self {
            bgcolor: HOVER_BACKGROUND,
            font: Font::new(14, "#FFFFFF"),
            align: None,
            namelength: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xanchor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickmode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickvals: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticktext: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickformat: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickangle: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showgrid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showticklabels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automargin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<&'static str>,
}

impl Axis {
    /// Axis carrying thinned period ticks
    pub fn periods(ticks: Ticks) -> Self {
        Self {
            tickmode: Some("array"),
            tickvals: Some(ticks.values),
            ticktext: Some(ticks.labels),
            showgrid: Some(false),
            ..Self::default()
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: Some(false),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Annotation {
    pub text: String,
    pub x: Value,
    pub y: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xref: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yref: Option<&'static str>,
    pub showarrow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrowhead: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ax: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ay: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xanchor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yanchor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgcolor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl Annotation {
    /// Grey caption positioned in paper coordinates
    pub fn note(text: &str, x: f64, y: f64) -> Self {
        Self {
            text: text.to_string(),
            x: Value::from(x),
            y: Value::from(y),
            xref: Some("paper"),
            yref: Some("paper"),
            showarrow: false,
            font: Some(Font::new(12, "grey")),
            align: Some("center"),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub t: u32,
    pub b: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Option<Title>,
    pub template: &'static str,
    pub plot_bgcolor: &'static str,
    pub paper_bgcolor: &'static str,
    pub hoverlabel: HoverLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis2: Option<Axis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updatemenus: Option<Value>,
}

impl Layout {
    /// White template, transparent background and the shared hover label
    pub fn titled(text: impl Into<String>) -> Self {
        Self {
            title: Some(Title {
                text: text.into(),
                ..Title::default()
            }),
            ..Self::default()
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            title: None,
            template: "plotly_white",
            plot_bgcolor: TRANSPARENT,
            paper_bgcolor: TRANSPARENT,
            hoverlabel: HoverLabel::default(),
            xaxis: None,
            yaxis: None,
            yaxis2: None,
            annotations: Vec::new(),
            height: None,
            width: None,
            margin: None,
            legend: None,
            showlegend: None,
            barmode: None,
            updatemenus: None,
        }
    }
}

// ============================================================================
// Period axis helpers
// ============================================================================

/// X coordinate of a period: the year for yearly data, the bucket date otherwise
pub fn period_x(period: &AggregatedPeriod, granularity: Granularity) -> Value {
    match period.year {
        Some(year) if granularity == Granularity::Year => Value::from(year.to_string()),
        _ => Value::from(period.date.format("%Y-%m-%d").to_string()),
    }
}

pub fn period_xs(periods: &[AggregatedPeriod], granularity: Granularity) -> Vec<Value> {
    periods.iter().map(|p| period_x(p, granularity)).collect()
}

/// Tick positions and their labels
#[derive(Debug, Clone, PartialEq)]
pub struct Ticks {
    pub values: Vec<Value>,
    pub labels: Vec<String>,
}

/// Every `len / max_labels`-th period, so an axis carries at most about
/// `max_labels` ticks
pub fn thinned_ticks(periods: &[AggregatedPeriod], granularity: Granularity) -> Ticks {
    let step = (periods.len() / granularity.max_labels()).max(1);
    let kept = periods.iter().step_by(step);
    Ticks {
        values: kept.clone().map(|p| period_x(p, granularity)).collect(),
        labels: kept.map(|p| p.label.clone()).collect(),
    }
}

pub fn numbers<I: IntoIterator<Item = f64>>(values: I) -> Vec<Value> {
    values.into_iter().map(Value::from).collect()
}

pub fn strings<I, S>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(|s| Value::String(s.into())).collect()
}
