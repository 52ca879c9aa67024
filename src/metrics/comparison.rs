//! Pre-pandemic versus post-pandemic comparison table

use serde::Serialize;

use crate::config::Calendar;
use crate::format::{percent, with_commas};
use crate::models::{DateWindow, RidershipTable, Service, SERVICE_COUNT};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub service: Service,
    pub pre_pandemic: f64,
    pub first_post_pandemic: f64,
    pub current: f64,
    /// Mean daily ridership of the first post-pandemic window over the baseline mean
    pub post_pct: Option<f64>,
    pub current_pct: Option<f64>,
}

/// Table cells as shown on the page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonCells {
    #[serde(rename = "Service")]
    pub service: String,
    #[serde(rename = "Pre-Pandemic")]
    pub pre_pandemic: String,
    #[serde(rename = "First Post-Pandemic Year")]
    pub first_post_pandemic: String,
    #[serde(rename = "Current Year")]
    pub current: String,
    #[serde(rename = "% of Pre-Pandemic (Post)")]
    pub post_pct: String,
    #[serde(rename = "% of Pre-Pandemic (Current)")]
    pub current_pct: String,
}

pub const COMPARISON_HEADERS: [&str; 6] = [
    "Service",
    "Pre-Pandemic",
    "First Post-Pandemic Year",
    "Current Year",
    "% of Pre-Pandemic (Post)",
    "% of Pre-Pandemic (Current)",
];

impl ComparisonRow {
    pub fn cells(&self) -> ComparisonCells {
        let ratio = |v: Option<f64>| v.map(percent).unwrap_or_else(|| "n/a".to_string());
        ComparisonCells {
            service: self.service.name().to_string(),
            pre_pandemic: with_commas(self.pre_pandemic),
            first_post_pandemic: with_commas(self.first_post_pandemic),
            current: with_commas(self.current),
            post_pct: ratio(self.post_pct),
            current_pct: ratio(self.current_pct),
        }
    }

    pub fn as_array(&self) -> [String; 6] {
        let c = self.cells();
        [c.service, c.pre_pandemic, c.first_post_pandemic, c.current, c.post_pct, c.current_pct]
    }
}

struct WindowStats {
    days: usize,
    totals: [f64; SERVICE_COUNT],
}

impl WindowStats {
    fn collect(table: &RidershipTable, window: &DateWindow) -> Self {
        let mut stats = Self {
            days: 0,
            totals: [0.0; SERVICE_COUNT],
        };
        for record in table.window(window) {
            stats.days += 1;
            for (total, count) in stats.totals.iter_mut().zip(record.counts) {
                *total += count;
            }
        }
        stats
    }

    fn mean(&self, service: Service) -> Option<f64> {
        (self.days > 0).then(|| self.totals[service.index()] / self.days as f64)
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d * 100.0),
        _ => None,
    }
}

/// One row per service: window totals plus average-based recovery ratios
pub fn comparison_table(table: &RidershipTable, calendar: &Calendar) -> Vec<ComparisonRow> {
    let pre = WindowStats::collect(table, &calendar.baseline());
    let post = WindowStats::collect(table, &calendar.first_post_pandemic);
    let current = WindowStats::collect(table, &calendar.current);

    Service::ALL
        .into_iter()
        .map(|service| {
            let i = service.index();
            ComparisonRow {
                service,
                pre_pandemic: pre.totals[i],
                first_post_pandemic: post.totals[i],
                current: current.totals[i],
                post_pct: ratio(post.mean(service), pre.mean(service)),
                current_pct: ratio(current.mean(service), pre.mean(service)),
            }
        })
        .collect()
}
