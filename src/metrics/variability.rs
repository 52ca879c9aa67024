use serde::Serialize;

use crate::models::{DateWindow, RidershipTable, Service};

/// Distribution of one service's daily ridership
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub service: Service,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation
    pub sd: f64,
}

/// Quantile of sorted data by linear interpolation between closest ranks
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

pub fn box_stats(values: &[f64], service: Service) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let sd = if sorted.len() > 1 {
        (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };

    Some(BoxStats {
        service,
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
        mean,
        sd,
    })
}

/// Daily spread per service inside `window`
pub fn daily_variability(table: &RidershipTable, window: &DateWindow, services: &[Service]) -> Vec<BoxStats> {
    services
        .iter()
        .filter_map(|&service| {
            let values: Vec<f64> = table.window(window).map(|r| r.count(service)).collect();
            box_stats(&values, service)
        })
        .collect()
}
