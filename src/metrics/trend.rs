use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{RidershipTable, Service};

/// Least-squares fit of daily ridership against the date ordinal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLine {
    pub service: Service,
    pub slope: f64,
    pub intercept: f64,
    /// Fitted value on every observed date
    pub points: Vec<(NaiveDate, f64)>,
}

impl TrendLine {
    pub fn value_at(&self, date: NaiveDate) -> f64 {
        self.slope * ordinal(date) + self.intercept
    }
}

/// Proleptic Gregorian ordinal; 0001-01-01 is day 1
pub fn ordinal(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Ordinary least squares of `ys` on `xs`, returning `(slope, intercept)`
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

/// Trend of one service over the daily table
pub fn trend_line(table: &RidershipTable, service: Service) -> Option<TrendLine> {
    let dates: Vec<NaiveDate> = table.records().iter().map(|r| r.date).collect();
    let xs: Vec<f64> = dates.iter().copied().map(ordinal).collect();
    let ys: Vec<f64> = table.records().iter().map(|r| r.count(service)).collect();

    let (slope, intercept) = linear_regression(&xs, &ys)?;
    let points = dates
        .into_iter()
        .zip(xs)
        .map(|(date, x)| (date, slope * x + intercept))
        .collect();

    Some(TrendLine {
        service,
        slope,
        intercept,
        points,
    })
}

/// Trend lines of the selected services; services without a fit are skipped
pub fn trend_lines(table: &RidershipTable, services: &[Service]) -> Vec<TrendLine> {
    services.iter().filter_map(|s| trend_line(table, *s)).collect()
}
