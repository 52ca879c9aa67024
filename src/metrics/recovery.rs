//! Baseline-versus-current recovery ratios

use serde::Serialize;

use crate::error::MetricError;
use crate::format::round_to;
use crate::models::{DateWindow, RidershipTable, Service, SERVICE_COUNT};

/// Sum of the given services' counts over every day in `window`
pub fn window_sum(table: &RidershipTable, window: &DateWindow, services: &[Service]) -> f64 {
    table
        .window(window)
        .map(|r| services.iter().map(|s| r.count(*s)).sum::<f64>())
        .sum()
}

/// Per-service count totals over `window`, indexed like `Service::ALL`
pub fn window_totals(table: &RidershipTable, window: &DateWindow) -> [f64; SERVICE_COUNT] {
    let mut totals = [0.0; SERVICE_COUNT];
    for record in table.window(window) {
        for (total, count) in totals.iter_mut().zip(record.counts) {
            *total += count;
        }
    }
    totals
}

/// `current / baseline * 100`; zero when there is no baseline ridership
pub fn recovery_percentage(current: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        current / baseline * 100.0
    } else {
        0.0
    }
}

/// `(current - baseline) / baseline * 100`; zero when there is no baseline ridership
pub fn growth_percentage(current: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        (current - baseline) / baseline * 100.0
    } else {
        0.0
    }
}

/// All-service recovery of `current` against `baseline`
pub fn total_recovery(table: &RidershipTable, baseline: &DateWindow, current: &DateWindow) -> f64 {
    recovery_percentage(
        window_sum(table, current, &Service::ALL),
        window_sum(table, baseline, &Service::ALL),
    )
}

/// All-service growth of `current` over `baseline`
pub fn yoy_growth(table: &RidershipTable, baseline: &DateWindow, current: &DateWindow) -> f64 {
    growth_percentage(
        window_sum(table, current, &Service::ALL),
        window_sum(table, baseline, &Service::ALL),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ServiceRecovery {
    pub service: Service,
    pub recovery: f64,
}

/// Recovery of every service from its own counts (not the published percentages)
pub fn service_recoveries(table: &RidershipTable, baseline: &DateWindow, current: &DateWindow) -> Vec<ServiceRecovery> {
    let baseline_totals = window_totals(table, baseline);
    let current_totals = window_totals(table, current);
    Service::ALL
        .into_iter()
        .map(|service| ServiceRecovery {
            service,
            recovery: recovery_percentage(current_totals[service.index()], baseline_totals[service.index()]),
        })
        .collect()
}

/// Service recoveries to one decimal, weakest first
pub fn ranked_recoveries(table: &RidershipTable, baseline: &DateWindow, current: &DateWindow) -> Vec<ServiceRecovery> {
    let mut ranked: Vec<ServiceRecovery> = service_recoveries(table, baseline, current)
        .into_iter()
        .map(|r| ServiceRecovery {
            recovery: round_to(r.recovery, 1),
            ..r
        })
        .collect();
    ranked.sort_by(|a, b| a.recovery.total_cmp(&b.recovery));
    ranked
}

/// Service with the highest recovery. Ties go to the earlier service.
pub fn top_service_recovery(
    table: &RidershipTable,
    baseline: &DateWindow,
    current: &DateWindow,
) -> Result<ServiceRecovery, MetricError> {
    service_recoveries(table, baseline, current)
        .into_iter()
        .reduce(|best, r| if r.recovery > best.recovery { r } else { best })
        .ok_or(MetricError::EmptyWindow("service recovery"))
}
