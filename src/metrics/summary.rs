use serde::Serialize;

use crate::error::MetricError;
use crate::format::{round_to, with_commas};
use crate::metrics::resample::AggregatedPeriod;
use crate::models::Service;

/// Last-period figure of one service card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodMetric {
    pub service: Service,
    /// Last period's mean ridership, in thousands
    pub last_period_value: i64,
    pub ridership_last_period: String,
    /// Change from the previous period in percent; `None` when undefined
    pub percent_change: Option<f64>,
}

/// Card metrics for the selected services, in selection order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub entries: Vec<PeriodMetric>,
}

impl MetricsSummary {
    pub fn get(&self, service: Service) -> Option<&PeriodMetric> {
        self.entries.iter().find(|m| m.service == service)
    }
}

/// `(last - previous) / previous * 100` to two decimals.
/// A zero previous value has no defined change.
pub fn percent_change(last: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some(round_to((last - previous) / previous * 100.0, 2))
}

/// Card text for a value held in thousands: "2.3M" or "845K"
pub fn ridership_label(thousands: i64) -> String {
    if thousands > 1_000 {
        format!("{:.1}M", round_to(thousands as f64 / 1_000.0, 1))
    } else {
        format!("{}K", with_commas(thousands as f64))
    }
}

pub fn create_metrics(periods: &[AggregatedPeriod], services: &[Service]) -> Result<MetricsSummary, MetricError> {
    let last = periods.last().ok_or(MetricError::NoPeriods)?;
    let previous = periods.len().checked_sub(2).map(|i| &periods[i]);

    let entries = services
        .iter()
        .map(|&service| {
            let value = last.count(service);
            PeriodMetric {
                service,
                last_period_value: value,
                ridership_last_period: ridership_label(value),
                percent_change: previous.and_then(|p| percent_change(value as f64, p.count(service) as f64)),
            }
        })
        .collect();

    Ok(MetricsSummary { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::resample::{resample, Granularity};
    use crate::models::fixtures::{daily_table, date};
    use chrono::Datelike;

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(100.0, 120.0), Some(-16.67));
        assert_eq!(percent_change(120.0, 100.0), Some(20.0));
        assert_eq!(percent_change(5.0, 0.0), None);
    }

    #[test]
    fn test_ridership_label() {
        assert_eq!(ridership_label(2_345), "2.3M");
        assert_eq!(ridership_label(1_000), "1,000K");
        assert_eq!(ridership_label(845), "845K");
    }

    #[test]
    fn test_create_metrics_last_two_periods() {
        // previous month 120, last month 100
        let table = daily_table(
            date(2024, 9, 1),
            date(2024, 10, 31),
            |d, _| if d.month() == 9 { 120.0 } else { 100.0 },
            0.0,
        );
        let periods = resample(&table, Granularity::Month);
        let metrics = create_metrics(&periods, &[Service::Subways, Service::Buses]).unwrap();
        assert_eq!(metrics.entries.len(), 2);
        let subways = metrics.get(Service::Subways).unwrap();
        assert_eq!(subways.percent_change, Some(-16.67));
        assert_eq!(subways.ridership_last_period, "100K");
        assert!(metrics.get(Service::Lirr).is_none());
    }

    #[test]
    fn test_create_metrics_edge_cases() {
        assert_eq!(create_metrics(&[], &[Service::Subways]), Err(MetricError::NoPeriods));

        let table = daily_table(date(2024, 1, 1), date(2024, 1, 31), |_, _| 10.0, 0.0);
        let periods = resample(&table, Granularity::Month);
        let metrics = create_metrics(&periods, &Service::ALL).unwrap();
        assert!(metrics.entries.iter().all(|m| m.percent_change.is_none()));
    }
}
