//! Headline KPIs of the full dataset
//!
//! These ignore the granularity and service selection and are computed once
//! per loaded table.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Calendar;
use crate::error::MetricError;
use crate::format::{millions, percent, with_commas};
use crate::metrics::recovery::{top_service_recovery, total_recovery, yoy_growth};
use crate::models::{DateWindow, RidershipTable, Service};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiBundle {
    pub peak_date: NaiveDate,
    pub peak_total: f64,
    pub total_recovery: f64,
    pub top_service: Service,
    pub top_service_recovery: f64,
    pub yoy_growth: f64,
    pub avg_lockdown_ridership: f64,
    pub avg_post_lockdown_ridership: f64,
}

/// Card text of a `KpiBundle`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiDisplay {
    pub highest_ridership_day: String,
    pub total_ridership: String,
    pub total_recovery: String,
    pub top_service: String,
    pub recovery_percentage: String,
    pub yoy_growth: String,
    pub avg_lockdown_ridership: String,
    pub avg_post_lockdown_ridership: String,
}

impl KpiBundle {
    pub fn display(&self) -> KpiDisplay {
        KpiDisplay {
            highest_ridership_day: self.peak_date.format("%d %b %Y").to_string(),
            total_ridership: millions(self.peak_total),
            total_recovery: percent(self.total_recovery),
            top_service: self.top_service.name().to_string(),
            recovery_percentage: percent(self.top_service_recovery),
            yoy_growth: percent(self.yoy_growth),
            avg_lockdown_ridership: with_commas(self.avg_lockdown_ridership),
            avg_post_lockdown_ridership: with_commas(self.avg_post_lockdown_ridership),
        }
    }
}

/// Day with the largest all-service ridership inside `window`.
/// The earliest day wins a tie.
pub fn highest_ridership_day(table: &RidershipTable, window: &DateWindow) -> Result<(NaiveDate, f64), MetricError> {
    table
        .window(window)
        .map(|r| (r.date, r.total()))
        .reduce(|best, day| if day.1 > best.1 { day } else { best })
        .ok_or(MetricError::EmptyWindow("peak ridership"))
}

/// Mean all-service daily ridership inside `window`
pub fn average_daily_ridership(
    table: &RidershipTable,
    window: &DateWindow,
    name: &'static str,
) -> Result<f64, MetricError> {
    let (days, sum) = table
        .window(window)
        .fold((0usize, 0.0), |(n, sum), r| (n + 1, sum + r.total()));
    if days == 0 {
        return Err(MetricError::EmptyWindow(name));
    }
    Ok(sum / days as f64)
}

pub fn create_kpis(table: &RidershipTable, calendar: &Calendar) -> Result<KpiBundle, MetricError> {
    let (peak_date, peak_total) = highest_ridership_day(table, &calendar.post_pandemic())?;
    let baseline = calendar.baseline();
    let top = top_service_recovery(table, &baseline, &calendar.current)?;

    Ok(KpiBundle {
        peak_date,
        peak_total,
        total_recovery: total_recovery(table, &baseline, &calendar.current),
        top_service: top.service,
        top_service_recovery: top.recovery,
        yoy_growth: yoy_growth(table, &calendar.yoy_baseline, &calendar.yoy_current),
        avg_lockdown_ridership: average_daily_ridership(table, &calendar.lockdown, "lockdown")?,
        avg_post_lockdown_ridership: average_daily_ridership(table, &calendar.post_lockdown(), "post-lockdown")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{daily_table, date};
    use chrono::Datelike;

    fn test_calendar() -> Calendar {
        Calendar {
            pandemic_declared: date(2020, 3, 11),
            current: DateWindow::between(date(2021, 10, 1), date(2021, 10, 10)),
            first_post_pandemic: DateWindow::between(date(2020, 10, 1), date(2020, 10, 10)),
            yoy_baseline: DateWindow::month(2020, 10).unwrap(),
            yoy_current: DateWindow::month(2021, 10).unwrap(),
            lockdown: DateWindow::between(date(2020, 3, 11), date(2020, 6, 8)),
            post_lockdown_start: date(2020, 6, 9),
        }
    }

    fn ridership(d: NaiveDate, s: Service) -> f64 {
        let base = match d.year() {
            2020 if d < date(2020, 3, 11) => 1_000_000.0,
            2020 if d <= date(2020, 6, 8) => 100_000.0,
            2020 => 400_000.0,
            _ => 840_000.0,
        };
        if s == Service::AccessARide && d.year() == 2021 {
            base * 1.5
        } else if d == date(2021, 7, 4) {
            base * 2.0
        } else {
            base
        }
    }

    #[test]
    fn test_create_kpis() {
        // ten baseline days (Mar 1-10) against ten current days
        let table = daily_table(date(2020, 3, 1), date(2021, 10, 31), ridership, 0.0);
        let kpis = create_kpis(&table, &test_calendar()).unwrap();

        assert_eq!(kpis.peak_date, date(2021, 7, 4));
        assert_eq!(kpis.top_service, Service::AccessARide);
        assert!((kpis.top_service_recovery - 126.0).abs() < 1e-9);
        assert!((kpis.avg_lockdown_ridership - 700_000.0).abs() < 1e-6);
        assert!(kpis.yoy_growth > 100.0);

        let display = kpis.display();
        assert_eq!(display.highest_ridership_day, "04 Jul 2021");
        assert_eq!(display.top_service, "Access-A-Ride");
        assert_eq!(display.avg_lockdown_ridership, "700,000");
    }

    #[test]
    fn test_total_recovery_84_percent() {
        // one service carries the ridership so the window sums are exact
        let table = daily_table(
            date(2020, 3, 1),
            date(2021, 10, 31),
            |d, s| match (s, d) {
                (Service::Subways, d) if d < date(2020, 3, 11) => 100_000.0,
                (Service::Subways, d) if test_calendar().current.contains(d) => 84_000.0,
                _ => 0.0,
            },
            0.0,
        );
        let kpis = create_kpis(&table, &test_calendar()).unwrap();
        assert_eq!(kpis.total_recovery, 84.0);
        assert_eq!(kpis.display().total_recovery, "84.0%");
    }

    #[test]
    fn test_missing_window_is_an_error() {
        let table = daily_table(date(2019, 1, 1), date(2019, 12, 31), |_, _| 1.0, 0.0);
        assert_eq!(
            create_kpis(&table, &test_calendar()),
            Err(MetricError::EmptyWindow("peak ridership"))
        );
    }
}
