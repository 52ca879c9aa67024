//! Period resampling of the daily table
//!
//! Buckets are labelled by their last calendar day (month end, quarter end,
//! year end, Sunday for weeks). Each bucket holds the mean of the days that
//! fall in it, so partial periods at either end of the data are averaged over
//! the days present.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MetricError;
use crate::models::{RidershipRecord, RidershipTable, Service, SERVICE_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    /// Choices offered by the dashboard controls
    pub const EXPOSED: [Granularity; 3] = [Granularity::Month, Granularity::Quarter, Granularity::Year];

    pub fn name(self) -> &'static str {
        match self {
            Granularity::Day => "Day",
            Granularity::Week => "Week",
            Granularity::Month => "Month",
            Granularity::Quarter => "Quarter",
            Granularity::Year => "Year",
        }
    }

    pub fn adjective(self) -> &'static str {
        match self {
            Granularity::Day => "Daily",
            Granularity::Week => "Weekly",
            Granularity::Month => "Monthly",
            Granularity::Quarter => "Quarterly",
            Granularity::Year => "Yearly",
        }
    }

    pub fn is_exposed(self) -> bool {
        Self::EXPOSED.contains(&self)
    }

    /// Label date of the bucket containing `date`
    pub fn bucket_end(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Week => {
                let to_sunday = 6 - date.weekday().num_days_from_monday() as i64;
                date + Duration::days(to_sunday)
            }
            Granularity::Month => last_day_of_month(date.year(), date.month()),
            Granularity::Quarter => {
                let quarter_end_month = quarter(date) * 3;
                last_day_of_month(date.year(), quarter_end_month)
            }
            Granularity::Year => last_day_of_month(date.year(), 12),
        }
    }

    /// Axis label of a bucket: "2020-Mar", "2020-Q1", "2020"
    pub fn axis_label(self, date: NaiveDate) -> String {
        match self {
            Granularity::Month => date.format("%Y-%b").to_string(),
            Granularity::Quarter => format!("{}-Q{}", date.year(), quarter(date)),
            Granularity::Year => date.year().to_string(),
            Granularity::Day | Granularity::Week => date.format("%Y-%m-%d").to_string(),
        }
    }

    /// Most tick labels an axis should carry before thinning
    pub fn max_labels(self) -> usize {
        if self == Granularity::Month {
            12
        } else {
            8
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Granularity {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "quarter" => Ok(Granularity::Quarter),
            "year" => Ok(Granularity::Year),
            _ => Err(MetricError::UnknownGranularity(s.trim().to_string())),
        }
    }
}

pub fn quarter(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// One resampled bucket: integer-rounded means per service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedPeriod {
    pub date: NaiveDate,
    pub label: String,
    /// Calendar year of the bucket; only set for yearly granularity
    pub year: Option<i32>,
    pub counts: [i64; SERVICE_COUNT],
    pub pcts: [i64; SERVICE_COUNT],
}

impl AggregatedPeriod {
    pub fn count(&self, service: Service) -> i64 {
        self.counts[service.index()]
    }

    pub fn pct(&self, service: Service) -> i64 {
        self.pcts[service.index()]
    }
}

#[derive(Default)]
struct Accumulator {
    days: usize,
    counts: [f64; SERVICE_COUNT],
    pcts: [f64; SERVICE_COUNT],
}

impl Accumulator {
    fn add(&mut self, record: &RidershipRecord) {
        self.days += 1;
        for k in 0..SERVICE_COUNT {
            self.counts[k] += record.counts[k];
            self.pcts[k] += record.pcts[k];
        }
    }

    fn finish(&self, date: NaiveDate, granularity: Granularity) -> AggregatedPeriod {
        let n = self.days.max(1) as f64;
        AggregatedPeriod {
            date,
            label: granularity.axis_label(date),
            year: (granularity == Granularity::Year).then(|| date.year()),
            counts: self.counts.map(|sum| (sum / n).round_ties_even() as i64),
            pcts: self.pcts.map(|sum| (sum / n).round_ties_even() as i64),
        }
    }
}

/// Group the daily table into calendar buckets and average each bucket.
/// Only buckets that contain at least one day are emitted.
pub fn resample(table: &RidershipTable, granularity: Granularity) -> Vec<AggregatedPeriod> {
    let mut periods = Vec::new();
    let mut current: Option<(NaiveDate, Accumulator)> = None;

    for record in table.records() {
        let bucket = granularity.bucket_end(record.date);
        match current.as_mut() {
            Some((end, acc)) if *end == bucket => acc.add(record),
            _ => {
                if let Some((end, acc)) = current.take() {
                    periods.push(acc.finish(end, granularity));
                }
                let mut acc = Accumulator::default();
                acc.add(record);
                current = Some((bucket, acc));
            }
        }
    }
    if let Some((end, acc)) = current {
        periods.push(acc.finish(end, granularity));
    }

    periods
}

/// Counts expressed in whole thousands; percentages are left as published
pub fn to_thousands(table: &RidershipTable) -> RidershipTable {
    table.map_records(|r| RidershipRecord {
        date: r.date,
        counts: r.counts.map(|c| (c / 1_000.0).round_ties_even()),
        pcts: r.pcts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{daily_table, date};

    #[test]
    fn test_bucket_ends() {
        let d = date(2020, 2, 12);
        assert_eq!(Granularity::Month.bucket_end(d), date(2020, 2, 29));
        assert_eq!(Granularity::Quarter.bucket_end(d), date(2020, 3, 31));
        assert_eq!(Granularity::Year.bucket_end(d), date(2020, 12, 31));
        // 2020-02-12 is a Wednesday
        assert_eq!(Granularity::Week.bucket_end(d), date(2020, 2, 16));
        assert_eq!(Granularity::Week.bucket_end(date(2020, 2, 16)), date(2020, 2, 16));
        assert_eq!(Granularity::Day.bucket_end(d), d);
    }

    #[test]
    fn test_axis_labels() {
        let d = date(2021, 8, 31);
        assert_eq!(Granularity::Month.axis_label(d), "2021-Aug");
        assert_eq!(Granularity::Quarter.axis_label(d), "2021-Q3");
        assert_eq!(Granularity::Year.axis_label(d), "2021");
    }

    #[test]
    fn test_parse_granularity() {
        assert_eq!("Quarter".parse::<Granularity>().unwrap(), Granularity::Quarter);
        assert_eq!("year".parse::<Granularity>().unwrap(), Granularity::Year);
        assert!("Fortnight".parse::<Granularity>().is_err());
        assert!(!Granularity::Week.is_exposed());
        assert_eq!(Granularity::Year.adjective(), "Yearly");
    }

    #[test]
    fn test_all_ones_yearly() {
        let table = daily_table(date(2018, 1, 1), date(2024, 12, 31), |_, _| 1.0, 100.0);
        let periods = resample(&table, Granularity::Year);
        assert_eq!(periods.len(), 7);
        for (period, year) in periods.iter().zip(2018..=2024) {
            assert_eq!(period.year, Some(year));
            assert_eq!(period.label, year.to_string());
            assert!(period.counts.iter().all(|c| *c == 1));
            assert!(period.pcts.iter().all(|p| *p == 100));
        }
    }

    #[test]
    fn test_bucket_mean_within_daily_range() {
        let table = daily_table(
            date(2019, 11, 17),
            date(2021, 2, 3),
            |d, s| ((d.ordinal() * 37 + s.index() as u32 * 101) % 977) as f64,
            50.0,
        );
        for granularity in [Granularity::Week, Granularity::Month, Granularity::Quarter, Granularity::Year] {
            for period in resample(&table, granularity) {
                for service in Service::ALL {
                    let values: Vec<f64> = table
                        .records()
                        .iter()
                        .filter(|r| granularity.bucket_end(r.date) == period.date)
                        .map(|r| r.count(service))
                        .collect();
                    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
                    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    let mean = period.count(service) as f64;
                    assert!(mean >= min && mean <= max, "{granularity} {service} {mean} not in [{min}, {max}]");
                }
            }
        }
    }

    #[test]
    fn test_year_label_matches_underlying_dates() {
        let table = daily_table(date(2019, 6, 1), date(2022, 3, 1), |_, _| 5.0, 80.0);
        let periods = resample(&table, Granularity::Year);
        for period in &periods {
            let year = period.year.unwrap();
            assert!(table
                .records()
                .iter()
                .filter(|r| Granularity::Year.bucket_end(r.date) == period.date)
                .all(|r| r.date.year() == year));
        }
        assert_eq!(periods.iter().map(|p| p.year.unwrap()).collect::<Vec<_>>(), vec![2019, 2020, 2021, 2022]);
    }

    #[test]
    fn test_partial_period_uses_present_days() {
        // January only holds the 30th (10) and the 31st (12)
        let table = daily_table(
            date(2020, 1, 30),
            date(2020, 2, 2),
            |d, _| match (d.month(), d.day()) {
                (1, 30) => 10.0,
                (1, _) => 12.0,
                _ => 7.0,
            },
            0.0,
        );
        let periods = resample(&table, Granularity::Month);
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].date, date(2020, 1, 31));
        assert_eq!(periods[0].count(Service::Buses), 11);
        assert_eq!(periods[1].count(Service::Buses), 7);
        assert_eq!(periods[0].year, None);
    }

    #[test]
    fn test_rounding_is_half_even() {
        let table = daily_table(
            date(2020, 1, 1),
            date(2020, 1, 2),
            |d, _| if d.day() == 1 { 2.0 } else { 3.0 },
            0.0,
        );
        let periods = resample(&table, Granularity::Month);
        assert_eq!(periods[0].count(Service::Subways), 2);
    }

    #[test]
    fn test_to_thousands() {
        let table = daily_table(date(2020, 1, 1), date(2020, 1, 1), |_, _| 2_345_678.0, 91.0);
        let thousands = to_thousands(&table);
        assert_eq!(thousands.records()[0].count(Service::Subways), 2346.0);
        assert_eq!(thousands.records()[0].pct(Service::Subways), 91.0);
        assert_eq!(table.records()[0].count(Service::Subways), 2_345_678.0);
    }
}
