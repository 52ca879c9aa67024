use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DataError, MetricError};

/// Number of services reported in the daily ridership file
pub const SERVICE_COUNT: usize = 7;

/// Transit service reported in the daily ridership file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Service {
    #[serde(rename = "Subways")]
    Subways,
    #[serde(rename = "Buses")]
    Buses,
    #[serde(rename = "LIRR")]
    Lirr,
    #[serde(rename = "Metro-North")]
    MetroNorth,
    #[serde(rename = "Access-A-Ride")]
    AccessARide,
    #[serde(rename = "Bridges and Tunnels")]
    BridgesAndTunnels,
    #[serde(rename = "Staten Island Railway")]
    StatenIslandRailway,
}

impl Service {
    /// Every service, in the column order of the source file
    pub const ALL: [Service; SERVICE_COUNT] = [
        Service::Subways,
        Service::Buses,
        Service::Lirr,
        Service::MetroNorth,
        Service::AccessARide,
        Service::BridgesAndTunnels,
        Service::StatenIslandRailway,
    ];

    /// Canonical display name, also used as the count column name
    pub fn name(self) -> &'static str {
        match self {
            Service::Subways => "Subways",
            Service::Buses => "Buses",
            Service::Lirr => "LIRR",
            Service::MetroNorth => "Metro-North",
            Service::AccessARide => "Access-A-Ride",
            Service::BridgesAndTunnels => "Bridges and Tunnels",
            Service::StatenIslandRailway => "Staten Island Railway",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Header of the count column as published in the raw file
    pub fn raw_count_header(self) -> String {
        let suffix = match self {
            Service::AccessARide => "Total Scheduled Trips",
            Service::BridgesAndTunnels => "Total Traffic",
            _ => "Total Estimated Ridership",
        };
        format!("{}: {}", self.name(), suffix)
    }

    /// Header of the percentage column as published in the raw file
    pub fn raw_pct_header(self) -> String {
        format!("{}: % of Comparable Pre-Pandemic Day", self.name())
    }

    /// Canonical name of the percentage column
    pub fn pct_column(self) -> String {
        format!("{}: % of Pre-Pandemic", self.name())
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Service {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Service::ALL
            .into_iter()
            .find(|service| service.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| MetricError::UnknownService(trimmed.to_string()))
    }
}

/// One day of ridership across every service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RidershipRecord {
    pub date: NaiveDate,
    pub counts: [f64; SERVICE_COUNT],
    pub pcts: [f64; SERVICE_COUNT],
}

impl RidershipRecord {
    pub fn new(date: NaiveDate, counts: [f64; SERVICE_COUNT], pcts: [f64; SERVICE_COUNT]) -> Self {
        Self { date, counts, pcts }
    }

    pub fn count(&self, service: Service) -> f64 {
        self.counts[service.index()]
    }

    pub fn pct(&self, service: Service) -> f64 {
        self.pcts[service.index()]
    }

    /// Sum of the counts of every service on this day
    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }
}

/// Inclusive date range; an open end is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start: Some(start), end: Some(end) }
    }

    /// Every date strictly before `date`
    pub fn before(date: NaiveDate) -> Self {
        Self { start: None, end: date.pred_opt() }
    }

    /// Every date on or after `date`
    pub fn from(date: NaiveDate) -> Self {
        Self { start: Some(date), end: None }
    }

    /// The whole calendar month containing `year`/`month`
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self::between(start, next.pred_opt()?))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Daily ridership ordered by date. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RidershipTable {
    records: Vec<RidershipRecord>,
}

impl RidershipTable {
    /// Sorts the rows by date and rejects empty input or repeated dates
    pub fn new(mut records: Vec<RidershipRecord>) -> Result<Self, DataError> {
        if records.is_empty() {
            return Err(DataError::Empty);
        }
        records.sort_by_key(|r| r.date);
        if let Some(pair) = records.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(DataError::DuplicateDate(pair[1].date));
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[RidershipRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.date.year()).collect();
        years.dedup();
        years
    }

    pub fn window<'a>(&'a self, window: &'a DateWindow) -> impl Iterator<Item = &'a RidershipRecord> + 'a {
        self.records.iter().filter(move |r| window.contains(r.date))
    }

    /// Derived table with every record transformed; row order is preserved
    pub(crate) fn map_records(&self, f: impl Fn(&RidershipRecord) -> RidershipRecord) -> Self {
        Self {
            records: self.records.iter().map(f).collect(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_service_headers() {
        assert_eq!(Service::Subways.raw_count_header(), "Subways: Total Estimated Ridership");
        assert_eq!(Service::AccessARide.raw_count_header(), "Access-A-Ride: Total Scheduled Trips");
        assert_eq!(Service::BridgesAndTunnels.raw_count_header(), "Bridges and Tunnels: Total Traffic");
        assert_eq!(Service::Lirr.raw_pct_header(), "LIRR: % of Comparable Pre-Pandemic Day");
        assert_eq!(Service::MetroNorth.pct_column(), "Metro-North: % of Pre-Pandemic");
    }

    #[test]
    fn test_service_from_str() {
        assert_eq!("Metro-North".parse::<Service>().unwrap(), Service::MetroNorth);
        assert_eq!(" staten island railway ".parse::<Service>().unwrap(), Service::StatenIslandRailway);
        assert!("Ferries".parse::<Service>().is_err());
    }

    #[test]
    fn test_table_sorts_and_rejects_duplicates() {
        let later = RidershipRecord::new(date(2020, 1, 2), [2.0; 7], [0.0; 7]);
        let earlier = RidershipRecord::new(date(2020, 1, 1), [1.0; 7], [0.0; 7]);
        let table = RidershipTable::new(vec![later.clone(), earlier.clone()]).unwrap();
        assert_eq!(table.first_date(), Some(date(2020, 1, 1)));
        assert_eq!(table.last_date(), Some(date(2020, 1, 2)));

        let dup = RidershipTable::new(vec![earlier.clone(), earlier]);
        assert!(matches!(dup, Err(DataError::DuplicateDate(_))));
        assert!(matches!(RidershipTable::new(vec![]), Err(DataError::Empty)));
    }

    #[test]
    fn test_date_windows() {
        let before = DateWindow::before(date(2020, 3, 11));
        assert!(before.contains(date(2020, 3, 10)));
        assert!(!before.contains(date(2020, 3, 11)));

        let october = DateWindow::month(2024, 10).unwrap();
        assert!(october.contains(date(2024, 10, 31)));
        assert!(!october.contains(date(2024, 11, 1)));

        let december = DateWindow::month(2023, 12).unwrap();
        assert_eq!(december.end, Some(date(2023, 12, 31)));
    }

    #[test]
    fn test_window_filter() {
        let table = daily_table(date(2020, 1, 1), date(2020, 1, 31), |_, _| 1.0, 100.0);
        let window = DateWindow::between(date(2020, 1, 10), date(2020, 1, 19));
        assert_eq!(table.window(&window).count(), 10);
        assert_eq!(table.records()[0].total(), 7.0);
    }
}
