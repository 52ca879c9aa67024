//! Daily ridership CSV ingestion
//!
//! Raw headers such as `Subways: Total Estimated Ridership` are resolved to
//! their canonical service columns once, here; nothing downstream sees the
//! published names.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::DataError;
use crate::models::{RidershipRecord, RidershipTable, Service, SERVICE_COUNT};

pub const DATE_COLUMN: &str = "Date";

const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// Column positions of every field the table needs
struct ColumnMap {
    date: usize,
    counts: [usize; SERVICE_COUNT],
    pcts: [usize; SERVICE_COUNT],
}

impl ColumnMap {
    fn resolve(headers: &StringRecord) -> Result<Self, DataError> {
        let find = |candidates: &[&str]| {
            headers
                .iter()
                .position(|h| candidates.iter().any(|c| h.trim() == *c))
        };

        let date = find(&[DATE_COLUMN])
            .ok_or_else(|| DataError::MissingColumn(DATE_COLUMN.to_string()))?;

        let mut counts = [0; SERVICE_COUNT];
        let mut pcts = [0; SERVICE_COUNT];
        for service in Service::ALL {
            let raw_count = service.raw_count_header();
            counts[service.index()] = find(&[raw_count.as_str(), service.name()])
                .ok_or_else(|| DataError::MissingColumn(raw_count.clone()))?;

            let raw_pct = service.raw_pct_header();
            let pct_column = service.pct_column();
            pcts[service.index()] = find(&[raw_pct.as_str(), pct_column.as_str()])
                .ok_or_else(|| DataError::MissingColumn(raw_pct.clone()))?;

            debug!("{} -> {} / {}", raw_count, service.name(), pct_column);
        }

        Ok(Self { date, counts, pcts })
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn parse_number(record: &StringRecord, idx: usize, row: usize, headers: &StringRecord) -> Result<f64, DataError> {
    let raw = record.get(idx).unwrap_or("").trim();
    raw.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DataError::InvalidNumber {
            row,
            column: headers.get(idx).unwrap_or_default().to_string(),
            value: raw.to_string(),
        })
}

/// Load the daily ridership file at `path`
pub fn load_csv(path: impl AsRef<Path>) -> Result<RidershipTable, DataError> {
    let path = path.as_ref();
    info!("Reading ridership CSV from {:?}", path);
    let file = std::fs::File::open(path)?;
    load_from_reader(file)
}

/// Load daily ridership from any CSV source
pub fn load_from_reader<R: Read>(source: R) -> Result<RidershipTable, DataError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(source);
    let headers = reader.headers()?.clone();
    let columns = ColumnMap::resolve(&headers)?;

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row_number = i + 1;
        let row = row?;

        let raw_date = row.get(columns.date).unwrap_or("");
        let date = parse_date(raw_date).ok_or_else(|| DataError::InvalidDate {
            row: row_number,
            value: raw_date.to_string(),
        })?;

        let mut counts = [0.0; SERVICE_COUNT];
        let mut pcts = [0.0; SERVICE_COUNT];
        for k in 0..SERVICE_COUNT {
            counts[k] = parse_number(&row, columns.counts[k], row_number, &headers)?;
            pcts[k] = parse_number(&row, columns.pcts[k], row_number, &headers)?;
        }

        records.push(RidershipRecord::new(date, counts, pcts));
    }

    let table = RidershipTable::new(records)?;
    info!(
        "Loaded {} daily records ({:?} to {:?})",
        table.len(),
        table.first_date(),
        table.last_date()
    );
    Ok(table)
}
