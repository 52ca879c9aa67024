use thiserror::Error;

/// Errors raised while loading the daily ridership file.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid date '{value}' on row {row}")]
    InvalidDate { row: usize, value: String },

    #[error("Invalid number '{value}' in column '{column}' on row {row}")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Duplicate date: {0}")]
    DuplicateDate(chrono::NaiveDate),

    #[error("No ridership rows found")]
    Empty,
}

/// Errors raised by the metric engine when its input cannot support a figure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("No rows in window: {0}")]
    EmptyWindow(&'static str),

    #[error("Aggregated table has no periods")]
    NoPeriods,

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Unknown granularity: {0}")]
    UnknownGranularity(String),
}
