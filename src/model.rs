/// Core data types for the handwashing mortality analysis.
///
/// This module defines the shared domain model imported by all other modules:
/// the two record shapes read from the source tables, the derived rolling
/// average point, the domain constants, and the error type every analysis
/// step reports through.

use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Domain constants
// ---------------------------------------------------------------------------

/// Number of records in the trailing rolling-average window.
pub const DEFAULT_WINDOW_MONTHS: usize = 6;

/// Day handwashing with chlorinated lime became mandatory in the maternity
/// ward. Records on or after this date belong to the "after" partition.
pub fn handwashing_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(1847, 6, 1).expect("1847-06-01 is a valid date")
}

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// One month of births and maternal deaths.
///
/// `pct_deaths` and `washing_hands` are derived columns and stay `None` until
/// `analysis::metrics::compute_ratio` and `label_washing_hands` fill them in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRecord {
    pub date: NaiveDate,
    pub births: u32,
    pub deaths: u32,
    pub pct_deaths: Option<f64>,
    pub washing_hands: Option<bool>,
}

impl MonthlyRecord {
    pub fn new(date: NaiveDate, births: u32, deaths: u32) -> Self {
        Self {
            date,
            births,
            deaths,
            pct_deaths: None,
            washing_hands: None,
        }
    }
}

/// Yearly totals for a single clinic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyRecord {
    pub year: i32,
    pub clinic: String,
    pub births: u32,
    pub deaths: u32,
    pub pct_deaths: Option<f64>,
}

/// A single entry of the trailing moving average, keyed by the date of the
/// last record in its window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub average: f64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that abort an analysis run.
///
/// There is no partial-failure mode: the first error ends the run and no
/// derived values are produced for it.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A record lacks one of its required columns (or a derived column a
    /// later step depends on).
    #[error("missing field '{field}' in {record}")]
    MissingField { record: String, field: &'static str },

    /// A record reports zero births, so its death ratio is undefined.
    #[error("zero births in {record}; death ratio is undefined")]
    DivisionByZero { record: String },

    /// Dates go backwards between two consecutive records.
    #[error("records out of order: {next} follows {previous}")]
    UnsortedInput { previous: NaiveDate, next: NaiveDate },

    /// Two records share the same date.
    #[error("duplicate record for {0}")]
    DuplicateDate(NaiveDate),

    /// A rolling window must cover at least one record.
    #[error("rolling window must be at least 1 record, got {0}")]
    InvalidWindow(usize),

    /// The named dataset contained no rows.
    #[error("dataset '{0}' contains no records")]
    EmptyDataset(String),

    #[error("failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
