/// Delimited-text loaders for the two source tables.
///
/// Yearly table columns: `year, births, deaths, clinic`.
/// Monthly table columns: `date, births, deaths`.
///
/// Columns are matched by header name, so their order in the file does not
/// matter and extra columns are ignored. Blank cells and absent columns are
/// reported as `MissingField`; cells that are present but do not parse (a
/// non-numeric birth count, a malformed date) surface as `Csv` errors. The
/// monthly table must be strictly chronological.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::debug;

use crate::analysis::metrics::ensure_chronological;
use crate::model::{AnalysisError, AnalysisResult, MonthlyRecord, YearlyRecord};

// ============================================================================
// Raw rows
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawYearlyRow {
    year: Option<i32>,
    births: Option<u32>,
    deaths: Option<u32>,
    clinic: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMonthlyRow {
    date: Option<NaiveDate>,
    births: Option<u32>,
    deaths: Option<u32>,
}

fn required<T>(value: Option<T>, record: &str, field: &'static str) -> AnalysisResult<T> {
    value.ok_or_else(|| AnalysisError::MissingField {
        record: record.to_string(),
        field,
    })
}

// ============================================================================
// Yearly table
// ============================================================================

/// Load the yearly per-clinic table from a file.
pub fn load_yearly(path: &Path) -> AnalysisResult<Vec<YearlyRecord>> {
    let file = open(path)?;
    read_yearly(file, path)
}

/// Parse the yearly table from any reader. `source` names it in errors.
pub fn read_yearly<R: Read>(reader: R, source: &Path) -> AnalysisResult<Vec<YearlyRecord>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for (i, row) in rdr.deserialize::<RawYearlyRow>().enumerate() {
        let row = row.map_err(|source_err| csv_error(source, source_err))?;
        let label = row_label(source, i);

        let clinic = required(row.clinic, &label, "clinic")?;
        if clinic.is_empty() {
            return Err(AnalysisError::MissingField {
                record: label,
                field: "clinic",
            });
        }

        records.push(YearlyRecord {
            year: required(row.year, &label, "year")?,
            births: required(row.births, &label, "births")?,
            deaths: required(row.deaths, &label, "deaths")?,
            clinic,
            pct_deaths: None,
        });
    }

    if records.is_empty() {
        return Err(AnalysisError::EmptyDataset(source.display().to_string()));
    }
    debug!(source = %source.display(), rows = records.len(), "parsed yearly table");
    Ok(records)
}

// ============================================================================
// Monthly table
// ============================================================================

/// Load the monthly births/deaths table from a file.
pub fn load_monthly(path: &Path) -> AnalysisResult<Vec<MonthlyRecord>> {
    let file = open(path)?;
    read_monthly(file, path)
}

/// Parse the monthly table from any reader. `source` names it in errors.
pub fn read_monthly<R: Read>(reader: R, source: &Path) -> AnalysisResult<Vec<MonthlyRecord>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for (i, row) in rdr.deserialize::<RawMonthlyRow>().enumerate() {
        let row = row.map_err(|source_err| csv_error(source, source_err))?;
        let label = row_label(source, i);

        records.push(MonthlyRecord::new(
            required(row.date, &label, "date")?,
            required(row.births, &label, "births")?,
            required(row.deaths, &label, "deaths")?,
        ));
    }

    if records.is_empty() {
        return Err(AnalysisError::EmptyDataset(source.display().to_string()));
    }
    ensure_chronological(&records)?;
    debug!(source = %source.display(), rows = records.len(), "parsed monthly table");
    Ok(records)
}

// ============================================================================
// Helpers
// ============================================================================

fn open(path: &Path) -> AnalysisResult<File> {
    File::open(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_error(path: &Path, source: csv::Error) -> AnalysisError {
    AnalysisError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Data rows start on line 2, after the header.
fn row_label(source: &Path, index: usize) -> String {
    format!("{} line {}", source.display(), index + 2)
}

// ============================================================================
// Tests
// ============================================================================
