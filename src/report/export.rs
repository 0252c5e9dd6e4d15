//! Machine-readable summary of a run.
//!
//! Written next to the charts as `analysis_summary.json` so downstream
//! notebooks can pick up the derived series without re-running the
//! analysis.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use crate::analysis::AnalysisOutcome;
use crate::analysis::clinics::ClinicSummary;
use crate::analysis::pipeline::TableStats;
use crate::analysis::summary::PeriodComparison;
use crate::model::{MonthlyRecord, RollingPoint};

use super::ReportResult;

pub const SUMMARY_FILE: &str = "analysis_summary.json";

#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub generated_at: String,
    pub parameters: ReportParameters,
    pub clinics: &'a [ClinicSummary],
    pub yearly_stats: &'a TableStats,
    pub monthly_stats: &'a TableStats,
    pub comparison: Option<PeriodComparison>,
    pub monthly: &'a [MonthlyRecord],
    pub rolling_average: &'a [RollingPoint],
    pub before_count: usize,
    pub after_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportParameters {
    pub window_months: usize,
    pub handwashing_start: NaiveDate,
}

impl<'a> AnalysisReport<'a> {
    pub fn from_outcome(outcome: &'a AnalysisOutcome) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            parameters: ReportParameters {
                window_months: outcome.computer.window_months,
                handwashing_start: outcome.computer.cutoff,
            },
            clinics: &outcome.clinics,
            yearly_stats: &outcome.yearly_stats,
            monthly_stats: &outcome.monthly_stats,
            comparison: outcome.comparison,
            monthly: &outcome.monthly.records,
            rolling_average: &outcome.monthly.rolling,
            before_count: outcome.monthly.before.len(),
            after_count: outcome.monthly.after.len(),
        }
    }
}

pub fn to_json(outcome: &AnalysisOutcome) -> ReportResult<String> {
    Ok(serde_json::to_string_pretty(&AnalysisReport::from_outcome(outcome))?)
}

/// Write the summary into `dir`, creating it if needed.
pub fn write_json(outcome: &AnalysisOutcome, dir: &Path) -> ReportResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(SUMMARY_FILE);
    std::fs::write(&path, to_json(outcome)?)?;
    info!(path = %path.display(), "wrote analysis summary");
    Ok(path)
}
