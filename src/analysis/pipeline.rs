//! One analysis run: load both tables, derive every metric, collect the
//! results for the report writers.

use tracing::{info, info_span};

use crate::analysis::clinics::{ClinicSummary, clinic_summaries, compute_yearly_ratio};
use crate::analysis::metrics::{MetricComputer, MonthlyMetrics};
use crate::analysis::summary::{Describe, PeriodComparison, compare_periods, describe};
use crate::config::AnalysisConfig;
use crate::ingest::{load_monthly, load_yearly};
use crate::logging::{Dataset, log_load};
use crate::model::{AnalysisResult, MonthlyRecord, YearlyRecord};

/// Descriptive statistics for the three numeric columns of a table.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TableStats {
    pub births: Option<Describe>,
    pub deaths: Option<Describe>,
    pub pct_deaths: Option<Describe>,
}

/// Everything derived from one pair of input tables.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub yearly: Vec<YearlyRecord>,
    pub clinics: Vec<ClinicSummary>,
    pub yearly_stats: TableStats,
    pub monthly: MonthlyMetrics,
    pub monthly_stats: TableStats,
    /// `None` when either side of the cutoff has no records.
    pub comparison: Option<PeriodComparison>,
    pub computer: MetricComputer,
}

/// Load the tables named in `config` and analyse them.
pub fn run(config: &AnalysisConfig) -> AnalysisResult<AnalysisOutcome> {
    let _span = info_span!("analysis").entered();

    let yearly = load_yearly(&config.data.yearly_path)?;
    log_load(Dataset::Yearly, &config.data.yearly_path, yearly.len());

    let monthly = load_monthly(&config.data.monthly_path)?;
    log_load(Dataset::Monthly, &config.data.monthly_path, monthly.len());

    analyse(yearly, monthly, config.metrics.computer())
}

/// Analyse already-loaded tables.
pub fn analyse(
    mut yearly: Vec<YearlyRecord>,
    monthly: Vec<MonthlyRecord>,
    computer: MetricComputer,
) -> AnalysisResult<AnalysisOutcome> {
    compute_yearly_ratio(&mut yearly)?;
    let clinics = clinic_summaries(&yearly)?;
    let yearly_stats = TableStats {
        births: describe(&column(&yearly, |r| f64::from(r.births))),
        deaths: describe(&column(&yearly, |r| f64::from(r.deaths))),
        pct_deaths: describe(&yearly.iter().filter_map(|r| r.pct_deaths).collect::<Vec<_>>()),
    };

    let monthly = computer.compute(monthly)?;
    let monthly_stats = TableStats {
        births: describe(&column(&monthly.records, |r| f64::from(r.births))),
        deaths: describe(&column(&monthly.records, |r| f64::from(r.deaths))),
        pct_deaths: describe(&ratios(&monthly.records)),
    };
    let comparison = compare_periods(&ratios(&monthly.before), &ratios(&monthly.after));

    info!(
        clinics = clinics.len(),
        months = monthly.records.len(),
        before = monthly.before.len(),
        after = monthly.after.len(),
        rolling = monthly.rolling.len(),
        "analysis complete"
    );

    Ok(AnalysisOutcome {
        yearly,
        clinics,
        yearly_stats,
        monthly,
        monthly_stats,
        comparison,
        computer,
    })
}

/// `pct_deaths` of every record that has one.
pub fn ratios(records: &[MonthlyRecord]) -> Vec<f64> {
    records.iter().filter_map(|r| r.pct_deaths).collect()
}

fn column<T>(rows: &[T], f: impl Fn(&T) -> f64) -> Vec<f64> {
    rows.iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn month(y: i32, m: u32, births: u32, deaths: u32) -> MonthlyRecord {
        MonthlyRecord::new(NaiveDate::from_ymd_opt(y, m, 1).unwrap(), births, deaths)
    }

    fn yearly_rows() -> Vec<YearlyRecord> {
        [(1846, "clinic 1", 4010, 459), (1846, "clinic 2", 3754, 105)]
            .into_iter()
            .map(|(year, clinic, births, deaths)| YearlyRecord {
                year,
                clinic: clinic.to_string(),
                births,
                deaths,
                pct_deaths: None,
            })
            .collect()
    }

    #[test]
    fn test_analyse_fills_every_artifact() {
        let monthly = vec![
            month(1847, 3, 100, 10),
            month(1847, 4, 100, 20),
            month(1847, 5, 100, 30),
            month(1847, 6, 100, 2),
            month(1847, 7, 100, 4),
        ];
        let computer = MetricComputer::new(2, NaiveDate::from_ymd_opt(1847, 6, 1).unwrap());
        let outcome = analyse(yearly_rows(), monthly, computer).unwrap();

        assert_eq!(outcome.clinics.len(), 2);
        assert!(outcome.yearly.iter().all(|r| r.pct_deaths.is_some()));
        assert_eq!(outcome.monthly.rolling.len(), 4);
        assert_eq!(outcome.monthly_stats.births.unwrap().count, 5);

        let cmp = outcome.comparison.unwrap();
        assert!((cmp.before_mean - 0.20).abs() < 1e-9);
        assert!((cmp.after_mean - 0.03).abs() < 1e-9);
    }

    #[test]
    fn test_analyse_without_after_period_has_no_comparison() {
        let monthly = vec![month(1846, 1, 100, 10), month(1846, 2, 100, 12)];
        let outcome = analyse(yearly_rows(), monthly, MetricComputer::default()).unwrap();
        assert!(outcome.comparison.is_none());
        assert!(outcome.monthly.rolling.is_empty());
    }

    #[test]
    fn test_analyse_propagates_zero_births() {
        let monthly = vec![month(1846, 1, 0, 0)];
        assert!(analyse(yearly_rows(), monthly, MetricComputer::default()).is_err());
    }
}
