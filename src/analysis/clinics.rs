//! Yearly per-clinic death statistics.
//!
//! The yearly table reports births and deaths for each clinic of the
//! maternity ward. These helpers compute each row's ratio and organize the
//! flat table into per-clinic series and totals.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{AnalysisError, AnalysisResult, YearlyRecord};

/// Sets `pct_deaths = deaths / births` on every yearly row.
///
/// Same policy as the monthly ratio: any row with zero births aborts the
/// call before any row is modified.
pub fn compute_yearly_ratio(records: &mut [YearlyRecord]) -> AnalysisResult<()> {
    if let Some(bad) = records.iter().find(|r| r.births == 0) {
        return Err(AnalysisError::DivisionByZero {
            record: format!("{} {}", bad.clinic, bad.year),
        });
    }

    for record in records.iter_mut() {
        record.pct_deaths = Some(f64::from(record.deaths) / f64::from(record.births));
    }
    Ok(())
}

/// Groups rows by clinic name, each group sorted by year.
pub fn group_by_clinic(records: &[YearlyRecord]) -> BTreeMap<String, Vec<YearlyRecord>> {
    let mut groups: BTreeMap<String, Vec<YearlyRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.clinic.clone())
            .or_default()
            .push(record.clone());
    }
    for rows in groups.values_mut() {
        rows.sort_by_key(|r| r.year);
    }
    groups
}

/// Totals for one clinic over every year it reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClinicSummary {
    pub clinic: String,
    pub first_year: i32,
    pub last_year: i32,
    pub total_births: u64,
    pub total_deaths: u64,
    /// Total deaths over total births.
    pub pooled_pct_deaths: f64,
    /// Unweighted mean of the yearly ratios.
    pub mean_yearly_pct_deaths: f64,
}

/// One summary per clinic, in clinic-name order.
///
/// Rows without a computed ratio are rejected with `MissingField`.
pub fn clinic_summaries(records: &[YearlyRecord]) -> AnalysisResult<Vec<ClinicSummary>> {
    group_by_clinic(records)
        .into_iter()
        .filter_map(|(clinic, rows)| {
            let (first, last) = (rows.first()?.year, rows.last()?.year);
            Some(summarize(clinic, first, last, &rows))
        })
        .collect()
}

fn summarize(
    clinic: String,
    first_year: i32,
    last_year: i32,
    rows: &[YearlyRecord],
) -> AnalysisResult<ClinicSummary> {
    let total_births: u64 = rows.iter().map(|r| u64::from(r.births)).sum();
    let total_deaths: u64 = rows.iter().map(|r| u64::from(r.deaths)).sum();

    let mut ratio_sum = 0.0;
    for row in rows {
        ratio_sum += row.pct_deaths.ok_or_else(|| AnalysisError::MissingField {
            record: format!("{} {}", row.clinic, row.year),
            field: "pct_deaths",
        })?;
    }

    Ok(ClinicSummary {
        clinic,
        first_year,
        last_year,
        total_births,
        total_deaths,
        // total_births > 0 because every row passed compute_yearly_ratio
        pooled_pct_deaths: total_deaths as f64 / total_births as f64,
        mean_yearly_pct_deaths: ratio_sum / rows.len() as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32, clinic: &str, births: u32, deaths: u32) -> YearlyRecord {
        YearlyRecord {
            year,
            clinic: clinic.to_string(),
            births,
            deaths,
            pct_deaths: None,
        }
    }

    fn sample() -> Vec<YearlyRecord> {
        let mut rows = vec![
            row(1842, "clinic 1", 3287, 518),
            row(1841, "clinic 1", 3036, 237),
            row(1841, "clinic 2", 2442, 86),
            row(1842, "clinic 2", 2659, 202),
        ];
        compute_yearly_ratio(&mut rows).expect("sample has births in every row");
        rows
    }

    #[test]
    fn test_yearly_ratio() {
        let rows = sample();
        let ratio = rows[1].pct_deaths.unwrap();
        assert!((ratio - 237.0 / 3036.0).abs() < 1e-12);
    }

    #[test]
    fn test_yearly_zero_births_names_clinic_and_year() {
        let mut rows = vec![row(1841, "clinic 1", 3036, 237), row(1843, "clinic 2", 0, 0)];
        let err = compute_yearly_ratio(&mut rows).unwrap_err();
        assert_eq!(err.to_string(), "zero births in clinic 2 1843; death ratio is undefined");
        assert!(rows[0].pct_deaths.is_none());
    }

    #[test]
    fn test_group_by_clinic_sorts_each_group_by_year() {
        let groups = group_by_clinic(&sample());
        assert_eq!(groups.len(), 2);
        let years: Vec<i32> = groups["clinic 1"].iter().map(|r| r.year).collect();
        assert_eq!(years, [1841, 1842]);
    }

    #[test]
    fn test_clinic_summaries() {
        let summaries = clinic_summaries(&sample()).unwrap();
        assert_eq!(summaries.len(), 2);

        let first = &summaries[0];
        assert_eq!(first.clinic, "clinic 1");
        assert_eq!((first.first_year, first.last_year), (1841, 1842));
        assert_eq!(first.total_births, 6323);
        assert_eq!(first.total_deaths, 755);
        assert!((first.pooled_pct_deaths - 755.0 / 6323.0).abs() < 1e-12);

        let expected_mean = (237.0 / 3036.0 + 518.0 / 3287.0) / 2.0;
        assert!((first.mean_yearly_pct_deaths - expected_mean).abs() < 1e-12);
    }

    #[test]
    fn test_clinic_summaries_require_ratios() {
        let rows = vec![row(1841, "clinic 1", 3036, 237)];
        let err = clinic_summaries(&rows).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingField { field: "pct_deaths", .. }));
    }

    #[test]
    fn test_clinic_summaries_of_empty_table() {
        assert!(clinic_summaries(&[]).unwrap().is_empty());
    }
}
