//! Derived metrics over the monthly births/deaths series.
//!
//! Every function here is a pure transformation over an in-memory, ordered
//! slice of `MonthlyRecord`s. `MetricComputer` strings them together in the
//! order a report needs them; it keeps no state between calls.

use chrono::NaiveDate;
use tracing::debug;

use crate::model::{AnalysisError, AnalysisResult, MonthlyRecord, RollingPoint};

// ---------------------------------------------------------------------------
// Ratio
// ---------------------------------------------------------------------------

/// Sets `pct_deaths = deaths / births` on every record.
///
/// All-or-nothing: a record with zero births aborts the call with
/// `DivisionByZero` before any record is modified. The ratio is always
/// recomputed from `births` and `deaths`, so calling this twice yields the
/// same values.
pub fn compute_ratio(records: &mut [MonthlyRecord]) -> AnalysisResult<()> {
    if let Some(bad) = records.iter().find(|r| r.births == 0) {
        return Err(AnalysisError::DivisionByZero {
            record: bad.date.to_string(),
        });
    }

    for record in records.iter_mut() {
        record.pct_deaths = Some(f64::from(record.deaths) / f64::from(record.births));
    }
    Ok(())
}

/// Marks each record with whether handwashing was in force on its date.
pub fn label_washing_hands(records: &mut [MonthlyRecord], cutoff: NaiveDate) {
    for record in records.iter_mut() {
        record.washing_hands = Some(record.date >= cutoff);
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Checks that dates increase strictly from one record to the next.
pub fn ensure_chronological(records: &[MonthlyRecord]) -> AnalysisResult<()> {
    for pair in records.windows(2) {
        let (previous, next) = (pair[0].date, pair[1].date);
        if next == previous {
            return Err(AnalysisError::DuplicateDate(next));
        }
        if next < previous {
            return Err(AnalysisError::UnsortedInput { previous, next });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Rolling average
// ---------------------------------------------------------------------------

/// Trailing moving average of `pct_deaths` over `window` records.
///
/// The window counts records, not calendar months: with one record per
/// month the result is a `window`-month average, with gaps it is a
/// `window`-record average. Entry `i` of the output is keyed by the date of
/// record `i + window - 1` and averages records `i..i + window`. Positions
/// with fewer than `window` records behind them produce no entry, so the
/// output has `records.len() - window + 1` entries, or none at all when the
/// series is shorter than the window.
pub fn rolling_average(
    records: &[MonthlyRecord],
    window: usize,
) -> AnalysisResult<Vec<RollingPoint>> {
    if window == 0 {
        return Err(AnalysisError::InvalidWindow(window));
    }
    ensure_chronological(records)?;

    let ratios = records
        .iter()
        .map(|r| {
            r.pct_deaths.ok_or_else(|| AnalysisError::MissingField {
                record: r.date.to_string(),
                field: "pct_deaths",
            })
        })
        .collect::<AnalysisResult<Vec<f64>>>()?;

    if ratios.len() < window {
        debug!(records = ratios.len(), window, "series shorter than rolling window");
        return Ok(Vec::new());
    }

    let points = ratios
        .windows(window)
        .zip(&records[window - 1..])
        .map(|(values, last)| RollingPoint {
            date: last.date,
            average: values.iter().sum::<f64>() / window as f64,
        })
        .collect();
    Ok(points)
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// Splits the series around `cutoff`.
///
/// `before` holds records dated strictly earlier than the cutoff, `after`
/// holds the rest (a record dated exactly on the cutoff is in `after`). Both
/// halves keep the input order and every record lands in exactly one.
pub fn partition_by_date(
    records: &[MonthlyRecord],
    cutoff: NaiveDate,
) -> (Vec<MonthlyRecord>, Vec<MonthlyRecord>) {
    records.iter().cloned().partition(|r| r.date < cutoff)
}

// ---------------------------------------------------------------------------
// MetricComputer
// ---------------------------------------------------------------------------

/// All derived artifacts for one monthly series.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyMetrics {
    /// The input series with `pct_deaths` and `washing_hands` filled in.
    pub records: Vec<MonthlyRecord>,
    pub rolling: Vec<RollingPoint>,
    pub before: Vec<MonthlyRecord>,
    pub after: Vec<MonthlyRecord>,
}

/// Parameters for a monthly metrics run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricComputer {
    pub window_months: usize,
    pub cutoff: NaiveDate,
}

impl Default for MetricComputer {
    fn default() -> Self {
        Self {
            window_months: crate::model::DEFAULT_WINDOW_MONTHS,
            cutoff: crate::model::handwashing_start(),
        }
    }
}

impl MetricComputer {
    pub fn new(window_months: usize, cutoff: NaiveDate) -> Self {
        Self {
            window_months,
            cutoff,
        }
    }

    /// Ratio, label, rolling average, partition, in that order.
    pub fn compute(&self, mut records: Vec<MonthlyRecord>) -> AnalysisResult<MonthlyMetrics> {
        ensure_chronological(&records)?;
        compute_ratio(&mut records)?;
        label_washing_hands(&mut records, self.cutoff);

        let rolling = rolling_average(&records, self.window_months)?;
        let (before, after) = partition_by_date(&records, self.cutoff);

        debug!(
            records = records.len(),
            rolling = rolling.len(),
            before = before.len(),
            after = after.len(),
            cutoff = %self.cutoff,
            "computed monthly metrics"
        );

        Ok(MonthlyMetrics {
            records,
            rolling,
            before,
            after,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Jan–Jun 1847 with 100 births a month and alternating 10/20 deaths.
    fn first_half_1847() -> Vec<MonthlyRecord> {
        [10, 20, 10, 20, 10, 20]
            .iter()
            .enumerate()
            .map(|(i, &deaths)| MonthlyRecord::new(ymd(1847, i as u32 + 1, 1), 100, deaths))
            .collect()
    }

    fn with_ratios(mut records: Vec<MonthlyRecord>) -> Vec<MonthlyRecord> {
        compute_ratio(&mut records).expect("fixture has non-zero births");
        records
    }

    // --- compute_ratio ------------------------------------------------------

    #[test]
    fn test_ratio_is_deaths_over_births() {
        let records = with_ratios(first_half_1847());
        let ratios: Vec<f64> = records.iter().map(|r| r.pct_deaths.unwrap()).collect();
        let expected = [0.10, 0.20, 0.10, 0.20, 0.10, 0.20];
        for (got, want) in ratios.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "expected {want}, got {got}");
        }
    }

    #[test]
    fn test_ratio_is_idempotent() {
        let once = with_ratios(first_half_1847());
        let twice = with_ratios(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_zero_births_aborts_without_touching_any_record() {
        let mut records = first_half_1847();
        records[3].births = 0;
        let err = compute_ratio(&mut records).unwrap_err();
        assert!(matches!(err, AnalysisError::DivisionByZero { ref record } if record == "1847-04-01"));
        assert!(records.iter().all(|r| r.pct_deaths.is_none()));
    }

    #[test]
    fn test_ratio_on_empty_series_is_ok() {
        let mut records: Vec<MonthlyRecord> = Vec::new();
        assert!(compute_ratio(&mut records).is_ok());
    }

    // --- label_washing_hands ------------------------------------------------

    #[test]
    fn test_label_marks_cutoff_month_as_washing() {
        let mut records = first_half_1847();
        label_washing_hands(&mut records, ymd(1847, 6, 1));
        let labels: Vec<bool> = records.iter().map(|r| r.washing_hands.unwrap()).collect();
        assert_eq!(labels, [false, false, false, false, false, true]);
    }

    // --- rolling_average ----------------------------------------------------

    #[test]
    fn test_rolling_first_entry_is_mean_of_first_window() {
        let rolling = rolling_average(&with_ratios(first_half_1847()), 6).unwrap();
        assert_eq!(rolling.len(), 1);
        assert_eq!(rolling[0].date, ymd(1847, 6, 1));
        assert!((rolling[0].average - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_length_is_left_truncated() {
        let records = with_ratios(first_half_1847());
        for window in 1..=8 {
            let rolling = rolling_average(&records, window).unwrap();
            assert_eq!(
                rolling.len(),
                (records.len() + 1).saturating_sub(window),
                "window {window}"
            );
        }
    }

    #[test]
    fn test_rolling_window_of_one_reproduces_ratios() {
        let records = with_ratios(first_half_1847());
        let rolling = rolling_average(&records, 1).unwrap();
        for (point, record) in rolling.iter().zip(&records) {
            assert_eq!(point.date, record.date);
            assert_eq!(Some(point.average), record.pct_deaths);
        }
    }

    #[test]
    fn test_rolling_trailing_window_slides_by_one_record() {
        let records = with_ratios(first_half_1847());
        let rolling = rolling_average(&records, 2).unwrap();
        assert_eq!(rolling.len(), 5);
        assert_eq!(rolling[0].date, ymd(1847, 2, 1));
        assert_eq!(rolling[4].date, ymd(1847, 6, 1));
        for point in &rolling {
            assert!((point.average - 0.15).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rolling_counts_records_not_calendar_months() {
        // Skip March; a 2-record window now spans Feb and April.
        let mut records = with_ratios(first_half_1847());
        records.remove(2);
        let rolling = rolling_average(&records, 2).unwrap();
        assert_eq!(rolling[1].date, ymd(1847, 4, 1));
        assert!((rolling[1].average - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_rejects_zero_window() {
        let err = rolling_average(&with_ratios(first_half_1847()), 0).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidWindow(0)));
    }

    #[test]
    fn test_rolling_requires_ratios() {
        let err = rolling_average(&first_half_1847(), 3).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingField { field: "pct_deaths", .. }));
    }

    #[test]
    fn test_rolling_rejects_unsorted_input() {
        let mut records = with_ratios(first_half_1847());
        records.swap(1, 2);
        let err = rolling_average(&records, 3).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsortedInput { .. }));
    }

    #[test]
    fn test_rolling_rejects_duplicate_dates() {
        let mut records = with_ratios(first_half_1847());
        records[2].date = records[1].date;
        let err = rolling_average(&records, 3).unwrap_err();
        assert!(matches!(err, AnalysisError::DuplicateDate(d) if d == ymd(1847, 2, 1)));
    }

    // --- partition_by_date --------------------------------------------------

    #[test]
    fn test_partition_record_on_cutoff_lands_after() {
        let records = first_half_1847();
        let (before, after) = partition_by_date(&records, ymd(1847, 6, 1));
        assert_eq!(before.len(), 5);
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].date, ymd(1847, 6, 1));
    }

    #[test]
    fn test_partition_is_total_and_order_preserving() {
        let records = first_half_1847();
        for month in 1..=7 {
            let cutoff = ymd(1847, month, 15);
            let (before, after) = partition_by_date(&records, cutoff);

            assert!(before.iter().all(|r| r.date < cutoff));
            assert!(after.iter().all(|r| r.date >= cutoff));

            let rejoined: Vec<_> = before.into_iter().chain(after).collect();
            assert_eq!(rejoined, records, "cutoff {cutoff}");
        }
    }

    #[test]
    fn test_partition_of_empty_series() {
        let (before, after) = partition_by_date(&[], ymd(1847, 6, 1));
        assert!(before.is_empty());
        assert!(after.is_empty());
    }

    // --- MetricComputer -----------------------------------------------------

    #[test]
    fn test_computer_runs_all_steps() {
        let metrics = MetricComputer::new(6, ymd(1847, 6, 1))
            .compute(first_half_1847())
            .unwrap();

        assert!(metrics.records.iter().all(|r| r.pct_deaths.is_some()));
        assert!(metrics.records.iter().all(|r| r.washing_hands.is_some()));
        assert_eq!(metrics.rolling.len(), 1);
        assert_eq!(metrics.before.len(), 5);
        assert_eq!(metrics.after.len(), 1);
        assert_eq!(metrics.after[0].washing_hands, Some(true));
    }

    #[test]
    fn test_computer_defaults() {
        let computer = MetricComputer::default();
        assert_eq!(computer.window_months, 6);
        assert_eq!(computer.cutoff, ymd(1847, 6, 1));
    }

    #[test]
    fn test_computer_rejects_unsorted_before_computing() {
        let mut records = first_half_1847();
        records.reverse();
        let err = MetricComputer::default().compute(records).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsortedInput { .. }));
    }
}
