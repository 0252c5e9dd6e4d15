//! Descriptive statistics.
//!
//! `describe` reports the same eight figures as a dataframe `describe()`
//! call: count, mean, sample standard deviation, min, the three quartiles
//! and max. Quantiles interpolate linearly between the closest ranks.

use serde::Serialize;

/// Summary statistics for one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1). `NaN` for a single value.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Returns `None` for an empty column.
pub fn describe(values: &[f64]) -> Option<Describe> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mean = mean(&sorted)?;
    let std = if n > 1 {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    Some(Describe {
        count: n,
        mean,
        std,
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.50),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Linear-interpolation quantile of an already sorted, non-empty slice.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

// ---------------------------------------------------------------------------
// Before / after comparison
// ---------------------------------------------------------------------------

/// Mean monthly death ratio on each side of the handwashing cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub before_mean: f64,
    pub after_mean: f64,
    /// `after_mean - before_mean`; negative when deaths fell.
    pub difference: f64,
    /// `before_mean / after_mean`; `None` when no deaths were recorded after.
    pub reduction_factor: Option<f64>,
}

/// Compares two sets of ratios. `None` if either side is empty.
pub fn compare_periods(before: &[f64], after: &[f64]) -> Option<PeriodComparison> {
    let before_mean = mean(before)?;
    let after_mean = mean(after)?;
    Some(PeriodComparison {
        before_mean,
        after_mean,
        difference: after_mean - before_mean,
        reduction_factor: (after_mean > 0.0).then(|| before_mean / after_mean),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_matches_dataframe_quartiles() {
        let d = describe(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(d.count, 4);
        assert_eq!(d.mean, 2.5);
        assert_eq!(d.min, 1.0);
        assert_eq!(d.max, 4.0);
        assert_eq!(d.q25, 1.75);
        assert_eq!(d.median, 2.5);
        assert_eq!(d.q75, 3.25);
        // sample std of 1..=4 is sqrt(5/3)
        assert!((d.std - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_describe_single_value() {
        let d = describe(&[0.1]).unwrap();
        assert_eq!(d.count, 1);
        assert_eq!(d.median, 0.1);
        assert!(d.std.is_nan());
    }

    #[test]
    fn test_describe_empty_column() {
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn test_compare_periods() {
        let cmp = compare_periods(&[0.10, 0.12, 0.08], &[0.02, 0.02]).unwrap();
        assert!((cmp.before_mean - 0.10).abs() < 1e-12);
        assert!((cmp.after_mean - 0.02).abs() < 1e-12);
        assert!((cmp.difference + 0.08).abs() < 1e-12);
        assert!((cmp.reduction_factor.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_compare_periods_no_deaths_after() {
        let cmp = compare_periods(&[0.1], &[0.0, 0.0]).unwrap();
        assert_eq!(cmp.reduction_factor, None);
    }

    #[test]
    fn test_compare_periods_requires_both_sides() {
        assert!(compare_periods(&[], &[0.1]).is_none());
        assert!(compare_periods(&[0.1], &[]).is_none());
    }
}
