//! Gaussian kernel density estimate for the monthly ratio distributions.
//!
//! Bandwidth follows Scott's rule, `h = σ · n^(-1/5)`, with σ the sample
//! standard deviation.

use crate::analysis::summary::describe;

/// Evaluates the density of `samples` at each of `points`.
///
/// Returns `None` when the bandwidth is undefined: fewer than two samples
/// or zero spread.
pub fn gaussian_kde(samples: &[f64], points: &[f64]) -> Option<Vec<(f64, f64)>> {
    let bandwidth = scott_bandwidth(samples)?;
    let n = samples.len() as f64;
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    let curve = points
        .iter()
        .map(|&x| {
            let sum: f64 = samples
                .iter()
                .map(|&s| {
                    let z = (x - s) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum();
            (x, sum * norm)
        })
        .collect();
    Some(curve)
}

pub fn scott_bandwidth(samples: &[f64]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let std = describe(samples)?.std;
    if !std.is_finite() || std <= 0.0 {
        return None;
    }
    Some(std * (samples.len() as f64).powf(-0.2))
}

/// `count` evenly spaced points covering `[lo, hi]`.
pub fn linspace(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (count - 1) as f64;
            (0..count).map(|i| lo + step * i as f64).collect()
        }
    }
}
