/// Computation over the loaded tables.
///
/// Submodules:
/// - `metrics` — monthly death ratio, rolling average, before/after split.
/// - `clinics` — yearly per-clinic ratios and totals.
/// - `summary` — descriptive statistics and the before/after comparison.
/// - `density` — kernel density estimate backing the distribution chart.
/// - `pipeline` — loads both tables and runs every step above.

pub mod clinics;
pub mod density;
pub mod metrics;
pub mod pipeline;
pub mod summary;

pub use metrics::{MetricComputer, MonthlyMetrics};
pub use pipeline::{AnalysisOutcome, run};
