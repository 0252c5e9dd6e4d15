/// Data ingestion for the analysis.
///
/// Submodules:
/// - `tables` — parses the yearly per-clinic and monthly CSV tables into
///   domain records, rejecting rows with missing or malformed cells.

pub mod tables;

pub use tables::{load_monthly, load_yearly};
