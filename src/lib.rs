//! Maternal mortality analysis around the 1847 introduction of handwashing
//! at the Vienna General Hospital maternity clinics.
//!
//! The library loads the yearly per-clinic and monthly tables, derives the
//! monthly death ratio, its rolling average and the before/after split, and
//! hands the results to the text, JSON and chart writers in `report`.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod report;
