//! Presentation layer: everything that turns an `AnalysisOutcome` into
//! something a person reads.
//!
//! All formatting choices arrive through `PresentationConfig`; nothing in
//! here reads global state.

pub mod charts;
pub mod export;
pub mod summary;

use plotters::prelude::{BitMapBackend, DrawingAreaErrorKind, DrawingBackend};
use thiserror::Error;

type PlottersError = DrawingAreaErrorKind<<BitMapBackend<'static> as DrawingBackend>::ErrorType>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("Plotting error: {source}")]
    Plotters {
        #[from]
        source: PlottersError,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

pub use charts::render_all;
pub use export::write_json;
pub use summary::render_text;
