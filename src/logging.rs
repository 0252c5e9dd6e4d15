/// Structured logging for analysis runs
///
/// Installs a `tracing` subscriber that writes either to stderr or, for
/// unattended runs, to an append-mode log file. `RUST_LOG` overrides the
/// configured level. Stage helpers below emit one structured event per
/// pipeline stage with the dataset name attached.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Yearly,
    Monthly,
    Report,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Yearly => write!(f, "yearly"),
            Dataset::Monthly => write!(f, "monthly"),
            Dataset::Report => write!(f, "report"),
        }
    }
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

/// Install the global subscriber.
///
/// Safe to call more than once; only the first call takes effect. Fails only
/// when the log file cannot be opened.
pub fn init_logger(min_level: LogLevel, log_file: Option<&Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(min_level.as_filter()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    if installed.is_err() {
        // a subscriber is already in place (tests, embedding callers)
        tracing::debug!("logger already initialized");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Stage Logging
// ---------------------------------------------------------------------------

/// Log the outcome of loading one table.
pub fn log_load(dataset: Dataset, path: &Path, rows: usize) {
    info!(dataset = %dataset, path = %path.display(), rows, "loaded table");
}

/// Log a failed stage with the error chain flattened into one line.
pub fn log_failure(dataset: Dataset, operation: &str, err: &dyn std::error::Error) {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    error!(dataset = %dataset, operation, "{}", message);
}

/// Log a summary of chart rendering.
pub fn log_render_summary(total: usize, rendered: usize) {
    let failed = total.saturating_sub(rendered);
    if failed == 0 {
        info!(dataset = %Dataset::Report, total, "rendered all charts");
    } else if rendered == 0 {
        error!(dataset = %Dataset::Report, total, "no charts rendered");
    } else {
        warn!(dataset = %Dataset::Report, total, rendered, failed, "some charts failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_init_logger_is_idempotent() {
        init_logger(LogLevel::Info, None).unwrap();
        init_logger(LogLevel::Debug, None).unwrap();
    }
}
