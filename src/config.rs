//! Analysis configuration.
//!
//! Settings come from a TOML file with three optional sections. Every field
//! has a default, so an empty file (or no file at all) runs the standard
//! analysis against `data/` and writes charts to `charts/`:
//!
//! ```toml
//! [data]
//! yearly_path = "data/annual_deaths_by_clinic.csv"
//! monthly_path = "data/monthly_deaths.csv"
//!
//! [metrics]
//! window_months = 6
//! handwashing_start = "1847-06-01"
//!
//! [report]
//! output_dir = "charts"
//! float_precision = 2
//! chart_width = 1200
//! chart_height = 600
//! render_charts = true
//!
//! [logging]
//! level = "info"
//! file = "analysis.log"
//! ```
//!
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::MetricComputer;
use crate::logging::LogLevel;
use crate::model::{DEFAULT_WINDOW_MONTHS, handwashing_start};

/// File read when no path is given and it exists in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "handwashing.toml";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub data: DataConfig,
    pub metrics: MetricsConfig,
    pub report: PresentationConfig,
    pub logging: LoggingConfig,
}

/// Locations of the two source tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub yearly_path: PathBuf,
    pub monthly_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            yearly_path: PathBuf::from("data/annual_deaths_by_clinic.csv"),
            monthly_path: PathBuf::from("data/monthly_deaths.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Rolling average window, in records.
    pub window_months: usize,
    /// First day of the "after" partition.
    pub handwashing_start: NaiveDate,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            window_months: DEFAULT_WINDOW_MONTHS,
            handwashing_start: handwashing_start(),
        }
    }
}

impl MetricsConfig {
    pub fn computer(&self) -> MetricComputer {
        MetricComputer::new(self.window_months, self.handwashing_start)
    }
}

/// Presentation settings handed to the report writers.
///
/// Number formatting and chart geometry live here and nowhere else; the
/// analysis itself never formats a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresentationConfig {
    pub output_dir: PathBuf,
    /// Digits after the decimal point in the text report.
    pub float_precision: usize,
    pub chart_width: u32,
    pub chart_height: u32,
    pub render_charts: bool,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("charts"),
            float_precision: 2,
            chart_width: 1200,
            chart_height: 600,
            render_charts: true,
        }
    }
}

impl PresentationConfig {
    pub fn fmt_float(&self, value: f64) -> String {
        format!("{:.*}", self.float_precision, value)
    }

    /// Formats a ratio as a percentage with the configured precision.
    pub fn fmt_pct(&self, ratio: f64) -> String {
        format!("{:.*}%", self.float_precision, ratio * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Append log lines to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Loads the config from `path`, or from `DEFAULT_CONFIG_FILE` when it
/// exists, or falls back to defaults. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, ConfigError> {
    let config = match path {
        Some(path) => load_config_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                load_config_file(default_path)?
            } else {
                AnalysisConfig::default()
            }
        }
    };
    config.validate()?;
    Ok(config)
}

pub fn load_config_file(path: &Path) -> Result<AnalysisConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_config(content: &str) -> Result<AnalysisConfig, toml::de::Error> {
    toml::from_str(content)
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metrics.window_months == 0 {
            return Err(ConfigError::Invalid(
                "metrics.window_months must be at least 1".to_string(),
            ));
        }
        if self.report.float_precision > 12 {
            return Err(ConfigError::Invalid(format!(
                "report.float_precision must be at most 12, got {}",
                self.report.float_precision
            )));
        }
        if self.report.chart_width == 0 || self.report.chart_height == 0 {
            return Err(ConfigError::Invalid(
                "report chart dimensions must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
