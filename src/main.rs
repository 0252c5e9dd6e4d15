use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use handwashing_analysis::analysis;
use handwashing_analysis::config::{AnalysisConfig, load_config};
use handwashing_analysis::logging::{self, LogLevel};
use handwashing_analysis::report;

#[derive(Debug, Parser)]
#[command(version, about = "Maternal mortality before and after handwashing, by clinic and by month")]
struct Cli {
    /// TOML config file (defaults to ./handwashing.toml when present)
    #[arg(long, env = "HANDWASH_CONFIG")]
    config: Option<PathBuf>,

    /// Yearly per-clinic CSV (year, births, deaths, clinic)
    #[arg(long, env = "HANDWASH_YEARLY")]
    yearly: Option<PathBuf>,

    /// Monthly CSV (date, births, deaths)
    #[arg(long, env = "HANDWASH_MONTHLY")]
    monthly: Option<PathBuf>,

    /// Rolling average window, in months
    #[arg(long)]
    window: Option<usize>,

    /// Directory for charts and the JSON summary
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long)]
    no_charts: bool,

    /// Minimum log level (debug, info, warn, error)
    #[arg(long, env = "HANDWASH_LOG_LEVEL")]
    log_level: Option<LogLevel>,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn apply(self, config: &mut AnalysisConfig) {
        if let Some(path) = self.yearly {
            config.data.yearly_path = path;
        }
        if let Some(path) = self.monthly {
            config.data.monthly_path = path;
        }
        if let Some(window) = self.window {
            config.metrics.window_months = window;
        }
        if let Some(dir) = self.output_dir {
            config.report.output_dir = dir;
        }
        if self.no_charts {
            config.report.render_charts = false;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(file) = self.log_file {
            config.logging.file = Some(file);
        }
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut config);
    config.validate().context("validating configuration")?;

    logging::init_logger(config.logging.level, config.logging.file.as_deref())
        .context("opening log file")?;
    info!(
        yearly = %config.data.yearly_path.display(),
        monthly = %config.data.monthly_path.display(),
        window = config.metrics.window_months,
        cutoff = %config.metrics.handwashing_start,
        "startup"
    );

    let outcome = match analysis::run(&config) {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("analysis failed: {}", err);
            return Err(err).context("running analysis");
        }
    };

    print!("{}", report::render_text(&outcome, &config.report));

    let summary = report::write_json(&outcome, &config.report.output_dir)?;
    println!("\nSummary written to {}", summary.display());

    if config.report.render_charts {
        let charts = report::render_all(&outcome, &config.report)?;
        println!("{} charts written to {}", charts.len(), config.report.output_dir.display());
    }

    info!("all done");
    Ok(())
}
