//! Plain-text report printed at the end of a run.

use std::fmt::Write;

use crate::analysis::AnalysisOutcome;
use crate::analysis::pipeline::TableStats;
use crate::analysis::summary::Describe;
use crate::config::PresentationConfig;

const RULE: &str = "═══════════════════════════════════════════════════════════";

/// Render the whole report: clinic totals, descriptive statistics for both
/// tables, and the before/after comparison.
pub fn render_text(outcome: &AnalysisOutcome, cfg: &PresentationConfig) -> String {
    let mut out = String::new();
    // fmt::Write into a String cannot fail
    let _ = write_report(&mut out, outcome, cfg);
    out
}

fn write_report(
    out: &mut String,
    outcome: &AnalysisOutcome,
    cfg: &PresentationConfig,
) -> std::fmt::Result {
    writeln!(out, "{RULE}")?;
    writeln!(out, "Yearly deaths by clinic")?;
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "{:<12} {:>11} {:>8} {:>8} {:>10} {:>12}",
        "clinic", "years", "births", "deaths", "pooled", "mean yearly"
    )?;
    for c in &outcome.clinics {
        writeln!(
            out,
            "{:<12} {:>11} {:>8} {:>8} {:>10} {:>12}",
            c.clinic,
            format!("{}-{}", c.first_year, c.last_year),
            c.total_births,
            c.total_deaths,
            cfg.fmt_pct(c.pooled_pct_deaths),
            cfg.fmt_pct(c.mean_yearly_pct_deaths),
        )?;
    }

    writeln!(out)?;
    write_stats(out, "Yearly table", &outcome.yearly_stats, cfg)?;
    writeln!(out)?;
    write_stats(out, "Monthly table", &outcome.monthly_stats, cfg)?;

    let metrics = &outcome.monthly;
    let computer = &outcome.computer;
    writeln!(out)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Handwashing from {}", computer.cutoff)?;
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "Months: {} before, {} after",
        metrics.before.len(),
        metrics.after.len()
    )?;
    match &outcome.comparison {
        Some(cmp) => {
            writeln!(out, "Mean monthly death rate before: {}", cfg.fmt_pct(cmp.before_mean))?;
            writeln!(out, "Mean monthly death rate after:  {}", cfg.fmt_pct(cmp.after_mean))?;
            writeln!(
                out,
                "Change: {} percentage points",
                cfg.fmt_float(cmp.difference * 100.0)
            )?;
            if let Some(factor) = cmp.reduction_factor {
                writeln!(out, "Death rate fell by a factor of {}", cfg.fmt_float(factor))?;
            }
        }
        None => writeln!(out, "Not enough data on both sides of the cutoff to compare")?,
    }

    match metrics.rolling.last() {
        Some(last) => writeln!(
            out,
            "{}-month rolling average: {} points, last {} on {}",
            computer.window_months,
            metrics.rolling.len(),
            cfg.fmt_pct(last.average),
            last.date
        )?,
        None => writeln!(
            out,
            "{}-month rolling average: fewer than {} months of data",
            computer.window_months, computer.window_months
        )?,
    }
    Ok(())
}

fn write_stats(
    out: &mut String,
    title: &str,
    stats: &TableStats,
    cfg: &PresentationConfig,
) -> std::fmt::Result {
    writeln!(out, "{title}")?;
    writeln!(out, "{:<6} {:>12} {:>12} {:>12}", "", "births", "deaths", "pct_deaths")?;

    let rows: [(&str, fn(&Describe) -> f64); 7] = [
        ("mean", |d| d.mean),
        ("std", |d| d.std),
        ("min", |d| d.min),
        ("25%", |d| d.q25),
        ("50%", |d| d.median),
        ("75%", |d| d.q75),
        ("max", |d| d.max),
    ];
    let columns = [&stats.births, &stats.deaths, &stats.pct_deaths];

    let counts: Vec<String> = columns
        .iter()
        .map(|c| c.map(|d| d.count.to_string()).unwrap_or_else(|| "-".to_string()))
        .collect();
    writeln!(out, "{:<6} {:>12} {:>12} {:>12}", "count", counts[0], counts[1], counts[2])?;

    for (name, pick) in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| c.map(|d| cfg.fmt_float(pick(&d))).unwrap_or_else(|| "-".to_string()))
            .collect();
        writeln!(out, "{:<6} {:>12} {:>12} {:>12}", name, cells[0], cells[1], cells[2])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::pipeline::analyse;
    use crate::analysis::MetricComputer;
    use crate::model::{MonthlyRecord, YearlyRecord};
    use chrono::NaiveDate;

    fn outcome() -> AnalysisOutcome {
        let yearly = [("clinic 1", 4010, 459), ("clinic 2", 3754, 105)]
            .into_iter()
            .map(|(clinic, births, deaths)| YearlyRecord {
                year: 1846,
                clinic: clinic.to_string(),
                births,
                deaths,
                pct_deaths: None,
            })
            .collect();
        let monthly = (1..=8)
            .map(|m| {
                let deaths = if m < 6 { 10 } else { 2 };
                MonthlyRecord::new(NaiveDate::from_ymd_opt(1847, m, 1).unwrap(), 100, deaths)
            })
            .collect();
        analyse(yearly, monthly, MetricComputer::default()).unwrap()
    }

    #[test]
    fn test_report_contains_every_section() {
        let text = render_text(&outcome(), &PresentationConfig::default());
        assert!(text.contains("Yearly deaths by clinic"));
        assert!(text.contains("clinic 2"));
        assert!(text.contains("Monthly table"));
        assert!(text.contains("Handwashing from 1847-06-01"));
        assert!(text.contains("Months: 5 before, 3 after"));
        assert!(text.contains("Mean monthly death rate before: 10.00%"));
        assert!(text.contains("Mean monthly death rate after:  2.00%"));
        assert!(text.contains("Death rate fell by a factor of 5.00"));
        assert!(text.contains("6-month rolling average: 3 points"));
    }

    #[test]
    fn test_report_uses_configured_precision() {
        let cfg = PresentationConfig {
            float_precision: 0,
            ..PresentationConfig::default()
        };
        let text = render_text(&outcome(), &cfg);
        assert!(text.contains("Mean monthly death rate before: 10%"));
    }
}
