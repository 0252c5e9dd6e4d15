use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use tracing::{debug, info};

use crate::analysis::AnalysisOutcome;
use crate::analysis::clinics::group_by_clinic;
use crate::analysis::density::{gaussian_kde, linspace};
use crate::analysis::pipeline::ratios;
use crate::config::PresentationConfig;
use crate::logging::{Dataset, log_failure, log_render_summary};
use crate::model::{MonthlyRecord, RollingPoint};

use super::ReportResult;

const KDE_POINTS: usize = 200;

// ---------------------------------------------------------------------------
// Axis helpers
// ---------------------------------------------------------------------------

/// Dates are plotted as day numbers so every chart shares one numeric axis.
pub fn day_number(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}

fn day_label(day: &i32) -> String {
    NaiveDate::from_num_days_from_ce_opt(*day)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

/// Range covering every value with 5% headroom on each side. Falls back to
/// `0..1` when there are no finite values.
pub fn padded_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5_f64.max(hi.abs() * 0.05) };
    (lo - pad)..(hi + pad)
}

/// First and last day of a monthly series, widened by one day when the
/// series has a single record.
pub fn date_range(records: &[MonthlyRecord]) -> Option<Range<i32>> {
    let first = day_number(records.first()?.date);
    let last = day_number(records.last()?.date);
    Some(first..last.max(first + 1))
}

fn ratio_points(records: &[MonthlyRecord]) -> Vec<(i32, f64)> {
    records
        .iter()
        .filter_map(|r| Some((day_number(r.date), r.pct_deaths?)))
        .collect()
}

fn rolling_points(rolling: &[RollingPoint]) -> Vec<(i32, f64)> {
    rolling.iter().map(|p| (day_number(p.date), p.average)).collect()
}

fn pct_label(v: &f64) -> String {
    format!("{:.0}%", v * 100.0)
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// Yearly death ratio, one line per clinic.
pub fn plot_yearly_pct_by_clinic(
    outcome: &AnalysisOutcome,
    cfg: &PresentationConfig,
    path: &Path,
) -> ReportResult<bool> {
    let groups = group_by_clinic(&outcome.yearly);
    let years = outcome.yearly.iter().map(|r| r.year);
    let x_min = years.clone().min().unwrap_or(0);
    let x_max = years.max().unwrap_or(0).max(x_min + 1);
    let y_range = padded_range(outcome.yearly.iter().filter_map(|r| r.pct_deaths));

    let root = BitMapBackend::new(path, (cfg.chart_width, cfg.chart_height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Yearly Death Rate by Clinic", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Deaths / Births")
        .y_label_formatter(&pct_label)
        .draw()?;

    for (idx, (clinic, rows)) in groups.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let points: Vec<(i32, f64)> = rows
            .iter()
            .filter_map(|r| Some((r.year, r.pct_deaths?)))
            .collect();
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(clinic.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(true)
}

/// Monthly births and deaths over time. Draws nothing for an empty series.
pub fn plot_monthly_counts(
    outcome: &AnalysisOutcome,
    cfg: &PresentationConfig,
    path: &Path,
) -> ReportResult<bool> {
    let records = &outcome.monthly.records;
    let Some(x_range) = date_range(records) else {
        return Ok(false);
    };
    let y_max = records.iter().map(|r| r.births).max().unwrap_or(1).max(1);

    let root = BitMapBackend::new(path, (cfg.chart_width, cfg.chart_height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Births and Deaths", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, 0u32..y_max.saturating_add(y_max / 10 + 1))?;

    chart
        .configure_mesh()
        .x_desc("Month")
        .y_desc("Count")
        .x_label_formatter(&day_label)
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            records.iter().map(|r| (day_number(r.date), r.births)),
            BLUE.stroke_width(2),
        ))?
        .label("births")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    chart
        .draw_series(LineSeries::new(
            records.iter().map(|r| (day_number(r.date), r.deaths)),
            RED.stroke_width(2),
        ))?
        .label("deaths")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(true)
}

/// Monthly death ratio split at the cutoff, with the rolling average on top.
pub fn plot_monthly_pct_deaths(
    outcome: &AnalysisOutcome,
    cfg: &PresentationConfig,
    path: &Path,
) -> ReportResult<bool> {
    let metrics = &outcome.monthly;
    let Some(x_range) = date_range(&metrics.records) else {
        return Ok(false);
    };
    let y_range = padded_range(ratios(&metrics.records));
    let cutoff = day_number(outcome.computer.cutoff);

    let root = BitMapBackend::new(path, (cfg.chart_width, cfg.chart_height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Death Rate", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), y_range.clone())?;

    chart
        .configure_mesh()
        .x_desc("Month")
        .y_desc("Deaths / Births")
        .x_label_formatter(&day_label)
        .y_label_formatter(&pct_label)
        .draw()?;

    chart
        .draw_series(LineSeries::new(ratio_points(&metrics.before), RED.stroke_width(2)))?
        .label("before handwashing")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

    chart
        .draw_series(LineSeries::new(ratio_points(&metrics.after), GREEN.stroke_width(2)))?
        .label("after handwashing")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN.stroke_width(2)));

    let window = outcome.computer.window_months;
    chart
        .draw_series(LineSeries::new(rolling_points(&metrics.rolling), BLACK.stroke_width(1)))?
        .label(format!("{window}-month average"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(1)));

    if x_range.contains(&cutoff) {
        chart.draw_series(LineSeries::new(
            vec![(cutoff, y_range.start), (cutoff, y_range.end)],
            BLACK.mix(0.4).stroke_width(1),
        ))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(true)
}

/// Box plot of the monthly ratio on each side of the cutoff.
pub fn plot_before_after_boxplot(
    outcome: &AnalysisOutcome,
    cfg: &PresentationConfig,
    path: &Path,
) -> ReportResult<bool> {
    let before = ratios(&outcome.monthly.before);
    let after = ratios(&outcome.monthly.after);
    let labels = vec!["before".to_string(), "after".to_string()];
    let groups: Vec<(&String, Quartiles)> = labels
        .iter()
        .zip([&before, &after])
        .filter(|(_, values)| !values.is_empty())
        .map(|(label, values)| (label, Quartiles::new(values.as_slice())))
        .collect();
    if groups.is_empty() {
        return Ok(false);
    }

    let y_range = padded_range(before.iter().chain(&after).copied());
    let y_range = (y_range.start as f32)..(y_range.end as f32);

    let root = BitMapBackend::new(path, (cfg.chart_width, cfg.chart_height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Monthly Death Rate Before and After Handwashing",
            ("sans-serif", 30).into_font(),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(labels[..].into_segmented(), y_range)?;

    chart
        .configure_mesh()
        .y_desc("Deaths / Births")
        .y_label_formatter(&|v| format!("{:.0}%", v * 100.0))
        .draw()?;

    chart.draw_series(groups.iter().map(|(label, quartiles)| {
        Boxplot::new_vertical(SegmentValue::CenterOf(*label), quartiles)
            .width(60)
            .style(&BLUE)
    }))?;

    root.present()?;
    Ok(true)
}

/// Kernel density estimate of the monthly ratio on each side of the cutoff.
///
/// Returns `false` without touching `path` when neither side has enough
/// spread for a bandwidth.
pub fn plot_before_after_density(
    outcome: &AnalysisOutcome,
    cfg: &PresentationConfig,
    path: &Path,
) -> ReportResult<bool> {
    let before = ratios(&outcome.monthly.before);
    let after = ratios(&outcome.monthly.after);
    let x_range = padded_range(before.iter().chain(&after).copied());
    let grid = linspace(x_range.start, x_range.end, KDE_POINTS);

    let sides = [("before", RED, &before), ("after", GREEN, &after)];
    let curves: Vec<(&str, RGBColor, Vec<(f64, f64)>)> = sides
        .into_iter()
        .filter_map(|(label, color, samples)| Some((label, color, gaussian_kde(samples, &grid)?)))
        .collect();
    if curves.is_empty() {
        debug!("not enough spread in monthly ratios for a density estimate");
        return Ok(false);
    }
    let y_max = curves
        .iter()
        .flat_map(|(_, _, curve)| curve.iter().map(|(_, y)| *y))
        .fold(0.0, f64::max);

    let root = BitMapBackend::new(path, (cfg.chart_width, cfg.chart_height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Distribution of Monthly Death Rate", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, 0.0..(y_max * 1.1).max(f64::EPSILON))?;

    chart
        .configure_mesh()
        .x_desc("Deaths / Births")
        .y_desc("Density")
        .x_label_formatter(&pct_label)
        .draw()?;

    for (label, color, curve) in curves {
        chart
            .draw_series(LineSeries::new(curve, color.stroke_width(2)))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

type ChartFn = fn(&AnalysisOutcome, &PresentationConfig, &Path) -> ReportResult<bool>;

/// File names and renderers for every chart, in drawing order.
pub const CHARTS: &[(&str, ChartFn)] = &[
    ("yearly_pct_deaths_by_clinic.png", plot_yearly_pct_by_clinic as ChartFn),
    ("monthly_births_deaths.png", plot_monthly_counts as ChartFn),
    ("monthly_pct_deaths.png", plot_monthly_pct_deaths as ChartFn),
    ("before_after_boxplot.png", plot_before_after_boxplot as ChartFn),
    ("before_after_density.png", plot_before_after_density as ChartFn),
];

/// Render every chart into `cfg.output_dir`.
///
/// A chart that fails is logged and skipped; the rest are still drawn.
/// Any file left from an earlier run is removed first, so the returned paths
/// are exactly the charts drawn by this call.
pub fn render_all(
    outcome: &AnalysisOutcome,
    cfg: &PresentationConfig,
) -> ReportResult<Vec<PathBuf>> {
    std::fs::create_dir_all(&cfg.output_dir)?;

    let mut written = Vec::new();
    for (file_name, plot) in CHARTS {
        let path = cfg.output_dir.join(file_name);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        info!(chart = file_name, "plotting");
        match plot(outcome, cfg, &path) {
            Ok(true) => written.push(path),
            Ok(false) => debug!(chart = file_name, "nothing to plot"),
            Err(err) => log_failure(Dataset::Report, file_name, &err),
        }
    }

    log_render_summary(CHARTS.len(), written.len());
    Ok(written)
}
