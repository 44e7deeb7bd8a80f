use super::table::ResultRow;
use crate::error::ReportError;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const HISTOGRAM_BINS: usize = 30;

fn plot_err<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Plot(e.to_string())
}

/// Draws every visualization that has data. Failures are logged, not returned.
pub fn render_all(out_dir: &Path, rows: &[ResultRow]) -> Vec<PathBuf> {
    let mut written = Vec::new();

    let histograms: [(&str, &str, fn(&ResultRow) -> Option<f64>); 4] = [
        ("histogram_timax.svg", "TImax in ROI", |r| r.ti_max_roi),
        ("histogram_timean.svg", "TImean in ROI", |r| r.ti_mean_roi),
        ("histogram_focality.svg", "Focality", |r| r.focality),
        ("histogram_composite.svg", "Composite Index", |r| r.composite_index),
    ];

    for (file, label, metric) in histograms {
        let values: Vec<f64> = rows.iter().filter_map(metric).collect();
        if values.is_empty() {
            debug!("No values for {}; histogram skipped", label);
            continue;
        }
        let path = out_dir.join(file);
        match render_histogram(&path, label, &values) {
            Ok(()) => written.push(path),
            Err(e) => warn!("Could not draw {}: {}", path.display(), e),
        }
    }

    let points: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| Some((r.ti_mean_roi?, r.focality?)))
        .collect();
    if points.is_empty() {
        debug!("No intensity/focality pairs; scatter skipped");
    } else {
        let path = out_dir.join("scatter_intensity_vs_focality.svg");
        match render_scatter(&path, &points) {
            Ok(()) => written.push(path),
            Err(e) => warn!("Could not draw {}: {}", path.display(), e),
        }
    }

    written
}

/// Bin lower edges and counts over `[min, max]`.
pub fn histogram_counts(values: &[f64], bins: usize) -> (f64, f64, Vec<usize>) {
    let (mut min, mut max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0, vec![0; bins.max(1)]);
    }
    if max - min <= f64::EPSILON {
        let pad = if min == 0.0 { 0.5 } else { min.abs() * 0.05 };
        min -= pad;
        max += pad;
    }

    let bins = bins.max(1);
    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    (min, max, counts)
}

pub fn render_histogram(path: &Path, label: &str, values: &[f64]) -> Result<(), ReportError> {
    let (min, max, counts) = histogram_counts(values, HISTOGRAM_BINS);
    let width = (max - min) / counts.len() as f64;
    let y_max = counts.iter().copied().max().unwrap_or(0).max(1) as f64;

    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Distribution of {}", label), ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(min..max, 0.0..(y_max * 1.1))
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(label)
        .y_desc("montages")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(i, &count)| {
            let x0 = min + i as f64 * width;
            Rectangle::new([(x0, 0.0), (x0 + width, count as f64)], BLUE.mix(0.6).filled())
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

pub fn render_scatter(path: &Path, points: &[(f64, f64)]) -> Result<(), ReportError> {
    let (x_min, x_max, _) = histogram_counts(&points.iter().map(|p| p.0).collect::<Vec<_>>(), 1);
    let (y_min, y_max, _) = histogram_counts(&points.iter().map(|p| p.1).collect::<Vec<_>>(), 1);

    let root = SVGBackend::new(path, (1000, 700)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Intensity vs Focality", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("TImean in ROI")
        .y_desc("Focality")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, RED.filled())),
        )
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}
