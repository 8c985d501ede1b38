//! Chart rendering for processed positions.
//!
//! Two PNG charts per axial position, drawn with plotters:
//! - a radar (polar) chart of the run-out around the circumference
//! - a line chart of the actual run-out against the fitted reference curve
//!
//! Charts only consume series that are already computed.

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use rayon::prelude::*;
use thiserror::Error;

use crate::config::PlotConfig;
use crate::processors::aggregate::PositionRecord;

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("radar chart needs at least {min} samples, got {found}")]
    TooFewPoints { found: usize, min: usize },

    #[error("series length mismatch: run-out has {run_out}, reference has {reference}")]
    LengthMismatch { run_out: usize, reference: usize },
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Minimum number of samples for a radar chart.
pub const MIN_RADAR_POINTS: usize = 3;

/// Radial padding added below the smallest and above the largest value.
const RADAR_PADDING: f64 = 10.0;

/// Number of concentric grid rings on the radar chart.
const RADAR_RINGS: usize = 5;

/// Segments used to approximate each grid ring.
const RING_SEGMENTS: usize = 120;

const ACTUAL_COLOR: RGBColor = RGBColor(0, 0, 255);
const REFERENCE_COLOR: RGBColor = RGBColor(255, 0, 0);
const GRID_COLOR: RGBColor = RGBColor(190, 190, 190);

/// Samples drawn on the radar chart.
///
/// Drops the closing duplicate, keeps at most `max_positions` samples and
/// rotates left by one so the second sample sits at 12 o'clock.
pub fn radar_samples(run_out: &[f64], max_positions: Option<usize>) -> Result<Vec<f64>> {
    let mut samples: Vec<f64> = run_out[..run_out.len().saturating_sub(1)].to_vec();

    if let Some(limit) = max_positions {
        if samples.len() > limit {
            log::warn!("limiting radar chart to the first {} positions", limit);
            samples.truncate(limit);
        }
    }

    if samples.len() < MIN_RADAR_POINTS {
        return Err(VisualizationError::TooFewPoints {
            found: samples.len(),
            min: MIN_RADAR_POINTS,
        });
    }

    samples.rotate_left(1);
    Ok(samples)
}

/// Convert a radar sample to chart coordinates (clockwise from 12 o'clock).
fn polar_point(radius: f64, index: usize, count: usize) -> (f64, f64) {
    let theta = 2.0 * std::f64::consts::PI * index as f64 / count as f64;
    (radius * theta.sin(), radius * theta.cos())
}

/// Plot the run-out of one position as a closed radar line and save as PNG.
///
/// # Arguments
///
/// * `output_path` - Path to save the PNG image
/// * `run_out` - Closed run-out series (`N + 1` points)
/// * `max_positions` - Maximum number of samples shown
/// * `size` - Image size in pixels
pub fn plot_radar_chart(
    output_path: &Path,
    run_out: &[f64],
    max_positions: Option<usize>,
    size: (u32, u32),
) -> Result<()> {
    let samples = radar_samples(run_out, max_positions)?;
    let count = samples.len();

    let (lo, hi) = samples
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let inner = lo - RADAR_PADDING;
    let outer = (hi + RADAR_PADDING) - inner;
    let extent = outer * 1.05;

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(-extent..extent, -extent..extent)
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    // Rings
    for ring in 1..=RADAR_RINGS {
        let radius = outer * ring as f64 / RADAR_RINGS as f64;
        let points: Vec<(f64, f64)> = (0..=RING_SEGMENTS)
            .map(|i| polar_point(radius, i, RING_SEGMENTS))
            .collect();
        chart
            .draw_series(std::iter::once(PathElement::new(points, GRID_COLOR)))
            .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;
    }

    // Spokes
    chart
        .draw_series((0..count).map(|i| {
            PathElement::new(vec![(0.0, 0.0), polar_point(outer, i, count)], GRID_COLOR)
        }))
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    let mut line: Vec<(f64, f64)> = samples
        .iter()
        .enumerate()
        .map(|(i, v)| polar_point(v - inner, i, count))
        .collect();
    line.push(line[0]);

    chart
        .draw_series(LineSeries::new(line, ACTUAL_COLOR.stroke_width(3)))
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    root.present()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    Ok(())
}

/// Axis range with 15% padding, or a fixed padding for flat series.
pub fn padded_range(values: &[f64]) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return (-1.0, 1.0);
    }
    let span = hi - lo;
    let padding = if span < 1e-6 { 0.5 } else { span * 0.15 };
    (lo - padding, hi + padding)
}

/// Plot actual run-out against the reference curve by position and save as PNG.
pub fn plot_runout_profile(
    output_path: &Path,
    run_out: &[f64],
    reference: &[f64],
    size: (u32, u32),
) -> Result<()> {
    if run_out.len() != reference.len() {
        return Err(VisualizationError::LengthMismatch {
            run_out: run_out.len(),
            reference: reference.len(),
        });
    }

    let all: Vec<f64> = run_out.iter().chain(reference).copied().collect();
    let (y_min, y_max) = padded_range(&all);
    let x_max = run_out.len().max(2) as f64;

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(1.0..x_max, y_min..y_max)
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Position")
        .y_desc("Value (mm)")
        .draw()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    let series = |values: &[f64]| -> Vec<(f64, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ((i + 1) as f64, *v))
            .collect()
    };

    chart
        .draw_series(LineSeries::new(series(run_out), ACTUAL_COLOR.stroke_width(2)))
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;
    chart
        .draw_series(LineSeries::new(series(reference), REFERENCE_COLOR.stroke_width(2)))
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    root.present()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    Ok(())
}

/// Render the radar and profile charts of every record into `dir`.
///
/// Charts are independent, so positions are rendered in parallel. Returns
/// the written paths in record order (`radar_<n>.png`, `profile_<n>.png`).
pub fn render_position_charts(
    dir: &Path,
    records: &[PositionRecord],
    config: &PlotConfig,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let size = (config.width, config.height);

    let per_record: Vec<Vec<PathBuf>> = records
        .par_iter()
        .map(|record| -> Result<Vec<PathBuf>> {
            let radar_path = dir.join(format!("radar_{}.png", record.position));
            plot_radar_chart(&radar_path, &record.run_out.values, config.radar_positions, size)?;

            let profile_path = dir.join(format!("profile_{}.png", record.position));
            plot_runout_profile(
                &profile_path,
                &record.run_out.values,
                &record.fit.reference_curve,
                size,
            )?;

            Ok(vec![radar_path, profile_path])
        })
        .collect::<Result<_>>()?;

    Ok(per_record.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radar_samples_drop_closing_point_and_rotate() {
        let samples = radar_samples(&[3.0, 1.0, 2.0, 0.0, 3.0], None).unwrap();
        assert_eq!(samples, vec![1.0, 2.0, 0.0, 3.0]);
    }

    #[test]
    fn test_radar_samples_limited() {
        let run_out = [5.0, 4.0, 3.0, 2.0, 1.0, 0.0, 5.0];
        let samples = radar_samples(&run_out, Some(4)).unwrap();
        assert_eq!(samples, vec![4.0, 3.0, 2.0, 5.0]);
    }

    #[test]
    fn test_radar_samples_too_few() {
        let result = radar_samples(&[1.0, 0.0, 1.0], None);
        assert!(matches!(
            result,
            Err(VisualizationError::TooFewPoints { found: 2, min: 3 })
        ));
    }

    #[test]
    fn test_polar_point_clockwise_from_top() {
        let (x, y) = polar_point(2.0, 0, 4);
        assert!(x.abs() < 1e-12 && (y - 2.0).abs() < 1e-12);
        let (x, y) = polar_point(2.0, 1, 4);
        assert!((x - 2.0).abs() < 1e-12 && y.abs() < 1e-12);
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(&[1.0, 1.0]), (0.5, 1.5));
        let (lo, hi) = padded_range(&[0.0, 10.0]);
        assert!((lo + 1.5).abs() < 1e-12 && (hi - 11.5).abs() < 1e-12);
        assert_eq!(padded_range(&[]), (-1.0, 1.0));
    }

    #[test]
    fn test_radar_chart_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radar.png");
        plot_radar_chart(&path, &[3.0, 1.0, 2.0, 0.0, 3.0], None, (200, 200)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_profile_length_mismatch() {
        let result = plot_runout_profile(Path::new("unused.png"), &[1.0, 2.0], &[1.0], (100, 100));
        assert!(matches!(
            result,
            Err(VisualizationError::LengthMismatch { run_out: 2, reference: 1 })
        ));
    }
}
