//! First-harmonic decomposition of a circumferential run-out profile.
//!
//! For one axial position the measured radii are turned into a run-out
//! profile (`max - value`), projected onto one cosine/sine cycle per
//! revolution to get the eccentricity vector `(X, Y)`, and the fitted
//! sinusoid is subtracted to leave the shell distortion.
//!
//! All series are closed loops of `N + 1` points matching [`AngularGrid`];
//! sums and means run over the first `N` points only.

use thiserror::Error;

use crate::core::grid::AngularGrid;

/// Column-level failures. The aggregator skips the position and continues.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecompositionError {
    #[error("measured series is empty")]
    EmptySeries,

    #[error("measured series has {found} samples, grid expects {expected}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("measured series has no numeric values")]
    NoNumericData,
}

/// Run-out profile of one axial position.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutSeries {
    /// Measured values closed into a loop (first value repeated at the end).
    pub measured: Vec<Option<f64>>,
    /// `max(measured) - measured[k]`, zero where the measurement is missing.
    pub values: Vec<f64>,
    /// Largest measured value.
    pub max_measured: f64,
}

impl RunOutSeries {
    /// Close the measured series and compute run-out against its maximum.
    pub fn from_measured(series: &[Option<f64>]) -> Result<Self, DecompositionError> {
        let first = *series.first().ok_or(DecompositionError::EmptySeries)?;

        let mut measured = Vec::with_capacity(series.len() + 1);
        measured.extend_from_slice(series);
        measured.push(first);

        let max_measured = measured
            .iter()
            .flatten()
            .copied()
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
            .ok_or(DecompositionError::NoNumericData)?;

        let values = measured
            .iter()
            .map(|v| v.map_or(0.0, |v| max_measured - v))
            .collect();

        Ok(Self {
            measured,
            values,
            max_measured,
        })
    }

    /// Largest run-out over the loop (the sheet's "Runout" figure).
    pub fn max_runout(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// First-harmonic fit of a run-out profile and the intermediate projection columns.
///
/// Every `Vec` field has one entry per grid point (`N + 1`).
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicFit {
    /// Cosine coefficient.
    pub x: f64,
    /// Sine coefficient.
    pub y: f64,
    /// Eccentricity, `sqrt(x^2 + y^2)`.
    pub magnitude: f64,
    /// Angle of occurrence in degrees, `[0, 360)`.
    pub phase_angle: f64,
    /// Grid angle in radians.
    pub theta: Vec<f64>,
    /// `cos(theta) * run_out`
    pub cos_projection: Vec<f64>,
    /// `sin(theta) * run_out`
    pub sin_projection: Vec<f64>,
    /// `(phase_angle - angle)` in radians.
    pub angle_diff: Vec<f64>,
    pub cos_angle_diff: Vec<f64>,
    /// Fitted sinusoid, `magnitude * cos(angle_diff)`.
    pub reference_component: Vec<f64>,
    /// `run_out - reference_component`
    pub residual: Vec<f64>,
    /// Mean residual over the first `N` points (local shell deformation).
    pub mean_residual: f64,
    /// Residual re-centred to zero mean, reported as distortion.
    pub distortion: Vec<f64>,
    /// Fitted sinusoid lifted by the mean residual, drawn against the run-out.
    pub reference_curve: Vec<f64>,
}

/// Run-out profile together with its fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub run_out: RunOutSeries,
    pub fit: HarmonicFit,
}

/// Map `(x, y)` to its direction in degrees, `[0, 360)`.
///
/// A zero vector has no direction and maps to 0.
pub fn phase_angle(x: f64, y: f64) -> f64 {
    let magnitude = (x * x + y * y).sqrt();
    let mut angle = if magnitude != 0.0 {
        (x / magnitude).clamp(-1.0, 1.0).acos().to_degrees()
    } else {
        0.0
    };
    if y < 0.0 {
        angle = 360.0 - angle;
    }
    if angle >= 360.0 {
        angle -= 360.0;
    }
    angle
}

/// Decompose one position's measured series (length `N`) on `grid`.
///
/// # Errors
///
/// Returns a [`DecompositionError`] when the series is empty, does not match
/// the grid's sample count, or has no numeric value to take a maximum from.
pub fn decompose(
    measured: &[Option<f64>],
    grid: &AngularGrid,
) -> Result<Decomposition, DecompositionError> {
    if measured.is_empty() {
        return Err(DecompositionError::EmptySeries);
    }
    let n = grid.sample_count();
    if measured.len() != n {
        return Err(DecompositionError::LengthMismatch {
            expected: n,
            found: measured.len(),
        });
    }

    let run_out = RunOutSeries::from_measured(measured)?;
    let fit = fit_first_harmonic(&run_out.values, grid)?;

    Ok(Decomposition { run_out, fit })
}

/// Fit one cosine/sine cycle to a closed run-out profile.
///
/// # Errors
///
/// Returns [`DecompositionError::LengthMismatch`] unless `run_out` has
/// `grid.len()` points.
pub fn fit_first_harmonic(
    run_out: &[f64],
    grid: &AngularGrid,
) -> Result<HarmonicFit, DecompositionError> {
    if run_out.len() != grid.len() {
        return Err(DecompositionError::LengthMismatch {
            expected: grid.len(),
            found: run_out.len(),
        });
    }

    let n = grid.sample_count();
    let angles = grid.angles_deg();
    let theta = grid.angles_rad();

    let cos_projection: Vec<f64> = theta
        .iter()
        .zip(run_out)
        .map(|(t, r)| t.cos() * r)
        .collect();
    let sin_projection: Vec<f64> = theta
        .iter()
        .zip(run_out)
        .map(|(t, r)| t.sin() * r)
        .collect();

    // The closing duplicate is excluded from the projection sums
    let sum_cos: f64 = cos_projection[..n].iter().sum();
    let sum_sin: f64 = sin_projection[..n].iter().sum();

    let x = 2.0 / n as f64 * sum_cos;
    let y = 2.0 / n as f64 * sum_sin;
    let magnitude = (x * x + y * y).sqrt();
    let phase_angle = phase_angle(x, y);

    let angle_diff: Vec<f64> = angles
        .iter()
        .map(|a| (phase_angle - a).to_radians())
        .collect();
    let cos_angle_diff: Vec<f64> = angle_diff.iter().map(|d| d.cos()).collect();
    let reference_component: Vec<f64> = cos_angle_diff.iter().map(|c| magnitude * c).collect();

    let residual: Vec<f64> = run_out
        .iter()
        .zip(&reference_component)
        .map(|(r, f)| r - f)
        .collect();
    let mean_residual = residual[..n].iter().sum::<f64>() / n as f64;

    let distortion = residual.iter().map(|r| r - mean_residual).collect();
    let reference_curve = reference_component
        .iter()
        .map(|f| f + mean_residual)
        .collect();

    log::debug!(
        "first harmonic: x={:.4} y={:.4} magnitude={:.4} phase={:.2}",
        x,
        y,
        magnitude,
        phase_angle
    );

    Ok(HarmonicFit {
        x,
        y,
        magnitude,
        phase_angle,
        theta,
        cos_projection,
        sin_projection,
        angle_diff,
        cos_angle_diff,
        reference_component,
        residual,
        mean_residual,
        distortion,
        reference_curve,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < EPS, "{:?} != {:?}", actual, expected);
        }
    }

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_four_sample_decomposition() {
        let grid = AngularGrid::build(4).unwrap();
        let result = decompose(&some(&[10.0, 12.0, 11.0, 13.0]), &grid).unwrap();

        assert_close(&result.run_out.values, &[3.0, 1.0, 2.0, 0.0, 3.0]);
        assert_eq!(result.run_out.max_measured, 13.0);
        assert_eq!(result.run_out.max_runout(), 3.0);

        let fit = &result.fit;
        assert!((fit.x - 0.5).abs() < EPS);
        assert!((fit.y - 0.5).abs() < EPS);
        assert!((fit.magnitude - 0.5f64.sqrt()).abs() < EPS);
        assert!((fit.phase_angle - 45.0).abs() < 1e-6);

        assert_close(&fit.reference_component, &[0.5, 0.5, -0.5, -0.5, 0.5]);
        assert_close(&fit.residual, &[2.5, 0.5, 2.5, 0.5, 2.5]);
        assert!((fit.mean_residual - 1.5).abs() < EPS);
        assert_close(&fit.distortion, &[1.0, -1.0, 1.0, -1.0, 1.0]);
        assert_close(&fit.reference_curve, &[2.0, 2.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_projection_columns_cover_closing_point() {
        let grid = AngularGrid::build(4).unwrap();
        let fit = decompose(&some(&[10.0, 12.0, 11.0, 13.0]), &grid).unwrap().fit;

        assert_eq!(fit.theta.len(), 5);
        assert_close(&fit.cos_projection, &[3.0, 0.0, -2.0, 0.0, 3.0]);
        assert_close(&fit.sin_projection, &[0.0, 1.0, 0.0, 0.0, 0.0]);
        assert!((fit.angle_diff[0] - 45f64.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_flat_profile_has_zero_eccentricity() {
        let grid = AngularGrid::build(6).unwrap();
        let fit = decompose(&some(&[5.0; 6]), &grid).unwrap().fit;

        assert_eq!(fit.magnitude, 0.0);
        assert_eq!(fit.phase_angle, 0.0);
        assert_close(&fit.distortion, &[0.0; 7]);
    }

    #[test]
    fn test_pure_eccentric_profile_has_no_distortion() {
        // Radius peaks at 90 degrees, so run-out is smallest there
        let n = 12;
        let grid = AngularGrid::build(n).unwrap();
        let measured: Vec<Option<f64>> = grid.angles_deg()[..n]
            .iter()
            .map(|a| Some(100.0 + 2.0 * (a - 90.0).to_radians().cos()))
            .collect();

        let fit = decompose(&measured, &grid).unwrap().fit;
        assert!((fit.magnitude - 2.0).abs() < 1e-9);
        assert!((fit.phase_angle - 270.0).abs() < 1e-6);
        assert!(fit.distortion.iter().all(|d| d.abs() < 1e-9));
    }

    #[test]
    fn test_fit_rejects_open_run_out() {
        let grid = AngularGrid::build(4).unwrap();
        let result = fit_first_harmonic(&[3.0, 1.0, 2.0], &grid);
        assert_eq!(
            result,
            Err(DecompositionError::LengthMismatch {
                expected: 5,
                found: 3
            })
        );

        let fit = fit_first_harmonic(&[3.0, 1.0, 2.0, 0.0, 3.0], &grid).unwrap();
        assert!((fit.x - 0.5).abs() < EPS);
    }

    #[test]
    fn test_missing_values_zero_filled() {
        let grid = AngularGrid::build(4).unwrap();
        let result = decompose(&[Some(10.0), None, Some(11.0), Some(13.0)], &grid).unwrap();
        assert_close(&result.run_out.values, &[3.0, 0.0, 2.0, 0.0, 3.0]);
        assert_eq!(result.run_out.measured[1], None);
        assert_eq!(result.run_out.measured[4], Some(10.0));
    }

    #[test]
    fn test_missing_first_value_leaves_closing_point_missing() {
        let grid = AngularGrid::build(3).unwrap();
        let result = decompose(&[None, Some(4.0), Some(6.0)], &grid).unwrap();
        assert_close(&result.run_out.values, &[0.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_all_missing_is_data_error() {
        let grid = AngularGrid::build(4).unwrap();
        let result = decompose(&[None; 4], &grid);
        assert_eq!(result.unwrap_err(), DecompositionError::NoNumericData);
    }

    #[test]
    fn test_length_mismatch() {
        let grid = AngularGrid::build(4).unwrap();
        let result = decompose(&some(&[1.0, 2.0, 3.0]), &grid);
        assert_eq!(
            result.unwrap_err(),
            DecompositionError::LengthMismatch { expected: 4, found: 3 }
        );
        assert_eq!(decompose(&[], &grid).unwrap_err(), DecompositionError::EmptySeries);
    }

    #[test]
    fn test_phase_angle_quadrants() {
        assert!((phase_angle(1.0, 0.0) - 0.0).abs() < 1e-9);
        assert!((phase_angle(0.0, 1.0) - 90.0).abs() < 1e-9);
        assert!((phase_angle(-1.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((phase_angle(0.0, -1.0) - 270.0).abs() < 1e-9);
        assert!((phase_angle(1.0, -1.0) - 315.0).abs() < 1e-9);
        assert_eq!(phase_angle(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_phase_angle_tiny_negative_y_stays_below_360() {
        let angle = phase_angle(1.0, -1e-300);
        assert!((0.0..360.0).contains(&angle));
    }

    fn arb_series() -> impl Strategy<Value = Vec<Option<f64>>> {
        (3usize..72).prop_flat_map(|n| {
            proptest::collection::vec(
                prop_oneof![
                    6 => (-500.0f64..500.0).prop_map(Some),
                    1 => Just(None),
                ],
                n,
            )
        })
    }

    proptest! {
        #[test]
        fn prop_run_out_non_negative_and_zero_at_max(series in arb_series()) {
            let grid = AngularGrid::build(series.len()).unwrap();
            prop_assume!(series.iter().any(Option::is_some));
            let result = decompose(&series, &grid).unwrap();

            prop_assert!(result.run_out.values.iter().all(|&r| r >= 0.0));
            let argmax = series
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.map(|v| (i, v)))
                .fold((0, f64::MIN), |best, (i, v)| if v > best.1 { (i, v) } else { best })
                .0;
            prop_assert_eq!(result.run_out.values[argmax], 0.0);
        }

        #[test]
        fn prop_fit_invariants(series in arb_series()) {
            let grid = AngularGrid::build(series.len()).unwrap();
            prop_assume!(series.iter().any(Option::is_some));
            let fit = decompose(&series, &grid).unwrap().fit;
            let n = series.len();

            prop_assert!(fit.magnitude >= 0.0);
            prop_assert!((fit.magnitude - (fit.x * fit.x + fit.y * fit.y).sqrt()).abs() < 1e-9);
            prop_assert!(fit.phase_angle >= 0.0 && fit.phase_angle < 360.0);
            prop_assert_eq!(fit.reference_curve.len(), n + 1);
            prop_assert_eq!(fit.distortion.len(), n + 1);

            let mean: f64 = fit.distortion[..n].iter().sum::<f64>() / n as f64;
            prop_assert!(mean.abs() < 1e-8, "distortion mean {}", mean);
        }
    }
}
