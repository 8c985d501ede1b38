//! Angular sampling grid shared by every axial position of a survey.
//!
//! A survey with `N` samples per revolution is measured at angles
//! `0, 360/N, 2*360/N, ...`. The grid is closed: a final point repeats
//! position 1 at 360 degrees so that profiles can be drawn as loops.

use thiserror::Error;

/// Errors raised while building a grid.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GridError {
    #[error("sample count must be positive")]
    ZeroSamples,
}

/// Closed angular grid of `N + 1` (position, angle) pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct AngularGrid {
    positions: Vec<usize>,
    angles_deg: Vec<f64>,
}

impl AngularGrid {
    /// Build the grid for `sample_count` samples per revolution.
    ///
    /// Positions run `1..=N` followed by `1`; angles run `i * 360/N` for
    /// `i < N` followed by exactly `360`.
    pub fn build(sample_count: usize) -> Result<Self, GridError> {
        if sample_count == 0 {
            return Err(GridError::ZeroSamples);
        }

        let increment = 360.0 / sample_count as f64;

        let mut positions: Vec<usize> = (1..=sample_count).collect();
        positions.push(1);

        let mut angles_deg: Vec<f64> = (0..sample_count).map(|i| i as f64 * increment).collect();
        angles_deg.push(360.0);

        Ok(Self {
            positions,
            angles_deg,
        })
    }

    /// Samples per revolution (`N`).
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.positions.len() - 1
    }

    /// Number of grid points including the closing one (`N + 1`).
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false; a grid holds at least one sample plus the closing point.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    #[inline]
    pub fn angles_deg(&self) -> &[f64] {
        &self.angles_deg
    }

    /// Grid angles in radians.
    pub fn angles_rad(&self) -> Vec<f64> {
        self.angles_deg.iter().map(|a| a.to_radians()).collect()
    }

    /// Iterate over `(position, angle_deg)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.positions
            .iter()
            .copied()
            .zip(self.angles_deg.iter().copied())
    }
}
