//! Runs the harmonic decomposition over every axial position of a survey.
//!
//! Positions are processed in column order. A column that cannot be
//! decomposed is recorded as skipped with its reason and the run continues;
//! the run fails only when no position survives.

use thiserror::Error;

use super::harmonic::{decompose, DecompositionError, HarmonicFit, RunOutSeries};
use crate::core::grid::AngularGrid;
use crate::core::loaders::RawMeasurementTable;

/// Errors that end an aggregation run.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("no valid data could be processed: all {skipped} position columns were skipped")]
    NoPositionsProcessed { skipped: usize },
}

/// Distance and temperature readings for one position. `None` is unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionMetadata {
    pub distance: Option<f64>,
    pub cumulative_distance: Option<f64>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub diff_temperature: Option<f64>,
}

/// Everything computed for one processed axial position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRecord {
    /// 1-based axial position (column ordinal).
    pub position: usize,
    /// Column header from the source sheet.
    pub label: String,
    pub run_out: RunOutSeries,
    pub fit: HarmonicFit,
    pub metadata: PositionMetadata,
}

/// One row of the Summary table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryRow {
    pub position: usize,
    pub x: f64,
    pub y: f64,
    pub eccentricity: f64,
    pub phase_angle: f64,
    pub runout: f64,
    pub local_shell_deformation: f64,
    pub distance: Option<f64>,
    pub cumulative_distance: Option<f64>,
}

impl SummaryRow {
    fn from_record(record: &PositionRecord) -> Self {
        Self {
            position: record.position,
            x: record.fit.x,
            y: record.fit.y,
            eccentricity: record.fit.magnitude,
            phase_angle: record.fit.phase_angle,
            runout: record.run_out.max_runout(),
            local_shell_deformation: record.fit.mean_residual,
            distance: record.metadata.distance,
            cumulative_distance: record.metadata.cumulative_distance,
        }
    }
}

/// One row of the Temperature table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureRow {
    pub position: usize,
    pub diff: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

impl TemperatureRow {
    fn from_record(record: &PositionRecord) -> Self {
        Self {
            position: record.position,
            diff: record.metadata.diff_temperature,
            min: record.metadata.min_temperature,
            max: record.metadata.max_temperature,
            avg: record.metadata.avg_temperature,
        }
    }
}

/// Per-column result of an aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionOutcome {
    Processed {
        position: usize,
    },
    Skipped {
        position: usize,
        label: String,
        reason: DecompositionError,
    },
}

impl PositionOutcome {
    pub fn position(&self) -> usize {
        match self {
            PositionOutcome::Processed { position } | PositionOutcome::Skipped { position, .. } => {
                *position
            }
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, PositionOutcome::Skipped { .. })
    }
}

/// Output of [`aggregate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub records: Vec<PositionRecord>,
    pub summary: Vec<SummaryRow>,
    pub temperature: Vec<TemperatureRow>,
    /// One entry per source column, in column order.
    pub outcomes: Vec<PositionOutcome>,
}

impl Aggregation {
    /// Columns that were skipped, with their reasons.
    pub fn skipped(&self) -> impl Iterator<Item = &PositionOutcome> {
        self.outcomes.iter().filter(|o| o.is_skipped())
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }
}

/// Collect the metadata readings for a 0-based axial column.
pub fn position_metadata(table: &RawMeasurementTable, column: usize) -> PositionMetadata {
    let rows = &table.metadata;
    PositionMetadata {
        distance: rows.distance(column),
        cumulative_distance: rows.cumulative_distance(column),
        min_temperature: rows.min_temperature(column),
        max_temperature: rows.max_temperature(column),
        avg_temperature: rows.avg_temperature(column),
        diff_temperature: rows.diff_temperature(column),
    }
}

/// Decompose every axial position of `table` on `grid`.
///
/// # Errors
///
/// Returns [`AggregationError::NoPositionsProcessed`] when every column was
/// skipped.
pub fn aggregate(
    table: &RawMeasurementTable,
    grid: &AngularGrid,
) -> Result<Aggregation, AggregationError> {
    let mut records = Vec::with_capacity(table.num_positions());
    let mut outcomes = Vec::with_capacity(table.num_positions());

    for (column, series) in table.columns.iter().enumerate() {
        let position = column + 1;
        let label = table.column_label(column);

        match decompose(series, grid) {
            Ok(decomposition) => {
                log::debug!(
                    "position {} ({}): eccentricity {:.4} at {:.2} deg",
                    position,
                    label,
                    decomposition.fit.magnitude,
                    decomposition.fit.phase_angle
                );
                records.push(PositionRecord {
                    position,
                    label,
                    run_out: decomposition.run_out,
                    fit: decomposition.fit,
                    metadata: position_metadata(table, column),
                });
                outcomes.push(PositionOutcome::Processed { position });
            }
            Err(reason) => {
                log::warn!("skipping position {} ({}): {}", position, label, reason);
                outcomes.push(PositionOutcome::Skipped {
                    position,
                    label,
                    reason,
                });
            }
        }
    }

    if records.is_empty() {
        return Err(AggregationError::NoPositionsProcessed {
            skipped: outcomes.len(),
        });
    }

    let summary = records.iter().map(SummaryRow::from_record).collect();
    let temperature = records.iter().map(TemperatureRow::from_record).collect();

    log::info!(
        "processed {} of {} positions",
        records.len(),
        outcomes.len()
    );

    Ok(Aggregation {
        records,
        summary,
        temperature,
        outcomes,
    })
}
