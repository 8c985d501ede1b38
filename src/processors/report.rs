//! Packages the computed survey into named tables for the report writer.
//!
//! No computation happens here: every value comes straight from a
//! [`PositionRecord`], [`SummaryRow`] or [`TemperatureRow`].

use crate::config::ReportMetadata;
use crate::core::grid::AngularGrid;

use super::aggregate::{PositionRecord, SummaryRow, TemperatureRow};

/// Column headers of a per-position table.
///
/// The two-letter columns hold the projection steps: `AA` theta (rad),
/// `AB`/`AC` cosine/sine projections, `AD` angle difference (rad), `AE` its
/// cosine, `AF` fitted sinusoid, `AG` residual, `AH` centred residual and
/// `AI` reference curve.
pub const POSITION_COLUMNS: [&str; 14] = [
    "Position",
    "Measurement",
    "Data Measured",
    "Distortion",
    "Run Out",
    "AA",
    "AB",
    "AC",
    "AD",
    "AE",
    "AF",
    "AG",
    "AH",
    "AI",
];

pub const SUMMARY_COLUMNS: [&str; 9] = [
    "Position",
    "X",
    "Y",
    "Eccentricity (mm)",
    "Phase Angle",
    "Runout",
    "Local Shell Deformation",
    "Distance",
    "Cumulative Distance",
];

pub const TEMPERATURE_COLUMNS: [&str; 5] = ["Position", "Diff", "Min", "Max", "AVG"];

pub const TEMPERATURE_TABLE: &str = "Temperature";
pub const SUMMARY_TABLE: &str = "Summary";

/// A single table cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Index(usize),
    Number(f64),
    /// Value not available in the source sheet
    Missing,
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Missing, Cell::Number)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Named table with a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    fn new(name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Values of the column named `header`.
    pub fn column(&self, header: &str) -> Option<Vec<Cell>> {
        let idx = self.headers.iter().position(|h| h == header)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }
}

/// Deliverable handed to the persistence and reporting side.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    pub metadata: ReportMetadata,
    /// Per-position tables, then Temperature, then Summary.
    pub tables: Vec<Table>,
}

impl ReportArtifact {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Build the per-position table of one record.
pub fn position_table(name: impl Into<String>, record: &PositionRecord, grid: &AngularGrid) -> Table {
    let mut table = Table::new(name, &POSITION_COLUMNS);
    let fit = &record.fit;

    for (k, (position, angle)) in grid.iter().enumerate() {
        table.rows.push(vec![
            Cell::Index(position),
            Cell::Number(angle),
            record.run_out.measured[k].into(),
            fit.distortion[k].into(),
            record.run_out.values[k].into(),
            fit.theta[k].into(),
            fit.cos_projection[k].into(),
            fit.sin_projection[k].into(),
            fit.angle_diff[k].into(),
            fit.cos_angle_diff[k].into(),
            fit.reference_component[k].into(),
            fit.residual[k].into(),
            fit.distortion[k].into(),
            fit.reference_curve[k].into(),
        ]);
    }

    table
}

pub fn summary_table(summary: &[SummaryRow]) -> Table {
    let mut table = Table::new(SUMMARY_TABLE, &SUMMARY_COLUMNS);
    for row in summary {
        table.rows.push(vec![
            Cell::Index(row.position),
            row.x.into(),
            row.y.into(),
            row.eccentricity.into(),
            row.phase_angle.into(),
            row.runout.into(),
            row.local_shell_deformation.into(),
            row.distance.into(),
            row.cumulative_distance.into(),
        ]);
    }
    table
}

pub fn temperature_table(temperature: &[TemperatureRow]) -> Table {
    let mut table = Table::new(TEMPERATURE_TABLE, &TEMPERATURE_COLUMNS);
    for row in temperature {
        table.rows.push(vec![
            Cell::Index(row.position),
            row.diff.into(),
            row.min.into(),
            row.max.into(),
            row.avg.into(),
        ]);
    }
    table
}

/// Assemble the report artifact.
///
/// Position tables are named `<prefix><position>` so a skipped column leaves
/// a gap in the numbering.
pub fn assemble(
    grid: &AngularGrid,
    records: &[PositionRecord],
    summary: &[SummaryRow],
    temperature: &[TemperatureRow],
    metadata: &ReportMetadata,
    table_prefix: &str,
) -> ReportArtifact {
    let mut tables: Vec<Table> = records
        .iter()
        .map(|record| position_table(format!("{}{}", table_prefix, record.position), record, grid))
        .collect();
    tables.push(temperature_table(temperature));
    tables.push(summary_table(summary));

    ReportArtifact {
        metadata: metadata.clone(),
        tables,
    }
}
