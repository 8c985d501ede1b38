//! Loader for circumferential run-out survey sheets.
//!
//! A survey sheet is the first sheet of the measurement workbook exported as
//! CSV. Its layout:
//! - Header row (display names only, columns are addressed by position)
//! - Column 0: chairpad / angular position number
//! - Columns 1..K: one column per axial position
//! - Angular rows: rows whose identifier is a positive integer
//! - Five metadata rows at fixed offsets (see [`MetadataRowLayout`])

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use thiserror::Error;

use crate::config::MetadataRowLayout;

/// Errors that can occur while loading a survey sheet.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("no rows with a positive integer position number in the identifier column")]
    NoPositionRows,

    #[error("sheet does not have the required metadata rows: need {required} data rows, found {found}")]
    MissingMetadataRows { required: usize, found: usize },

    #[error("no axial position columns found after the identifier column")]
    NoAxialColumns,
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Per-position values from the metadata rows, indexed like the axial columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRows {
    pub distance: Vec<Option<f64>>,
    pub cumulative_distance: Vec<Option<f64>>,
    pub min_temperature: Vec<Option<f64>>,
    pub max_temperature: Vec<Option<f64>>,
    pub avg_temperature: Vec<Option<f64>>,
}

impl MetadataRows {
    /// Distance reading for a 0-based axial column.
    pub fn distance(&self, column: usize) -> Option<f64> {
        lookup(&self.distance, column)
    }

    pub fn cumulative_distance(&self, column: usize) -> Option<f64> {
        lookup(&self.cumulative_distance, column)
    }

    pub fn min_temperature(&self, column: usize) -> Option<f64> {
        lookup(&self.min_temperature, column)
    }

    pub fn max_temperature(&self, column: usize) -> Option<f64> {
        lookup(&self.max_temperature, column)
    }

    pub fn avg_temperature(&self, column: usize) -> Option<f64> {
        lookup(&self.avg_temperature, column)
    }

    /// Temperature spread `max - min`; unavailable unless both readings are.
    pub fn diff_temperature(&self, column: usize) -> Option<f64> {
        Some(self.max_temperature(column)? - self.min_temperature(column)?)
    }
}

fn lookup(row: &[Option<f64>], column: usize) -> Option<f64> {
    row.get(column).copied().flatten()
}

/// Validated survey sheet.
#[derive(Debug, Clone)]
pub struct RawMeasurementTable {
    /// Header names as they appear in the file (column 0 is the identifier).
    pub headers: Vec<String>,
    /// Position numbers of the angular rows, in row order.
    pub identifiers: Vec<u32>,
    /// Angular measurements per axial column. Shape: [num_positions][num_angular_rows].
    pub columns: Vec<Vec<Option<f64>>>,
    /// Distance and temperature readings per axial column.
    pub metadata: MetadataRows,
    /// Number of data rows in the source, before filtering.
    pub total_rows: usize,
    /// Source file path.
    pub source_path: Option<PathBuf>,
}

impl RawMeasurementTable {
    /// Build a table from already split rows.
    ///
    /// `rows` excludes the header. Short rows are treated as having empty
    /// trailing cells.
    pub fn from_rows(
        headers: Vec<String>,
        rows: &[Vec<String>],
        layout: &MetadataRowLayout,
    ) -> Result<Self> {
        let width = rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(headers.len());

        let angular_rows: Vec<(u32, &Vec<String>)> = rows
            .iter()
            .filter_map(|row| {
                let id = row.first().and_then(|cell| parse_position_id(cell))?;
                Some((id, row))
            })
            .collect();

        if angular_rows.is_empty() {
            return Err(LoaderError::NoPositionRows);
        }

        let required = layout.last_row() + 1;
        if rows.len() < required {
            return Err(LoaderError::MissingMetadataRows {
                required,
                found: rows.len(),
            });
        }

        if width < 2 {
            return Err(LoaderError::NoAxialColumns);
        }
        let num_positions = width - 1;

        let columns: Vec<Vec<Option<f64>>> = (1..width)
            .map(|col| {
                angular_rows
                    .iter()
                    .map(|(_, row)| row.get(col).and_then(|cell| parse_cell(cell)))
                    .collect()
            })
            .collect();

        let metadata_row = |index: usize| -> Vec<Option<f64>> {
            (1..width)
                .map(|col| rows[index].get(col).and_then(|cell| parse_cell(cell)))
                .collect()
        };

        let metadata = MetadataRows {
            distance: metadata_row(layout.distance),
            cumulative_distance: metadata_row(layout.cumulative_distance),
            min_temperature: metadata_row(layout.min_temperature),
            max_temperature: metadata_row(layout.max_temperature),
            avg_temperature: metadata_row(layout.avg_temperature),
        };

        log::debug!(
            "survey sheet: {} data rows, {} angular rows, {} axial positions",
            rows.len(),
            angular_rows.len(),
            num_positions
        );

        Ok(Self {
            headers,
            identifiers: angular_rows.iter().map(|(id, _)| *id).collect(),
            columns,
            metadata,
            total_rows: rows.len(),
            source_path: None,
        })
    }

    /// Number of axial positions (columns after the identifier).
    #[inline]
    pub fn num_positions(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows that passed the position-number filter.
    #[inline]
    pub fn num_angular_rows(&self) -> usize {
        self.identifiers.len()
    }

    /// Measured series for a 0-based axial column.
    pub fn column(&self, index: usize) -> Option<&[Option<f64>]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Display name of a 0-based axial column, falling back to its ordinal.
    pub fn column_label(&self, index: usize) -> String {
        self.headers
            .get(index + 1)
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("column {}", index + 1))
    }
}

/// Parse a cell as a finite number. Empty, text and non-finite cells are missing.
pub fn parse_cell(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an identifier cell as a position number (digits only, at least 1).
pub fn parse_position_id(cell: &str) -> Option<u32> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<u32>().ok().filter(|&id| id >= 1)
}

/// Load a survey sheet from any CSV reader.
pub fn load_measurement_reader<R: Read>(
    reader: R,
    layout: &MetadataRowLayout,
) -> Result<RawMeasurementTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            // Spreadsheet exports often start with a byte order mark
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::with_capacity(layout.last_row() + 1);
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<String>>());
    }

    RawMeasurementTable::from_rows(headers, &rows, layout)
}

/// Load a survey sheet from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has no header, has no
/// position rows, is shorter than the metadata layout, or has no axial
/// position columns.
pub fn load_measurement_csv<P: AsRef<Path>>(
    path: P,
    layout: &MetadataRowLayout,
) -> Result<RawMeasurementTable> {
    let path = path.as_ref();
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    let mut table = load_measurement_reader(BufReader::new(file), layout)?;
    table.source_path = Some(path.to_path_buf());
    Ok(table)
}
