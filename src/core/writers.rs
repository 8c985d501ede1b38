//! Writers for the report artifact.
//!
//! The artifact is persisted as a directory standing in for a multi-sheet
//! workbook:
//! - one CSV file per table, named after the table (`Sheet_1.csv`, ...,
//!   `Temperature.csv`, `Summary.csv`)
//! - `report.yaml` with the descriptive report fields

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{OutputConfig, ReportMetadata};
use crate::processors::report::{Cell, ReportArtifact, Table};

/// File name of the forwarded report metadata.
pub const REPORT_METADATA_FILE: &str = "report.yaml";

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create the output directory.
    #[error("failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// YAML serialization error.
    #[error("YAML write error for '{path}': {source}")]
    YamlError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A row does not match its table's header.
    #[error("table '{table}' row {row} has {found} cells, header has {expected}")]
    RaggedTable {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates a directory and its parents if they don't exist.
fn ensure_dir(path: &Path) -> Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        fs::create_dir_all(path).map_err(|e| WriteError::CreateDirectory {
            path: path.display().to_string(),
            source: e,
        })?;
    }
    Ok(())
}

/// Creates a buffered writer for the given path.
fn create_buffered_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

/// Render a cell as CSV text.
pub fn format_cell(cell: &Cell, config: &OutputConfig) -> String {
    match *cell {
        Cell::Index(i) => i.to_string(),
        Cell::Number(v) => match config.precision {
            Some(p) => format!("{:.*}", p, v),
            None => v.to_string(),
        },
        Cell::Missing => config.missing_marker.clone(),
    }
}

/// Write one table as CSV with its header row.
///
/// # Errors
///
/// Returns an error if a row is ragged or the file cannot be created or
/// written to.
pub fn write_table_csv(path: &Path, table: &Table, config: &OutputConfig) -> Result<()> {
    if let Some((row, cells)) = table
        .rows
        .iter()
        .enumerate()
        .find(|(_, cells)| cells.len() != table.headers.len())
    {
        return Err(WriteError::RaggedTable {
            table: table.name.clone(),
            row,
            expected: table.headers.len(),
            found: cells.len(),
        });
    }

    let buf_writer = create_buffered_writer(path)?;
    let mut csv_writer = csv::Writer::from_writer(buf_writer);
    let path_str = path.display().to_string();

    csv_writer
        .write_record(&table.headers)
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    for cells in &table.rows {
        csv_writer
            .write_record(cells.iter().map(|c| format_cell(c, config)))
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write the descriptive report fields as YAML.
pub fn write_report_metadata(path: &Path, metadata: &ReportMetadata) -> Result<()> {
    let mut writer = create_buffered_writer(path)?;
    let path_str = path.display().to_string();

    serde_yaml::to_writer(&mut writer, metadata).map_err(|e| WriteError::YamlError {
        path: path_str.clone(),
        source: e,
    })?;

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })
}

/// Write every table of `artifact` into `dir`, plus the report metadata.
///
/// Returns the written paths in artifact order, metadata last.
///
/// # Example
///
/// ```no_run
/// use shell_runout::config::{OutputConfig, ReportMetadata};
/// use shell_runout::core::writers::write_artifact;
/// use shell_runout::processors::report::ReportArtifact;
/// use std::path::Path;
///
/// let artifact = ReportArtifact { metadata: ReportMetadata::default(), tables: Vec::new() };
/// write_artifact(Path::new("report"), &artifact, &OutputConfig::default()).unwrap();
/// ```
pub fn write_artifact(
    dir: &Path,
    artifact: &ReportArtifact,
    config: &OutputConfig,
) -> Result<Vec<PathBuf>> {
    ensure_dir(dir)?;

    let mut written = Vec::with_capacity(artifact.tables.len() + 1);
    for table in &artifact.tables {
        let path = dir.join(format!("{}.csv", table.name));
        write_table_csv(&path, table, config)?;
        written.push(path);
    }

    let meta_path = dir.join(REPORT_METADATA_FILE);
    write_report_metadata(&meta_path, &artifact.metadata)?;
    written.push(meta_path);

    log::info!("wrote {} files to {}", written.len(), dir.display());
    Ok(written)
}
