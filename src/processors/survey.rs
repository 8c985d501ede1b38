//! End-to-end survey processing: load, decompose, aggregate, assemble, write.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::aggregate::{aggregate, Aggregation, AggregationError};
use super::report::{assemble, ReportArtifact};
use crate::config::{validate_sample_count, ConfigError, PipelineConfig, ReportMetadata};
use crate::core::grid::{AngularGrid, GridError};
use crate::core::loaders::{load_measurement_csv, LoaderError, RawMeasurementTable};
use crate::core::writers::{write_artifact, WriteError};
use crate::visualization::{render_position_charts, VisualizationError};

/// Broad class of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller-supplied parameters are invalid; nothing was started
    Input,
    /// The sheet lacks required structure
    Data,
    /// Every position was skipped
    Processing,
    /// Producing the deliverable failed
    Artifact,
}

/// Fatal errors of a survey run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid angular grid: {0}")]
    Grid(#[from] GridError),

    #[error("data error: {0}")]
    Load(#[from] LoaderError),

    #[error("data error: sheet has {rows} angular rows but the sample count is {sample_count}")]
    SampleCountMismatch { rows: usize, sample_count: usize },

    #[error("processing error: {0}")]
    Processing(#[from] AggregationError),

    #[error("failed to write report: {0}")]
    Write(#[from] WriteError),

    #[error("failed to render charts: {0}")]
    Chart(#[from] VisualizationError),
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::Config(_) | PipelineError::Grid(_) => ErrorClass::Input,
            PipelineError::Load(_) | PipelineError::SampleCountMismatch { .. } => ErrorClass::Data,
            PipelineError::Processing(_) => ErrorClass::Processing,
            PipelineError::Write(_) | PipelineError::Chart(_) => ErrorClass::Artifact,
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// In-memory result of analysing one survey sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyAnalysis {
    pub grid: AngularGrid,
    pub aggregation: Aggregation,
    pub artifact: ReportArtifact,
}

/// Result of a full run, including what was written.
#[derive(Debug, Clone)]
pub struct SurveyOutput {
    pub analysis: SurveyAnalysis,
    pub tables: Vec<PathBuf>,
    pub charts: Vec<PathBuf>,
}

/// Sample count to use for `table`: the configured one, or the number of
/// angular rows in the sheet.
///
/// # Errors
///
/// Fails when the count is below the minimum or disagrees with the sheet.
pub fn resolve_sample_count(config: &PipelineConfig, table: &RawMeasurementTable) -> Result<usize> {
    let rows = table.num_angular_rows();
    let sample_count = config.survey.sample_count.unwrap_or(rows);
    validate_sample_count(sample_count)?;

    if sample_count != rows {
        return Err(PipelineError::SampleCountMismatch { rows, sample_count });
    }
    Ok(sample_count)
}

/// Decompose and aggregate a loaded sheet and assemble the report tables.
pub fn analyze(
    table: &RawMeasurementTable,
    config: &PipelineConfig,
    metadata: &ReportMetadata,
) -> Result<SurveyAnalysis> {
    let sample_count = resolve_sample_count(config, table)?;
    let grid = AngularGrid::build(sample_count)?;

    let aggregation = aggregate(table, &grid)?;
    let artifact = assemble(
        &grid,
        &aggregation.records,
        &aggregation.summary,
        &aggregation.temperature,
        metadata,
        &config.output.position_table_prefix,
    );

    Ok(SurveyAnalysis {
        grid,
        aggregation,
        artifact,
    })
}

/// Process the survey sheet at `input` and write the report into `output_dir`.
///
/// Charts go into `output_dir/charts` when enabled in the configuration.
///
/// # Errors
///
/// Returns a [`PipelineError`]; see [`PipelineError::class`] for how it
/// maps onto input, data, processing and artifact failures.
pub fn process_survey(
    input: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
    metadata: &ReportMetadata,
) -> Result<SurveyOutput> {
    config.validate()?;

    let table = load_measurement_csv(input, &config.survey.metadata_rows)?;
    log::info!(
        "{}: {} axial positions, {} angular rows",
        input.display(),
        table.num_positions(),
        table.num_angular_rows()
    );

    let analysis = analyze(&table, config, metadata)?;
    let tables = write_artifact(output_dir, &analysis.artifact, &config.output)?;

    let charts = if config.plots.enabled {
        render_position_charts(
            &output_dir.join("charts"),
            &analysis.aggregation.records,
            &config.plots,
        )?
    } else {
        Vec::new()
    };

    Ok(SurveyOutput {
        analysis,
        tables,
        charts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::MetadataRows;

    fn table(rows: usize, columns: usize) -> RawMeasurementTable {
        RawMeasurementTable {
            headers: (0..=columns).map(|i| format!("H{}", i)).collect(),
            identifiers: (1..=rows as u32).collect(),
            columns: (0..columns)
                .map(|c| (0..rows).map(|r| Some((r * (c + 1)) as f64)).collect())
                .collect(),
            metadata: MetadataRows::default(),
            total_rows: 73,
            source_path: None,
        }
    }

    #[test]
    fn test_sample_count_inferred_from_sheet() {
        let config = PipelineConfig::default();
        assert_eq!(resolve_sample_count(&config, &table(8, 1)).unwrap(), 8);
    }

    #[test]
    fn test_sample_count_mismatch_is_data_error() {
        let mut config = PipelineConfig::default();
        config.survey.sample_count = Some(6);
        let err = resolve_sample_count(&config, &table(8, 1)).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Data);
        assert!(matches!(
            err,
            PipelineError::SampleCountMismatch { rows: 8, sample_count: 6 }
        ));
    }

    #[test]
    fn test_too_few_samples_is_input_error() {
        let err = resolve_sample_count(&PipelineConfig::default(), &table(2, 1)).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Input);
    }

    #[test]
    fn test_analyze_assembles_tables() {
        let analysis = analyze(&table(4, 2), &PipelineConfig::default(), &ReportMetadata::default())
            .unwrap();
        assert_eq!(analysis.grid.sample_count(), 4);
        assert_eq!(
            analysis.artifact.table_names(),
            vec!["Sheet_1", "Sheet_2", "Temperature", "Summary"]
        );
        // Missing metadata rows stay unavailable
        assert_eq!(analysis.aggregation.summary[0].distance, None);
    }
}
