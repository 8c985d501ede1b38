//! Configuration types for the run-out survey pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Smallest sample count that supports a first-harmonic fit and a radar chart.
pub const MIN_SAMPLE_COUNT: usize = 3;

/// Errors raised for structurally invalid caller-supplied parameters.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("sample count must be at least {min}, got {got}")]
    SampleCountTooSmall { got: usize, min: usize },

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Row offsets (0-based, below the header) of the five metadata rows.
///
/// Survey sheets carry distance and temperature readings for each axial
/// position in fixed rows underneath the angular measurements. Changing these
/// offsets changes what the Summary and Temperature tables report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRowLayout {
    pub distance: usize,
    pub cumulative_distance: usize,
    pub min_temperature: usize,
    pub max_temperature: usize,
    pub avg_temperature: usize,
}

impl MetadataRowLayout {
    /// Layout of the standard survey sheet (rows 68 to 72).
    pub const STANDARD: MetadataRowLayout = MetadataRowLayout {
        distance: 68,
        cumulative_distance: 69,
        min_temperature: 70,
        max_temperature: 71,
        avg_temperature: 72,
    };

    /// All five offsets in declaration order.
    pub fn rows(&self) -> [usize; 5] {
        [
            self.distance,
            self.cumulative_distance,
            self.min_temperature,
            self.max_temperature,
            self.avg_temperature,
        ]
    }

    /// Highest row index the layout touches.
    pub fn last_row(&self) -> usize {
        self.rows().into_iter().max().unwrap_or(0)
    }
}

impl Default for MetadataRowLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Parameters of the measurement survey itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// Number of angular samples per revolution. Inferred from the table when unset.
    #[serde(default)]
    pub sample_count: Option<usize>,

    /// Where the distance/temperature rows live in the sheet
    #[serde(default)]
    pub metadata_rows: MetadataRowLayout,
}

/// Configuration for the written tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Text written in place of unavailable values
    #[serde(default = "default_missing_marker")]
    pub missing_marker: String,

    /// Fixed number of decimals for floating point cells (full precision when unset)
    #[serde(default)]
    pub precision: Option<usize>,

    /// Prefix of the per-position table names
    #[serde(default = "default_position_table_prefix")]
    pub position_table_prefix: String,
}

fn default_missing_marker() -> String {
    "N/A".to_string()
}

fn default_position_table_prefix() -> String {
    "Sheet_".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            missing_marker: default_missing_marker(),
            precision: None,
            position_table_prefix: default_position_table_prefix(),
        }
    }
}

/// Configuration for chart rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Render radar and profile charts for every processed position
    #[serde(default)]
    pub enabled: bool,

    /// Maximum number of samples shown on the radar chart
    #[serde(default)]
    pub radar_positions: Option<usize>,

    /// Image width in pixels
    #[serde(default = "default_plot_width")]
    pub width: u32,

    /// Image height in pixels
    #[serde(default = "default_plot_height")]
    pub height: u32,
}

fn default_plot_width() -> u32 {
    1050
}

fn default_plot_height() -> u32 {
    1050
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            radar_positions: None,
            width: default_plot_width(),
            height: default_plot_height(),
        }
    }
}

/// Descriptive report fields. Forwarded to the artifact, never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    #[serde(default)]
    pub company: String,

    #[serde(default)]
    pub equipment: String,

    /// Capacity / feed rate as entered by the surveyor
    #[serde(default)]
    pub capacity: String,

    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub measured_position: String,

    /// Positions whose report page uses the girth-gear drawing
    #[serde(default)]
    pub gg_positions: Vec<usize>,
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub survey: SurveyConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub plots: PlotConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(n) = self.survey.sample_count {
            validate_sample_count(n)?;
        }

        let mut rows = self.survey.metadata_rows.rows().to_vec();
        rows.sort_unstable();
        rows.dedup();
        if rows.len() != 5 {
            return Err(ConfigError::InvalidValue {
                field: "survey.metadata_rows",
                reason: "metadata rows must be five distinct offsets".to_string(),
            });
        }

        if self.plots.width == 0 || self.plots.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "plots",
                reason: format!(
                    "chart size must be non-zero, got {}x{}",
                    self.plots.width, self.plots.height
                ),
            });
        }

        if self.plots.radar_positions == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "plots.radar_positions",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Check a sample count against [`MIN_SAMPLE_COUNT`].
pub fn validate_sample_count(n: usize) -> Result<(), ConfigError> {
    if n < MIN_SAMPLE_COUNT {
        return Err(ConfigError::SampleCountTooSmall {
            got: n,
            min: MIN_SAMPLE_COUNT,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_pipeline_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.survey.sample_count, None);
        assert_eq!(config.survey.metadata_rows, MetadataRowLayout::STANDARD);
        assert_eq!(config.output.missing_marker, "N/A");
        assert_eq!(config.output.position_table_prefix, "Sheet_");
        assert!(!config.plots.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_standard_layout_rows() {
        let layout = MetadataRowLayout::STANDARD;
        assert_eq!(layout.rows(), [68, 69, 70, 71, 72]);
        assert_eq!(layout.last_row(), 72);
    }

    #[test]
    fn test_sample_count_validation() {
        assert!(validate_sample_count(3).is_ok());
        assert!(matches!(
            validate_sample_count(2),
            Err(ConfigError::SampleCountTooSmall { got: 2, min: 3 })
        ));

        let mut config = PipelineConfig::default();
        config.survey.sample_count = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_metadata_rows_rejected() {
        let mut config = PipelineConfig::default();
        config.survey.metadata_rows.avg_temperature = 68;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "survey.metadata_rows", .. })
        ));
    }

    #[test]
    fn test_zero_radar_positions_rejected() {
        let mut config = PipelineConfig::default();
        config.plots.radar_positions = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_round_trip_keeps_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = PipelineConfig::default();
        config.survey.sample_count = Some(24);
        config.output.precision = Some(3);
        config.to_yaml(&path).unwrap();

        let loaded = PipelineConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded.survey.sample_count, Some(24));
        assert_eq!(loaded.output.precision, Some(3));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: PipelineConfig = serde_yaml::from_str("survey:\n  sample_count: 16\n").unwrap();
        assert_eq!(config.survey.sample_count, Some(16));
        assert_eq!(config.survey.metadata_rows, MetadataRowLayout::STANDARD);
        assert_eq!(config.plots.width, 1050);
    }
}
