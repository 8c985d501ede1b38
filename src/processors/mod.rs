//! Survey processing modules.

pub mod aggregate;
pub mod harmonic;
pub mod report;
pub mod survey;

// Re-export key types for convenience
pub use aggregate::{
    aggregate, Aggregation, AggregationError, PositionMetadata, PositionOutcome, PositionRecord,
    SummaryRow, TemperatureRow,
};
pub use harmonic::{decompose, phase_angle, Decomposition, DecompositionError, HarmonicFit, RunOutSeries};
pub use report::{assemble, Cell, ReportArtifact, Table};
pub use survey::{analyze, process_survey, ErrorClass, PipelineError, SurveyAnalysis, SurveyOutput};
