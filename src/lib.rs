//! Run-out survey processing for kiln shells, rollers and shafts.
//!
//! This crate provides tools for:
//! - Loading circumferential measurement sheets (one column per axial position)
//! - Splitting each position's run-out into eccentricity and shell distortion
//!   with a first-harmonic fit
//! - Building the per-position, Summary and Temperature tables of the report
//! - Rendering radar and run-out profile charts
//!
//! # Example
//!
//! ```no_run
//! use shell_runout::{config::ReportMetadata, processors::process_survey, PipelineConfig};
//! use std::path::Path;
//!
//! let output = process_survey(
//!     Path::new("survey.csv"),
//!     Path::new("report"),
//!     &PipelineConfig::default(),
//!     &ReportMetadata::default(),
//! )
//! .unwrap();
//! println!("{} positions", output.analysis.aggregation.records.len());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{MetadataRowLayout, OutputConfig, PipelineConfig, PlotConfig, ReportMetadata, SurveyConfig};
pub use crate::core::grid::AngularGrid;
pub use crate::core::loaders::RawMeasurementTable;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
