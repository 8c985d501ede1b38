//! Core data types and I/O operations.

pub mod grid;
pub mod loaders;
pub mod writers;

pub use grid::{AngularGrid, GridError};
pub use loaders::{load_measurement_csv, LoaderError, RawMeasurementTable};
pub use writers::{write_artifact, WriteError};
