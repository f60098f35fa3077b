//! Core data handling for HamSCI Grape1 personal space weather stations.
//!
//! Station files are inventoried from their filenames, loaded into
//! [`station::ObservationSeries`], resampled onto a uniform cadence and
//! smoothed with a zero-phase Butterworth filter. Each step is kept as a
//! labeled stage of a [`station::StationDataset`] so renderers can overlay them.

pub mod fs;
pub mod inventory;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod station;
pub mod telemetry;

pub use prelude::{GrapeError, GrapeResult, PipelineConfig, ProcessingStage};
