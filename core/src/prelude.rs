use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::processing::filter::FilterSpec;
use crate::processing::resample::BoundaryPolicy;
use crate::station::series::{ObservationSeries, FREQ, POWER_DB, VPK};
use crate::station::time::{duration_from_seconds, format_timestamp};

/// Shared configuration for the resample -> power -> filter pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cadence_seconds: f64,
    pub boundary: BoundaryPolicy,
    pub filter: FilterSpec,
    /// Columns of the resampled stage that get filtered.
    pub params: Vec<String>,
    /// Floor applied to `Power_dB` when `Vpk` is not positive. `None` rejects such samples.
    pub power_floor_db: Option<f64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cadence_seconds: 1.0,
            boundary: BoundaryPolicy::default(),
            filter: FilterSpec::default(),
            params: vec![FREQ.to_string(), VPK.to_string(), POWER_DB.to_string()],
            power_floor_db: None,
        }
    }
}

impl PipelineConfig {
    pub fn cadence(&self) -> GrapeResult<Duration> {
        duration_from_seconds(self.cadence_seconds).ok_or_else(|| {
            GrapeError::InvalidConfig(format!(
                "resample cadence must be a positive number of seconds, got {}",
                self.cadence_seconds
            ))
        })
    }
}

/// Half-open `[start, end)` selection window. Missing bounds are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| instant >= start)
            && self.end.map_or(true, |end| instant < end)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self
            .start
            .map(format_timestamp)
            .unwrap_or_else(|| "earliest".to_string());
        let end = self
            .end
            .map(format_timestamp)
            .unwrap_or_else(|| "latest".to_string());
        write!(f, "[{start}, {end})")
    }
}

/// Common error type for the Grape1 core.
#[derive(thiserror::Error, Debug)]
pub enum GrapeError {
    #[error("invalid series: {0}")]
    InvalidSeries(String),
    #[error("invalid filter spec: {0}")]
    InvalidFilterSpec(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("no data files for node {node} at {frequency_hz} Hz in {range}")]
    NoDataFound {
        node: u32,
        frequency_hz: f64,
        range: TimeRange,
    },
    #[error("{files} file(s) matched node {node} at {frequency_hz} Hz in {range} but none held observations")]
    EmptyData {
        node: u32,
        frequency_hz: f64,
        range: TimeRange,
        files: usize,
    },
    #[error("processing node {node} at {frequency_hz} Hz in {range} failed")]
    Pipeline {
        node: u32,
        frequency_hz: f64,
        range: TimeRange,
        #[source]
        source: Box<GrapeError>,
    },
    #[error("invalid node tag {tag:?} in {context}")]
    InvalidNodeTag { context: String, tag: String },
    #[error("invalid timestamp {value:?} in {context}")]
    InvalidTimestamp { context: String, value: String },
    #[error("missing column {column:?} in {context}")]
    MissingColumn { context: String, column: String },
    #[error("invalid {column} value {value:?} in {context}")]
    InvalidValue {
        context: String,
        column: String,
        value: String,
    },
    #[error("stage {0} already exists")]
    StageExists(String),
    #[error("stage {stage} requires stage {requires}")]
    MissingStage { stage: String, requires: String },
    #[error("i/o failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv failure in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("cannot prepare directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type GrapeResult<T> = Result<T, GrapeError>;

/// A step that turns one stage of a series into the next.
pub trait ProcessingStage {
    /// Display label attached to the produced stage.
    fn label(&self) -> String;
    fn execute(&self, input: &ObservationSeries) -> GrapeResult<ObservationSeries>;
}
