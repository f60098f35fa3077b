use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::inventory::{FileInventory, NodeRegistry};
use crate::prelude::{GrapeError, GrapeResult, PipelineConfig, ProcessingStage, TimeRange};
use crate::processing::{FilterStage, FilterState, PowerStage, Resampler};
use crate::station::loader::load_observations;
use crate::station::series::ObservationSeries;
use crate::telemetry::LogManager;

pub const RAW_LABEL: &str = "Raw Data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Raw,
    Resampled,
    Filtered,
}

impl StageKind {
    pub const ALL: [StageKind; 3] = [StageKind::Raw, StageKind::Resampled, StageKind::Filtered];

    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Raw => "raw",
            StageKind::Resampled => "resampled",
            StageKind::Filtered => "filtered",
        }
    }

    /// The stage this one is produced from.
    pub fn predecessor(&self) -> Option<StageKind> {
        match self {
            StageKind::Raw => None,
            StageKind::Resampled => Some(StageKind::Raw),
            StageKind::Filtered => Some(StageKind::Resampled),
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    series: ObservationSeries,
    label: String,
}

impl Stage {
    pub fn series(&self) -> &ObservationSeries {
        &self.series
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// What a renderer needs to draw one stage.
#[derive(Debug, Clone, Copy)]
pub struct StageFrame<'a> {
    pub title: &'a str,
    pub label: &'a str,
    pub series: &'a ObservationSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationMeta {
    pub node: u32,
    pub frequency_hz: f64,
    pub label: String,
    pub callsign: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl StationMeta {
    pub fn new(node: u32, frequency_hz: f64, callsign: &str) -> Self {
        Self {
            node,
            frequency_hz,
            label: station_label(node, frequency_hz, callsign),
            callsign: callsign.to_string(),
            latitude: None,
            longitude: None,
        }
    }
}

/// `10.0 MHz N0000007 KD2UHN`
pub fn station_label(node: u32, frequency_hz: f64, callsign: &str) -> String {
    format!("{:.1} MHz N{:07} {}", frequency_hz / 1e6, node, callsign)
        .trim_end()
        .to_string()
}

/// Which station, carrier and window to analyze, and how.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRequest {
    pub node: u32,
    pub frequency_hz: f64,
    pub range: TimeRange,
    pub callsign: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub pipeline: PipelineConfig,
}

impl DatasetRequest {
    pub fn new(node: u32, frequency_hz: f64) -> Self {
        Self {
            node,
            frequency_hz,
            range: TimeRange::all(),
            callsign: None,
            latitude: None,
            longitude: None,
            pipeline: PipelineConfig::default(),
        }
    }

    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_callsign(mut self, callsign: &str) -> Self {
        self.callsign = Some(callsign.to_string());
        self
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Request fields win over registry fields.
    fn meta(&self, registry: Option<&NodeRegistry>) -> StationMeta {
        let known = registry.and_then(|registry| registry.get(self.node));
        let callsign = self
            .callsign
            .clone()
            .or_else(|| known.map(|node| node.callsign.clone()))
            .unwrap_or_default();

        let mut meta = StationMeta::new(self.node, self.frequency_hz, &callsign);
        meta.latitude = self.latitude.or_else(|| known.and_then(|node| node.latitude));
        meta.longitude = self.longitude.or_else(|| known.and_then(|node| node.longitude));
        meta
    }
}

/// Labeled processing stages of one station on one carrier.
#[derive(Debug, Clone)]
pub struct StationDataset {
    meta: StationMeta,
    stages: BTreeMap<StageKind, Stage>,
    source_files: Vec<String>,
}

impl StationDataset {
    pub fn new(meta: StationMeta) -> Self {
        Self {
            meta,
            stages: BTreeMap::new(),
            source_files: Vec::new(),
        }
    }

    /// Select, load, resample, derive power and filter.
    pub fn build(
        request: &DatasetRequest,
        inventory: &FileInventory,
        registry: Option<&NodeRegistry>,
    ) -> GrapeResult<Self> {
        let logger = LogManager::new("dataset");
        let pipeline = &request.pipeline;

        let cadence = pipeline.cadence()?;
        let resampler = Resampler::new(cadence, pipeline.boundary)?;
        let power = PowerStage::new(pipeline.power_floor_db)?;
        let filter = FilterStage::new(pipeline.filter.clone(), pipeline.params.clone())?;
        FilterState::design(&pipeline.filter, 1.0 / pipeline.cadence_seconds)?;

        let records = inventory.select(request.node, request.frequency_hz, &request.range);
        if records.is_empty() {
            return Err(GrapeError::NoDataFound {
                node: request.node,
                frequency_hz: request.frequency_hz,
                range: request.range,
            });
        }

        let in_context = |source: GrapeError| GrapeError::Pipeline {
            node: request.node,
            frequency_hz: request.frequency_hz,
            range: request.range,
            source: Box::new(source),
        };
        let (raw, populated) =
            load_observations(inventory, &records, request.frequency_hz).map_err(in_context)?;
        if raw.is_empty() {
            return Err(GrapeError::EmptyData {
                node: request.node,
                frequency_hz: request.frequency_hz,
                range: request.range,
                files: records.len(),
            });
        }

        let mut dataset = Self::new(request.meta(registry));
        dataset.source_files = records.iter().map(|record| record.filename.clone()).collect();
        logger.record(&format!(
            "{}: {} rows from {} of {} files",
            dataset.meta.label,
            raw.len(),
            populated,
            records.len()
        ));

        dataset.insert_stage(StageKind::Raw, raw, RAW_LABEL)?;

        let resampled = resampler
            .execute(dataset.series(StageKind::Raw)?)
            .and_then(|resampled| power.execute(&resampled))
            .map_err(in_context)?;
        dataset.insert_stage(StageKind::Resampled, resampled, &resampler.label())?;

        let filtered = filter
            .execute(dataset.series(StageKind::Resampled)?)
            .map_err(in_context)?;
        dataset.insert_stage(StageKind::Filtered, filtered, &filter.label())?;

        Ok(dataset)
    }

    /// Store a stage once, after its predecessor.
    pub fn insert_stage(
        &mut self,
        kind: StageKind,
        series: ObservationSeries,
        label: &str,
    ) -> GrapeResult<()> {
        if self.stages.contains_key(&kind) {
            return Err(GrapeError::StageExists(kind.name().to_string()));
        }
        if let Some(previous) = kind.predecessor() {
            if !self.stages.contains_key(&previous) {
                return Err(GrapeError::MissingStage {
                    stage: kind.name().to_string(),
                    requires: previous.name().to_string(),
                });
            }
        }
        self.stages.insert(
            kind,
            Stage {
                series,
                label: label.to_string(),
            },
        );
        Ok(())
    }

    pub fn meta(&self) -> &StationMeta {
        &self.meta
    }

    pub fn source_files(&self) -> &[String] {
        &self.source_files
    }

    pub fn stage(&self, kind: StageKind) -> Option<&Stage> {
        self.stages.get(&kind)
    }

    pub fn stages(&self) -> impl Iterator<Item = (StageKind, &Stage)> {
        self.stages.iter().map(|(&kind, stage)| (kind, stage))
    }

    pub fn frame(&self, kind: StageKind) -> Option<StageFrame<'_>> {
        self.stage(kind).map(|stage| StageFrame {
            title: &self.meta.label,
            label: &stage.label,
            series: &stage.series,
        })
    }

    pub fn write_stage_csv(&self, kind: StageKind, path: &Path) -> GrapeResult<()> {
        self.series(kind)?.write_csv(path)
    }

    fn series(&self, kind: StageKind) -> GrapeResult<&ObservationSeries> {
        self.stage(kind)
            .map(Stage::series)
            .ok_or_else(|| GrapeError::InvalidSeries(format!("stage {kind} has not been built")))
    }
}
