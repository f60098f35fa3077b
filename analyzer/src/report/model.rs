use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use grapecore::inventory::{FileInventory, InventorySpan, StatusRow};
use grapecore::math::StatsHelper;
use grapecore::station::{parameter_label, Stage, StageKind, StationDataset, StationMeta};
use grapecore::telemetry::IngestSnapshot;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub label: String,
    pub mean: Option<f64>,
    pub rms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub kind: StageKind,
    pub label: String,
    pub samples: usize,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub columns: Vec<ColumnSummary>,
}

impl StageSummary {
    pub fn new(kind: StageKind, stage: &Stage) -> Self {
        let series = stage.series();
        Self {
            kind,
            label: stage.label().to_string(),
            samples: series.len(),
            start: series.start(),
            end: series.end(),
            columns: series
                .columns()
                .iter()
                .map(|column| ColumnSummary {
                    name: column.name.clone(),
                    label: parameter_label(&column.name).to_string(),
                    mean: StatsHelper::mean(&column.values),
                    rms: StatsHelper::rms(&column.values),
                })
                .collect(),
        }
    }
}

/// Written next to the stage CSV files after an analysis.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub station: StationMeta,
    pub source_files: Vec<String>,
    pub ingest: IngestSnapshot,
    pub stages: Vec<StageSummary>,
}

impl DatasetSummary {
    pub fn new(dataset: &StationDataset, ingest: IngestSnapshot) -> Self {
        Self {
            station: dataset.meta().clone(),
            source_files: dataset.source_files().to_vec(),
            ingest,
            stages: dataset
                .stages()
                .map(|(kind, stage)| StageSummary::new(kind, stage))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DroppedEntry {
    pub filename: String,
    pub reason: String,
}

/// Timeline-ready view of a data directory.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    pub root: String,
    pub nodes: BTreeMap<u32, Vec<f64>>,
    pub spans: Vec<InventorySpan>,
    pub dropped: Vec<DroppedEntry>,
    pub ingest: IngestSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<StatusRow>>,
}

impl InventoryReport {
    pub fn new(inventory: &FileInventory, statuses: Option<Vec<StatusRow>>) -> Self {
        Self {
            root: inventory.root().display().to_string(),
            nodes: inventory
                .nodes_with_data()
                .into_iter()
                .map(|node| (node, inventory.frequencies_for(node)))
                .collect(),
            spans: inventory.spans(),
            dropped: inventory
                .dropped()
                .iter()
                .map(|dropped| DroppedEntry {
                    filename: dropped.filename.clone(),
                    reason: dropped.reason.to_string(),
                })
                .collect(),
            ingest: inventory.metrics().snapshot(),
            statuses,
        }
    }
}
