use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::inventory::frequency::{same_frequency, FrequencyTable};
use crate::inventory::record::{
    parse_filename, DataQualityError, FileRecord, FilenameOutcome, InventorySpan,
};
use crate::prelude::{GrapeError, GrapeResult, TimeRange};
use crate::telemetry::{IngestMetrics, LogManager};

#[derive(Debug, Clone, PartialEq)]
pub struct DroppedFile {
    pub filename: String,
    pub reason: DataQualityError,
}

/// The station files available in one data directory.
pub struct FileInventory {
    root: PathBuf,
    suffix: String,
    table: FrequencyTable,
    records: Vec<FileRecord>,
    dropped: Vec<DroppedFile>,
    metrics: IngestMetrics,
    logger: LogManager,
}

impl FileInventory {
    /// Scan `directory` (not recursively) for names ending in `suffix`.
    pub fn build(directory: &Path, suffix: &str, table: FrequencyTable) -> GrapeResult<Self> {
        let io_error = |source| GrapeError::Io {
            path: directory.to_path_buf(),
            source,
        };
        let mut names = Vec::new();
        for entry in std::fs::read_dir(directory).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;
            if !entry.file_type().map_err(io_error)?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => log::debug!("skipping non UTF-8 file name {:?}", raw),
            }
        }
        names.sort();

        let mut inventory = Self::from_filenames(names, suffix, table)?;
        inventory.root = directory.to_path_buf();
        Ok(inventory)
    }

    /// Build from bare file names. Names without `suffix` are ignored.
    pub fn from_filenames<I, S>(names: I, suffix: &str, table: FrequencyTable) -> GrapeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inventory = Self {
            root: PathBuf::new(),
            suffix: suffix.to_string(),
            table,
            records: Vec::new(),
            dropped: Vec::new(),
            metrics: IngestMetrics::new(),
            logger: LogManager::new("inventory"),
        };

        for name in names {
            let name = name.as_ref();
            if !name.ends_with(suffix) {
                continue;
            }
            match parse_filename(name, suffix, &inventory.table)? {
                FilenameOutcome::Accepted(record) => {
                    inventory.metrics.record_accepted();
                    inventory.records.push(record);
                }
                FilenameOutcome::Dropped(reason) => {
                    inventory.logger.detail(&format!("dropping {name}: {reason}"));
                    inventory.metrics.record_dropped();
                    inventory.dropped.push(DroppedFile {
                        filename: name.to_string(),
                        reason,
                    });
                }
            }
        }

        inventory
            .records
            .sort_by(|a, b| (a.node_id, a.timestamp).cmp(&(b.node_id, b.timestamp)));
        inventory.logger.record(&format!(
            "{} station files across {} nodes, {} dropped",
            inventory.records.len(),
            inventory.nodes_with_data().len(),
            inventory.dropped.len()
        ));
        Ok(inventory)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn table(&self) -> &FrequencyTable {
        &self.table
    }

    /// Accepted records ordered by node, then timestamp.
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn dropped(&self) -> &[DroppedFile] {
        &self.dropped
    }

    pub fn metrics(&self) -> &IngestMetrics {
        &self.metrics
    }

    pub fn path_of(&self, record: &FileRecord) -> PathBuf {
        self.root.join(&record.filename)
    }

    pub fn nodes_with_data(&self) -> BTreeSet<u32> {
        self.records.iter().map(|record| record.node_id).collect()
    }

    /// Distinct carriers logged by `node`, ascending.
    pub fn frequencies_for(&self, node: u32) -> Vec<f64> {
        let mut frequencies: Vec<f64> = Vec::new();
        for record in self.records.iter().filter(|record| record.node_id == node) {
            if !frequencies
                .iter()
                .any(|&known| same_frequency(known, record.frequency_hz))
            {
                frequencies.push(record.frequency_hz);
            }
        }
        frequencies.sort_by(f64::total_cmp);
        frequencies
    }

    /// Files of `node` on `frequency_hz` whose start time lies in `range`.
    pub fn select(&self, node: u32, frequency_hz: f64, range: &TimeRange) -> Vec<&FileRecord> {
        self.records
            .iter()
            .filter(|record| {
                record.node_id == node
                    && same_frequency(record.frequency_hz, frequency_hz)
                    && range.contains(record.timestamp)
            })
            .collect()
    }

    pub fn spans(&self) -> Vec<InventorySpan> {
        self.records.iter().map(InventorySpan::from).collect()
    }
}
