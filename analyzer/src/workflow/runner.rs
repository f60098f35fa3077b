use std::path::PathBuf;

use anyhow::Context;
use grapecore::fs::ensure_dir;
use grapecore::inventory::{FileInventory, NodeRegistry};
use grapecore::station::{StageKind, StationDataset};

use crate::report::{write_json, DatasetSummary};
use crate::workflow::config::AnalysisConfig;

pub struct WorkflowResult {
    pub summary: DatasetSummary,
    pub written: Vec<PathBuf>,
}

#[derive(Clone)]
pub struct Runner {
    config: AnalysisConfig,
}

impl Runner {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Build the dataset and write one CSV per stage plus `summary.json`.
    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let config = &self.config;
        let table = config.frequency_table();
        let inventory = FileInventory::build(&config.data_dir, &config.suffix, table.clone())
            .with_context(|| format!("scanning {}", config.data_dir.display()))?;

        let registry = match &config.nodelist {
            Some(path) => {
                let mut registry = NodeRegistry::load(path)
                    .with_context(|| format!("loading node list {}", path.display()))?;
                registry.annotate(&inventory.nodes_with_data());
                Some(registry)
            }
            None => None,
        };

        let request = config.to_request(&table)?;
        let dataset = StationDataset::build(&request, &inventory, registry.as_ref())
            .with_context(|| {
                format!(
                    "building dataset for node {} on {}",
                    config.node, config.frequency
                )
            })?;

        ensure_dir(&config.output, config.clear_output)
            .with_context(|| format!("preparing output {}", config.output.display()))?;

        let mut written = Vec::new();
        for kind in StageKind::ALL {
            let path = config.output.join(format!("{}.csv", kind.name()));
            dataset
                .write_stage_csv(kind, &path)
                .with_context(|| format!("writing {} stage", kind))?;
            written.push(path);
        }

        let summary = DatasetSummary::new(&dataset, inventory.metrics().snapshot());
        let summary_path = config.output.join("summary.json");
        write_json(&summary_path, &summary)?;
        written.push(summary_path);

        log::info!(
            "{}: wrote {} files to {}",
            summary.station.label,
            written.len(),
            config.output.display()
        );
        Ok(WorkflowResult { summary, written })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{write_station_files, GeneratorConfig};

    fn generated(dir: &std::path::Path) -> AnalysisConfig {
        let generator = GeneratorConfig {
            node: 7,
            days: 2,
            span_seconds: 600,
            seed: 5,
            ..Default::default()
        };
        write_station_files(&generator, &dir.join("data")).unwrap();

        let mut cfg = AnalysisConfig::from_args(dir.join("data"), 7, "WWV10");
        cfg.output = dir.join("out");
        cfg
    }

    #[test]
    fn runner_executes_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = generated(dir.path());
        let nodelist = dir.path().join("nodelist.csv");
        std::fs::write(&nodelist, "Node #,Callsign,Latitude,Longitude\n7,KD2UHN,40.74,-74.18\n")
            .unwrap();
        cfg.nodelist = Some(nodelist);

        let result = Runner::new(cfg).execute().unwrap();
        assert_eq!(result.written.len(), 4);
        assert!(result.written.iter().all(|path| path.exists()));
        assert_eq!(result.summary.station.label, "10.0 MHz N0000007 KD2UHN");
        assert_eq!(result.summary.source_files.len(), 2);
        assert_eq!(result.summary.ingest.files_loaded, 2);
        assert_eq!(result.summary.ingest.rows_loaded, 1200);

        let stages = &result.summary.stages;
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0].samples, 1200);
        assert_eq!(stages[1].samples, stages[2].samples);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("out/summary.json")).unwrap())
                .unwrap();
        assert_eq!(json["stages"][2]["kind"], "filtered");
    }

    #[test]
    fn runner_reports_missing_station() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = generated(dir.path());
        cfg.node = 8;

        let err = Runner::new(cfg).execute().err().unwrap();
        assert!(format!("{err:#}").contains("no data files for node 8"));
    }
}
