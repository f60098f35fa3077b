use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use grapecore::inventory::FrequencyTable;
use grapecore::prelude::{PipelineConfig, TimeRange};
use grapecore::station::time::parse_timestamp;
use grapecore::station::DatasetRequest;
use serde::{Deserialize, Serialize};

fn default_suffix() -> String {
    ".csv".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("output")
}

/// One station analysis, as read from YAML or assembled from the command line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub data_dir: PathBuf,
    pub node: u32,
    /// Table label such as `WWV10`, or a carrier in Hz.
    pub frequency: String,
    #[serde(default = "default_suffix")]
    pub suffix: String,
    #[serde(default)]
    pub nodelist: Option<PathBuf>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub callsign: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub clear_output: bool,
    /// Labels added to the built-in frequency table.
    #[serde(default)]
    pub frequencies: BTreeMap<String, f64>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl AnalysisConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading analysis config {}", path_ref.display()))?;
        let config: AnalysisConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing analysis config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(data_dir: PathBuf, node: u32, frequency: &str) -> Self {
        Self {
            data_dir,
            node,
            frequency: frequency.to_string(),
            suffix: default_suffix(),
            nodelist: None,
            start: None,
            end: None,
            callsign: None,
            latitude: None,
            longitude: None,
            output: default_output(),
            clear_output: false,
            frequencies: BTreeMap::new(),
            pipeline: PipelineConfig::default(),
        }
    }

    pub fn frequency_table(&self) -> FrequencyTable {
        let mut table = FrequencyTable::default();
        table.extend(self.frequencies.clone());
        table
    }

    pub fn frequency_hz(&self, table: &FrequencyTable) -> anyhow::Result<f64> {
        table
            .resolve(&self.frequency)
            .ok_or_else(|| anyhow!("unknown frequency label {:?}", self.frequency))
    }

    pub fn time_range(&self) -> anyhow::Result<TimeRange> {
        let parse = |value: &Option<String>, name: &str| -> anyhow::Result<_> {
            value
                .as_deref()
                .map(|text| {
                    parse_timestamp(text).ok_or_else(|| anyhow!("cannot parse {name} time {text:?}"))
                })
                .transpose()
        };
        Ok(TimeRange::new(
            parse(&self.start, "start")?,
            parse(&self.end, "end")?,
        ))
    }

    pub fn to_request(&self, table: &FrequencyTable) -> anyhow::Result<DatasetRequest> {
        let mut request = DatasetRequest::new(self.node, self.frequency_hz(table)?)
            .with_range(self.time_range()?)
            .with_pipeline(self.pipeline.clone());
        request.callsign = self.callsign.clone();
        request.latitude = self.latitude;
        request.longitude = self.longitude;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapecore::processing::{BandType, CutoffPeriods};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_resolves_request() {
        let cfg = AnalysisConfig::from_args(PathBuf::from("data"), 7, "WWV10");
        let request = cfg.to_request(&cfg.frequency_table()).unwrap();
        assert_eq!(request.frequency_hz, 10e6);
        assert_eq!(request.range, TimeRange::all());
        assert_eq!(request.pipeline, PipelineConfig::default());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"data_dir: data\n\
              node: 13\n\
              frequency: RWM5\n\
              start: 2021-10-25T00:00:00Z\n\
              frequencies:\n  RWM5: 4996000.0\n\
              pipeline:\n  cadence_seconds: 2.0\n  filter:\n    order: 4\n    tc_min: [10.0, 3.0]\n    band: bandpass\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = AnalysisConfig::load(&path).unwrap();

        assert_eq!(cfg.suffix, ".csv");
        assert_eq!(cfg.pipeline.cadence_seconds, 2.0);
        assert_eq!(cfg.pipeline.filter.order, 4);
        assert_eq!(cfg.pipeline.filter.band, BandType::Bandpass);
        assert_eq!(cfg.pipeline.filter.tc_min, CutoffPeriods::Band([10.0, 3.0]));

        let request = cfg.to_request(&cfg.frequency_table()).unwrap();
        assert_eq!(request.frequency_hz, 4.996e6);
        assert!(request.range.start.is_some());
        assert!(request.range.end.is_none());
    }

    #[test]
    fn unknown_labels_and_bad_times_are_reported() {
        let mut cfg = AnalysisConfig::from_args(PathBuf::from("data"), 7, "G1");
        assert!(cfg.to_request(&cfg.frequency_table()).is_err());

        cfg.frequency = "WWV5".to_string();
        cfg.end = Some("tomorrow".to_string());
        let err = cfg.time_range().unwrap_err();
        assert!(err.to_string().contains("end"));
    }
}
