use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Frequencies closer than this are the same carrier.
pub const FREQUENCY_TOLERANCE_HZ: f64 = 0.5;

/// Frequency labels used in Grape1 filenames, mapped to the carrier in Hz.
///
/// `Unknown` maps to 0 Hz. Labels outside the table still resolve when they
/// are plain non-negative numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable {
    labels: BTreeMap<String, f64>,
}

impl Default for FrequencyTable {
    fn default() -> Self {
        let labels = [
            ("WWV2p5", 2.5e6),
            ("WWV5", 5e6),
            ("WWV10", 10e6),
            ("WWV15", 15e6),
            ("CHU3", 3.33e6),
            ("CHU7", 7.85e6),
            ("CHU14", 14.67e6),
            ("Unknown", 0.0),
        ]
        .into_iter()
        .map(|(label, hz)| (label.to_string(), hz))
        .collect();
        Self { labels }
    }
}

impl FrequencyTable {
    pub fn empty() -> Self {
        Self {
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: &str, hz: f64) -> Self {
        self.labels.insert(label.to_string(), hz);
        self
    }

    /// Add or override labels.
    pub fn extend<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        self.labels.extend(entries);
    }

    pub fn resolve(&self, label: &str) -> Option<f64> {
        if let Some(&hz) = self.labels.get(label) {
            return Some(hz);
        }
        label
            .parse::<f64>()
            .ok()
            .filter(|hz| hz.is_finite() && *hz >= 0.0)
    }

    /// The table label for a carrier, if one is within tolerance.
    pub fn label_for(&self, hz: f64) -> Option<&str> {
        self.labels
            .iter()
            .find(|(_, known)| same_frequency(**known, hz))
            .map(|(label, _)| label.as_str())
    }
}

pub fn same_frequency(a: f64, b: f64) -> bool {
    (a - b).abs() <= FREQUENCY_TOLERANCE_HZ
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_station_label_exactly() {
        let table = FrequencyTable::default();
        let expected = [
            ("WWV2p5", 2_500_000.0),
            ("WWV5", 5_000_000.0),
            ("WWV10", 10_000_000.0),
            ("WWV15", 15_000_000.0),
            ("CHU3", 3_330_000.0),
            ("CHU7", 7_850_000.0),
            ("CHU14", 14_670_000.0),
            ("Unknown", 0.0),
        ];
        for (label, hz) in expected {
            assert_eq!(table.resolve(label), Some(hz), "{label}");
        }
        let rebuilt = expected
            .iter()
            .fold(FrequencyTable::empty(), |table, &(label, hz)| table.with_label(label, hz));
        assert_eq!(table, rebuilt);
    }

    #[test]
    fn numeric_labels_resolve_to_themselves() {
        let table = FrequencyTable::default();
        assert_eq!(table.resolve("10000000"), Some(10e6));
        assert_eq!(table.resolve("-5"), None);
        assert_eq!(table.resolve("NaN"), None);
        assert_eq!(table.resolve("G1"), None);
    }

    #[test]
    fn extension_overrides_and_adds() {
        let mut table = FrequencyTable::empty().with_label("WWV5", 5e6);
        table.extend([("RWM4p996".to_string(), 4.996e6)]);
        assert_eq!(table.resolve("RWM4p996"), Some(4.996e6));
        assert_eq!(table.resolve("WWV10"), None);
        assert_eq!(table.label_for(4_996_000.3), Some("RWM4p996"));
    }

    #[test]
    fn deserializes_from_a_plain_map() {
        let table: FrequencyTable = serde_json::from_str(r#"{"WWV20": 20000000.0}"#).unwrap();
        assert_eq!(table.resolve("WWV20"), Some(20e6));
    }
}
