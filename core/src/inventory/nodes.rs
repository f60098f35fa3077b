use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::inventory::record::parse_node_tag;
use crate::prelude::{GrapeError, GrapeResult};

const NODE_HEADERS: [&str; 3] = ["Node #", "Node", "Node_Number"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum NodeStatus {
    #[serde(rename = "data logged")]
    DataLogged,
    #[default]
    #[serde(rename = "no data logged")]
    NoDataLogged,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::DataLogged => write!(f, "data logged"),
            NodeStatus::NoDataLogged => write!(f, "no data logged"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeMetadata {
    pub node_id: u32,
    pub callsign: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: NodeStatus,
}

impl NodeMetadata {
    pub fn new(node_id: u32, callsign: &str) -> Self {
        Self {
            node_id,
            callsign: callsign.to_string(),
            latitude: None,
            longitude: None,
            status: NodeStatus::default(),
        }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub node: u32,
    pub callsign: String,
    pub status: NodeStatus,
}

/// Station metadata keyed by node number.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: BTreeMap<u32, NodeMetadata>,
}

impl NodeRegistry {
    pub fn from_nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = NodeMetadata>,
    {
        Self {
            nodes: nodes.into_iter().map(|node| (node.node_id, node)).collect(),
        }
    }

    /// Read a node table. Only the node column is required; unknown columns are ignored.
    pub fn load(path: &Path) -> GrapeResult<Self> {
        let csv_error = |source| GrapeError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_error)?;
        let headers = reader.headers().map_err(csv_error)?.clone();
        let position = |name: &str| headers.iter().position(|header| header == name);

        let node_column = NODE_HEADERS
            .iter()
            .find_map(|name| position(name))
            .ok_or_else(|| GrapeError::MissingColumn {
                context: path.display().to_string(),
                column: NODE_HEADERS[0].to_string(),
            })?;
        let callsign_column = position("Callsign");
        let latitude_column = position("Latitude");
        let longitude_column = position("Longitude");

        let mut nodes = BTreeMap::new();
        for (row_no, result) in reader.records().enumerate() {
            let record = result.map_err(csv_error)?;
            let context = format!("{} row {}", path.display(), row_no + 1);

            let node_id = parse_node_tag(record.get(node_column).unwrap_or(""), &context)?;
            let callsign = callsign_column
                .and_then(|column| record.get(column))
                .unwrap_or("")
                .to_string();
            let coordinate = |column: Option<usize>, name: &str| -> GrapeResult<Option<f64>> {
                match column.and_then(|column| record.get(column)) {
                    None | Some("") => Ok(None),
                    Some(cell) => cell.parse::<f64>().map(Some).map_err(|_| {
                        GrapeError::InvalidValue {
                            context: context.clone(),
                            column: name.to_string(),
                            value: cell.to_string(),
                        }
                    }),
                }
            };

            nodes.insert(
                node_id,
                NodeMetadata {
                    node_id,
                    callsign,
                    latitude: coordinate(latitude_column, "Latitude")?,
                    longitude: coordinate(longitude_column, "Longitude")?,
                    status: NodeStatus::default(),
                },
            );
        }

        log::info!("loaded {} nodes from {}", nodes.len(), path.display());
        Ok(Self { nodes })
    }

    /// Mark every node as logged or not.
    pub fn annotate(&mut self, logged_nodes: &BTreeSet<u32>) -> &mut Self {
        for (node_id, metadata) in self.nodes.iter_mut() {
            metadata.status = if logged_nodes.contains(node_id) {
                NodeStatus::DataLogged
            } else {
                NodeStatus::NoDataLogged
            };
        }
        self
    }

    pub fn get(&self, node_id: u32) -> Option<&NodeMetadata> {
        self.nodes.get(&node_id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeMetadata> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn status_table(&self) -> Vec<StatusRow> {
        self.nodes
            .values()
            .map(|node| StatusRow {
                node: node.node_id,
                callsign: node.callsign.clone(),
                status: node.status,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_marks_only_logged_nodes() {
        let mut registry = NodeRegistry::from_nodes(
            (1..=3).map(|node| NodeMetadata::new(node, &format!("K{node}ABC"))),
        );
        registry.annotate(&BTreeSet::from([2]));

        let statuses: Vec<String> = registry
            .status_table()
            .iter()
            .map(|row| row.status.to_string())
            .collect();
        assert_eq!(statuses, vec!["no data logged", "data logged", "no data logged"]);
    }

    #[test]
    fn loads_node_table_with_aliases_and_blank_locations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodelist.csv");
        std::fs::write(
            &path,
            "Node_Number,Callsign,Latitude,Longitude,Radio\n\
             N0000007,KD2UHN,40.74,-74.18,Grape1\n\
             13,VE3XYZ,,,Grape1\n",
        )
        .unwrap();

        let registry = NodeRegistry::load(&path).unwrap();
        assert_eq!(registry.len(), 2);
        let node = registry.get(7).unwrap();
        assert_eq!(node.callsign, "KD2UHN");
        assert_eq!(node.latitude, Some(40.74));
        assert_eq!(registry.get(13).unwrap().longitude, None);
        assert_eq!(node.status, NodeStatus::NoDataLogged);
    }

    #[test]
    fn node_table_errors() {
        let dir = tempfile::tempdir().unwrap();
        let no_node = dir.path().join("a.csv");
        std::fs::write(&no_node, "Callsign\nKD2UHN\n").unwrap();
        assert!(matches!(
            NodeRegistry::load(&no_node),
            Err(GrapeError::MissingColumn { .. })
        ));

        let bad_tag = dir.path().join("b.csv");
        std::fs::write(&bad_tag, "Node #,Callsign\nNX,KD2UHN\n").unwrap();
        assert!(matches!(
            NodeRegistry::load(&bad_tag),
            Err(GrapeError::InvalidNodeTag { .. })
        ));
    }

    #[test]
    fn status_serializes_as_text() {
        let json = serde_json::to_string(&NodeStatus::DataLogged).unwrap();
        assert_eq!(json, "\"data logged\"");
    }
}
