use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::inventory::frequency::FrequencyTable;
use crate::prelude::{GrapeError, GrapeResult};
use crate::station::time::parse_timestamp;

const FIELD_COUNT: usize = 6;

/// One station data file, described by its name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    pub node_id: u32,
    pub grid_square: String,
    pub frequency_hz: f64,
}

/// A day-long bar for the inventory timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventorySpan {
    pub node: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub frequency_hz: f64,
    pub filename: String,
}

impl From<&FileRecord> for InventorySpan {
    fn from(record: &FileRecord) -> Self {
        Self {
            node: record.node_id,
            start: record.timestamp,
            end: record.timestamp + Duration::days(1),
            frequency_hz: record.frequency_hz,
            filename: record.filename.clone(),
        }
    }
}

/// Filename problems that exclude a file without failing the scan.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DataQualityError {
    #[error("expected 6 '_'-separated fields, found {0}")]
    FieldCount(usize),
    #[error("unrecognized frequency label {0:?}")]
    UnknownFrequency(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilenameOutcome {
    Accepted(FileRecord),
    Dropped(DataQualityError),
}

/// Parse `<datetime>_<Nnode>_G_<grid>_FRQ_<label><suffix>`.
///
/// Malformed layouts and unknown frequency labels are dropped. A bad node tag
/// or datetime in an otherwise well-formed name is an error.
pub fn parse_filename(
    filename: &str,
    suffix: &str,
    table: &FrequencyTable,
) -> GrapeResult<FilenameOutcome> {
    let stem = filename.strip_suffix(suffix).unwrap_or(filename);
    let fields: Vec<&str> = stem.split('_').collect();
    if fields.len() != FIELD_COUNT {
        return Ok(FilenameOutcome::Dropped(DataQualityError::FieldCount(
            fields.len(),
        )));
    }

    let label = fields[5];
    let frequency_hz = match table.resolve(label) {
        Some(hz) => hz,
        None => {
            return Ok(FilenameOutcome::Dropped(
                DataQualityError::UnknownFrequency(label.to_string()),
            ))
        }
    };

    let timestamp = parse_timestamp(fields[0]).ok_or_else(|| GrapeError::InvalidTimestamp {
        context: filename.to_string(),
        value: fields[0].to_string(),
    })?;
    let node_id = parse_node_tag(fields[1], filename)?;

    Ok(FilenameOutcome::Accepted(FileRecord {
        filename: filename.to_string(),
        timestamp,
        node_id,
        grid_square: fields[3].to_string(),
        frequency_hz,
    }))
}

/// `N0000042` -> 42. The prefix is optional.
pub fn parse_node_tag(tag: &str, context: &str) -> GrapeResult<u32> {
    let trimmed = tag.trim();
    let digits = trimmed.strip_prefix('N').unwrap_or(trimmed);
    digits.parse::<u32>().map_err(|_| GrapeError::InvalidNodeTag {
        context: context.to_string(),
        tag: tag.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(name: &str) -> GrapeResult<FilenameOutcome> {
        parse_filename(name, ".csv", &FrequencyTable::default())
    }

    #[test]
    fn parses_well_formed_names() {
        let outcome = parse("2021-10-25T000000Z_N0000007_G_EN91fh_FRQ_WWV10.csv").unwrap();
        let FilenameOutcome::Accepted(record) = outcome else {
            panic!("expected a record");
        };
        assert_eq!(record.node_id, 7);
        assert_eq!(record.grid_square, "EN91fh");
        assert_eq!(record.frequency_hz, 10e6);
        assert_eq!(
            record.timestamp,
            Utc.with_ymd_and_hms(2021, 10, 25, 0, 0, 0).unwrap()
        );

        let span = InventorySpan::from(&record);
        assert_eq!(span.end - span.start, Duration::days(1));
    }

    #[test]
    fn drops_naming_errors_silently() {
        assert_eq!(
            parse("2021-10-25T000000Z_N0000007_G_EN91fh_FRQ_G1.csv").unwrap(),
            FilenameOutcome::Dropped(DataQualityError::UnknownFrequency("G1".to_string()))
        );
        assert_eq!(
            parse("2021-10-25T000000Z_N0000007_EN91fh_WWV10.csv").unwrap(),
            FilenameOutcome::Dropped(DataQualityError::FieldCount(4))
        );
    }

    #[test]
    fn numeric_labels_are_accepted() {
        let outcome = parse("2021-10-25T000000Z_N0000007_G_EN91fh_FRQ_7850000.csv").unwrap();
        assert!(matches!(
            outcome,
            FilenameOutcome::Accepted(FileRecord { frequency_hz, .. }) if frequency_hz == 7.85e6
        ));
    }

    #[test]
    fn bad_node_tag_is_an_error() {
        assert!(matches!(
            parse("2021-10-25T000000Z_NXYZ_G_EN91fh_FRQ_WWV5.csv"),
            Err(GrapeError::InvalidNodeTag { .. })
        ));
        assert!(matches!(
            parse("yesterday_N0000007_G_EN91fh_FRQ_WWV5.csv"),
            Err(GrapeError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn node_tags_strip_prefix() {
        assert_eq!(parse_node_tag("N0000042", "t").unwrap(), 42);
        assert_eq!(parse_node_tag("17", "t").unwrap(), 17);
        assert!(parse_node_tag("N", "t").is_err());
    }
}
