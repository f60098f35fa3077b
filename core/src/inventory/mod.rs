pub mod files;
pub mod frequency;
pub mod nodes;
pub mod record;

pub use files::{DroppedFile, FileInventory};
pub use frequency::{FrequencyTable, FREQUENCY_TOLERANCE_HZ};
pub use nodes::{NodeMetadata, NodeRegistry, NodeStatus, StatusRow};
pub use record::{DataQualityError, FileRecord, InventorySpan};
