pub mod model;
pub mod writer;

pub use model::{DatasetSummary, InventoryReport};
pub use writer::write_json;
