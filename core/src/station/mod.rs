pub mod dataset;
pub mod loader;
pub mod series;
pub mod time;

pub use dataset::{
    station_label, DatasetRequest, Stage, StageFrame, StageKind, StationDataset, StationMeta,
};
pub use series::{parameter_label, Column, ObservationSeries};
