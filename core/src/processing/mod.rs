pub mod filter;
pub mod power;
pub mod resample;

pub use filter::{BandType, CutoffPeriods, FilterSpec, FilterStage, FilterState, ResponsePoint};
pub use power::PowerStage;
pub use resample::{BoundaryPolicy, Resampler};
