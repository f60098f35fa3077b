pub mod fft;
pub mod interp;
pub mod poly;
pub mod stats;

pub use fft::FftHelper;
pub use interp::interp_linear;
pub use stats::StatsHelper;
