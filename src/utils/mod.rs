//! Small building blocks shared by the executors.

pub mod duration;
pub mod safe;

pub use duration::DurationMeasurement;
pub use safe::{run_safe, run_safe_with_cancel, SafeResult};
