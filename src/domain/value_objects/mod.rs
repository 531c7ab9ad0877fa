pub mod repeat_policy;
pub mod thresholds;

pub use repeat_policy::RepeatPolicy;
pub use thresholds::ThresholdPolicy;
