pub mod alert_event;
pub mod alert_state;
pub mod host;
pub mod sample;

pub use alert_event::{AlertEvent, Transition};
pub use alert_state::{AlertState, EntityState};
pub use host::HostReport;
pub use sample::{Entity, MetricSample, SampleSet, UnavailableSample};
