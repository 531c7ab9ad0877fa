pub mod disk_collector;
pub mod sysinfo_collector;

pub use disk_collector::{DiskCollector, DiskSamples, VolumeSampler};
pub use sysinfo_collector::SysinfoCollector;
