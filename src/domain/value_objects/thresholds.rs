use serde::{Deserialize, Serialize};

use crate::domain::entities::sample::{Entity, MetricSample};

/// Per-kind usage thresholds. Built once at startup, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    /// CPU usage percentage above which the CPU is in breach
    pub cpu_percent: f64,
    /// Memory usage percentage above which memory is in breach
    pub memory_percent: f64,
    /// Usage percentage above which any single volume is in breach
    pub disk_percent: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            cpu_percent: 80.0,
            memory_percent: 80.0,
            disk_percent: 90.0,
        }
    }
}

impl ThresholdPolicy {
    #[must_use]
    pub const fn new(cpu_percent: f64, memory_percent: f64, disk_percent: f64) -> Self {
        Self {
            cpu_percent,
            memory_percent,
            disk_percent,
        }
    }

    #[must_use]
    pub const fn threshold_for(&self, entity: &Entity) -> f64 {
        match entity {
            Entity::Cpu => self.cpu_percent,
            Entity::Memory => self.memory_percent,
            Entity::Disk(_) => self.disk_percent,
        }
    }

    /// True iff the sample is strictly above its entity's threshold.
    /// Out-of-range usage is compared as-is; NaN never breaches.
    #[must_use]
    pub fn classify(&self, sample: &MetricSample) -> bool {
        sample.usage_percent > self.threshold_for(&sample.entity)
    }
}
