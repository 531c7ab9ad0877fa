use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A monitored resource unit. Volumes are identified by mount path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "mount_point", rename_all = "snake_case")]
pub enum Entity {
    Cpu,
    Memory,
    Disk(String),
}

impl Entity {
    #[must_use]
    pub fn disk(mount_point: impl Into<String>) -> Self {
        Self::Disk(mount_point.into())
    }

    #[must_use]
    pub const fn is_disk(&self) -> bool {
        matches!(self, Self::Disk(_))
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "CPU"),
            Self::Memory => write!(f, "Memory"),
            Self::Disk(mount_point) => write!(f, "Disk ({mount_point})"),
        }
    }
}

/// Utilization reading for one entity at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub entity: Entity,
    pub usage_percent: f64,
    pub timestamp: DateTime<Utc>,
}

impl MetricSample {
    #[must_use]
    pub fn new(entity: Entity, usage_percent: f64) -> Self {
        Self {
            entity,
            usage_percent,
            timestamp: Utc::now(),
        }
    }
}

/// An entity that was enumerated but could not be read this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableSample {
    pub entity: Entity,
    pub reason: String,
}

/// Everything a metrics source produced for one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    pub samples: Vec<MetricSample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<UnavailableSample>,
}

impl SampleSet {
    #[must_use]
    pub const fn new(samples: Vec<MetricSample>) -> Self {
        Self {
            samples,
            unavailable: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_unavailable(mut self, entity: Entity, reason: impl Into<String>) -> Self {
        self.unavailable.push(UnavailableSample {
            entity,
            reason: reason.into(),
        });
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample for `entity`, if one was taken.
    #[must_use]
    pub fn get(&self, entity: &Entity) -> Option<&MetricSample> {
        self.samples.iter().find(|s| &s.entity == entity)
    }

    /// Disk samples in enumeration order.
    pub fn disks(&self) -> impl Iterator<Item = &MetricSample> {
        self.samples.iter().filter(|s| s.entity.is_disk())
    }
}
