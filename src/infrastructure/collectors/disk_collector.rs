use std::collections::HashSet;
use std::sync::{Mutex, TryLockError};

use sysinfo::Disks;

use crate::domain::entities::sample::{Entity, MetricSample, UnavailableSample};
use crate::domain::ports::metrics_source::CollectionError;

/// Filesystem types to exclude from disk metrics.
const PSEUDO_FILESYSTEMS: &[&str] = &[
    "tmpfs",
    "devtmpfs",
    "devpts",
    "sysfs",
    "proc",
    "cgroup",
    "cgroup2",
    "overlay",
    "squashfs",
    "efivarfs",
    "bpf",
    "hugetlbfs",
    "mqueue",
    "pstore",
    "securityfs",
    "debugfs",
    "tracefs",
    "configfs",
    "fusectl",
    "binfmt_misc",
    "autofs",
    "nsfs",
    "ramfs",
    "rpc_pipefs",
];

/// What to do with one enumerated volume.
#[derive(Debug, Clone, PartialEq)]
enum VolumeReading {
    Skip,
    Usage(f64),
    Unavailable(String),
}

#[allow(clippy::cast_precision_loss)]
fn read_volume(filesystem: &str, total: u64, available: u64) -> VolumeReading {
    if filesystem.is_empty() || PSEUDO_FILESYSTEMS.contains(&filesystem) || total == 0 {
        return VolumeReading::Skip;
    }
    if available > total {
        return VolumeReading::Unavailable(format!(
            "inconsistent capacity ({available} bytes free of {total})"
        ));
    }
    let used = total - available;
    VolumeReading::Usage((used as f64 / total as f64) * 100.0)
}

/// Per-volume samples from one refresh.
#[derive(Debug, Default)]
pub struct DiskSamples {
    pub samples: Vec<MetricSample>,
    pub unavailable: Vec<UnavailableSample>,
}

/// Blocking per-volume sampling, run off the async workers by
/// [`SysinfoCollector`](super::SysinfoCollector).
pub trait VolumeSampler: Send + Sync {
    /// Read usage of every volume.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError` if the volume table cannot be read.
    fn sample(&self) -> Result<DiskSamples, CollectionError>;

    /// Mount points seen by the last successful `sample`.
    fn known_mounts(&self) -> Vec<String>;
}

/// Samples usage of every real mounted volume using the `sysinfo` crate.
///
/// Pseudo-filesystems, volumes without a filesystem type and zero-size
/// volumes are skipped. A mount path seen twice (bind mounts) is reported once.
pub struct DiskCollector {
    disks: Mutex<Disks>,
    known: Mutex<Vec<String>>,
}

impl DiskCollector {
    /// Creates an empty collector. The volume table is first read by `sample`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            disks: Mutex::new(Disks::new()),
            known: Mutex::new(Vec::new()),
        }
    }

    fn remember(&self, out: &DiskSamples) {
        let mounts = out
            .samples
            .iter()
            .map(|s| &s.entity)
            .chain(out.unavailable.iter().map(|u| &u.entity))
            .filter_map(|entity| match entity {
                Entity::Disk(mount) => Some(mount.clone()),
                _ => None,
            })
            .collect();
        if let Ok(mut known) = self.known.lock() {
            *known = mounts;
        }
    }
}

impl VolumeSampler for DiskCollector {
    /// Refreshes the disk list to pick up newly mounted/unmounted volumes,
    /// then samples each one.
    ///
    /// A refresh stuck in the kernel (dead network mount) keeps the disk list
    /// locked; later calls fail immediately instead of queueing behind it.
    fn sample(&self) -> Result<DiskSamples, CollectionError> {
        let mut disks = match self.disks.try_lock() {
            Ok(disks) => disks,
            Err(TryLockError::WouldBlock) => {
                return Err(CollectionError::MetricsUnavailable(
                    "previous volume refresh still running".to_string(),
                ));
            }
            Err(TryLockError::Poisoned(e)) => {
                return Err(CollectionError::MetricsUnavailable(format!(
                    "disk lock poisoned: {e}"
                )));
            }
        };
        disks.refresh(true);

        let mut seen = HashSet::new();
        let mut out = DiskSamples::default();

        for disk in disks.list() {
            let mount_point = disk.mount_point().to_string_lossy().to_string();
            let filesystem = disk.file_system().to_string_lossy();
            let reading = read_volume(&filesystem, disk.total_space(), disk.available_space());
            if reading == VolumeReading::Skip || !seen.insert(mount_point.clone()) {
                continue;
            }

            let entity = Entity::Disk(mount_point);
            match reading {
                VolumeReading::Usage(usage) => out.samples.push(MetricSample::new(entity, usage)),
                VolumeReading::Unavailable(reason) => {
                    out.unavailable.push(UnavailableSample { entity, reason });
                }
                VolumeReading::Skip => {}
            }
        }
        drop(disks);

        self.remember(&out);
        Ok(out)
    }

    fn known_mounts(&self) -> Vec<String> {
        self.known
            .lock()
            .map(|known| known.clone())
            .unwrap_or_default()
    }
}

impl Default for DiskCollector {
    fn default() -> Self {
        Self::new()
    }
}
