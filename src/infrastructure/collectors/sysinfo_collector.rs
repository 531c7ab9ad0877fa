use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sysinfo::System;

use super::disk_collector::{DiskCollector, VolumeSampler};
use crate::domain::entities::host::HostReport;
use crate::domain::entities::sample::{Entity, MetricSample, SampleSet, UnavailableSample};
use crate::domain::ports::metrics_source::{CollectionError, MetricsSource};

const DEFAULT_VOLUME_TIMEOUT: Duration = Duration::from_secs(5);

/// Returns `(numerator / denominator) * 100.0`, or `None` when `denominator` is zero.
#[allow(clippy::cast_precision_loss)]
fn safe_percent(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator > 0).then(|| (numerator as f64 / denominator as f64) * 100.0)
}

/// Samples CPU, memory and volumes using the `sysinfo` crate.
///
/// `sysinfo` refreshes are blocking (CPU usage needs two refreshes a short
/// interval apart), so sampling runs on the blocking thread pool. Volumes are
/// read in a separate step with their own timeout: a hung mount only makes
/// the volumes unavailable, CPU and memory are still reported.
pub struct SysinfoCollector {
    sys: Arc<Mutex<System>>,
    volumes: Arc<dyn VolumeSampler>,
    volume_timeout: Duration,
}

impl SysinfoCollector {
    /// Creates a collector. Nothing is read until the first `sample_all`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_volumes(Arc::new(DiskCollector::new()), DEFAULT_VOLUME_TIMEOUT)
    }

    #[must_use]
    pub fn with_volumes(volumes: Arc<dyn VolumeSampler>, volume_timeout: Duration) -> Self {
        Self {
            sys: Arc::new(Mutex::new(System::new())),
            volumes,
            volume_timeout,
        }
    }

    /// Replace the time allowed for reading volumes.
    #[must_use]
    pub const fn with_volume_timeout(mut self, volume_timeout: Duration) -> Self {
        self.volume_timeout = volume_timeout;
        self
    }

    /// Wrap `metrics` with host identity for the snapshot report.
    #[must_use]
    pub fn host_report(metrics: SampleSet) -> HostReport {
        HostReport {
            timestamp: chrono::Utc::now(),
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            uptime_secs: System::uptime(),
            metrics,
        }
    }

    /// Add volume samples to `set`. On failure or timeout every volume seen
    /// last time is reported unavailable, so its alert state is kept.
    async fn sample_volumes(&self, set: &mut SampleSet) {
        let volumes = Arc::clone(&self.volumes);
        let task = tokio::task::spawn_blocking(move || volumes.sample());
        let result = match tokio::time::timeout(self.volume_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(CollectionError::MetricsUnavailable(format!(
                "volume sampling task failed: {e}"
            ))),
            Err(_) => Err(CollectionError::Timeout(self.volume_timeout)),
        };

        match result {
            Ok(disks) => {
                set.samples.extend(disks.samples);
                set.unavailable.extend(disks.unavailable);
            }
            Err(e) => {
                tracing::warn!("Volume sampling failed: {e}");
                let reason = e.to_string();
                set.unavailable
                    .extend(self.volumes.known_mounts().into_iter().map(|mount| {
                        UnavailableSample {
                            entity: Entity::Disk(mount),
                            reason: reason.clone(),
                        }
                    }));
            }
        }
    }
}

impl Default for SysinfoCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsSource for SysinfoCollector {
    async fn sample_all(&self) -> Result<SampleSet, CollectionError> {
        let sys = Arc::clone(&self.sys);
        let mut set = tokio::task::spawn_blocking(move || sample_host(&sys))
            .await
            .map_err(|e| CollectionError::MetricsUnavailable(format!("sampling task failed: {e}")))??;

        self.sample_volumes(&mut set).await;

        if set.samples.is_empty() {
            return Err(CollectionError::MetricsUnavailable(
                "no metric could be read".to_string(),
            ));
        }
        Ok(set)
    }
}

/// CPU and memory only; these never touch mounted filesystems.
fn sample_host(sys: &Mutex<System>) -> Result<SampleSet, CollectionError> {
    let mut sys = sys
        .lock()
        .map_err(|e| CollectionError::MetricsUnavailable(format!("system lock poisoned: {e}")))?;

    sys.refresh_cpu_usage();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    let cpu = f64::from(sys.global_cpu_usage());
    let memory = safe_percent(sys.used_memory(), sys.total_memory());
    let cpu_count = sys.cpus().len();
    drop(sys);

    let mut set = SampleSet::default();

    if cpu_count > 0 {
        set.samples.push(MetricSample::new(Entity::Cpu, cpu));
    } else {
        set.unavailable.push(UnavailableSample {
            entity: Entity::Cpu,
            reason: "no CPUs reported".to_string(),
        });
    }

    match memory {
        Some(usage) => set.samples.push(MetricSample::new(Entity::Memory, usage)),
        None => set.unavailable.push(UnavailableSample {
            entity: Entity::Memory,
            reason: "total memory reported as zero".to_string(),
        }),
    }

    Ok(set)
}
