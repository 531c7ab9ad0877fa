#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use hostwatch::application::config::AppConfig;
use hostwatch::application::services::evaluator::{Evaluator, EvaluatorSettings, TickStatus};
use hostwatch::domain::entities::alert_event::{AlertEvent, Transition};
use hostwatch::domain::entities::sample::{Entity, MetricSample, SampleSet};
use hostwatch::domain::ports::metrics_source::{CollectionError, MetricsSource};
use hostwatch::domain::ports::notifier::{NotificationError, Notifier};
use hostwatch::domain::value_objects::repeat_policy::RepeatPolicy;
use hostwatch::domain::value_objects::thresholds::ThresholdPolicy;
use hostwatch::infrastructure::collectors::{DiskSamples, SysinfoCollector, VolumeSampler};
use hostwatch::infrastructure::notifications::build_notifier;
use hostwatch::infrastructure::notifications::composite::CompositeNotifier;

// ---------------------------------------------------------------------------
// ScriptedSource: replays one prepared result per tick
// ---------------------------------------------------------------------------

struct ScriptedSource {
    script: Mutex<VecDeque<Result<SampleSet, CollectionError>>>,
}

impl ScriptedSource {
    fn new(script: Vec<Result<SampleSet, CollectionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }

    fn cpu(values: &[f64]) -> Self {
        Self::new(
            values
                .iter()
                .map(|v| Ok(SampleSet::new(vec![MetricSample::new(Entity::Cpu, *v)])))
                .collect(),
        )
    }
}

#[async_trait]
impl MetricsSource for ScriptedSource {
    async fn sample_all(&self) -> Result<SampleSet, CollectionError> {
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Err(CollectionError::MetricsUnavailable("script exhausted".into())))
    }
}

struct SlowSource;

#[async_trait]
impl MetricsSource for SlowSource {
    async fn sample_all(&self) -> Result<SampleSet, CollectionError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(SampleSet::new(vec![MetricSample::new(Entity::Cpu, 99.0)]))
    }
}

/// Volume reader stuck in the kernel until the test drops the sender, like
/// `statvfs` on a dead network mount.
struct StuckVolumes {
    gate: Mutex<mpsc::Receiver<()>>,
}

impl VolumeSampler for StuckVolumes {
    fn sample(&self) -> Result<DiskSamples, CollectionError> {
        let Ok(gate) = self.gate.try_lock() else {
            return Err(CollectionError::MetricsUnavailable(
                "previous volume refresh still running".into(),
            ));
        };
        let _ = gate.recv_timeout(Duration::from_secs(30));
        Ok(DiskSamples::default())
    }

    fn known_mounts(&self) -> Vec<String> {
        vec!["/mnt/nfs".to_string()]
    }
}

// ---------------------------------------------------------------------------
// Notifiers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<AlertEvent>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<AlertEvent> {
        self.sent.lock().expect("sent lock").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError> {
        self.sent.lock().expect("sent lock").push(event.clone());
        Ok(())
    }
}

/// Fails for one entity, records the rest.
struct FailsFor {
    entity: Entity,
    inner: RecordingNotifier,
}

#[async_trait]
impl Notifier for FailsFor {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError> {
        if event.entity == self.entity {
            return Err(NotificationError::SendFailed("smtp rejected".into()));
        }
        self.inner.notify(event).await
    }
}

/// Hangs for one entity, records the rest.
struct HangsFor {
    entity: Entity,
    inner: RecordingNotifier,
}

#[async_trait]
impl Notifier for HangsFor {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError> {
        if event.entity == self.entity {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.inner.notify(event).await
    }
}

/// Never answers within any sane dispatch timeout.
struct StalledChannel;

#[async_trait]
impl Notifier for StalledChannel {
    async fn notify(&self, _event: &AlertEvent) -> Result<(), NotificationError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

/// Counts deliveries; shares the counter with the test.
struct CountingChannel(Arc<AtomicUsize>);

#[async_trait]
impl Notifier for CountingChannel {
    async fn notify(&self, _event: &AlertEvent) -> Result<(), NotificationError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn cpu_80() -> ThresholdPolicy {
    ThresholdPolicy::new(80.0, 80.0, 90.0)
}

fn set(samples: &[(Entity, f64)]) -> SampleSet {
    SampleSet::new(
        samples
            .iter()
            .map(|(e, v)| MetricSample::new(e.clone(), *v))
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cpu_breach_suppress_recover_rearm() {
    let source = ScriptedSource::cpu(&[85.0, 90.0, 50.0, 81.0]);
    let policy = cpu_80();
    let notifier = RecordingNotifier::default();
    let mut evaluator = Evaluator::new(&source, &policy, &notifier, EvaluatorSettings::default());

    let t1 = evaluator.tick().await;
    assert_eq!(t1.events.len(), 1);
    assert_eq!(t1.delivered, 1);
    assert!(evaluator.state().is_active(&Entity::Cpu));

    let t2 = evaluator.tick().await;
    assert!(t2.events.is_empty());
    assert!(evaluator.state().is_active(&Entity::Cpu));

    let t3 = evaluator.tick().await;
    assert!(t3.events.is_empty());
    assert!(!evaluator.state().is_active(&Entity::Cpu));

    let t4 = evaluator.tick().await;
    assert_eq!(t4.events.len(), 1);
    assert!(evaluator.state().is_active(&Entity::Cpu));

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].entity, Entity::Cpu);
    assert!((sent[0].usage_percent - 85.0).abs() < f64::EPSILON);
    assert_eq!(sent[0].subject(), "Alert: CPU usage is at 85.0%");
    assert!((sent[1].usage_percent - 81.0).abs() < f64::EPSILON);
    assert!(sent.iter().all(|e| e.transition == Transition::EnteredBreach));
}

#[tokio::test]
async fn sustained_breach_notifies_exactly_once() {
    let source = ScriptedSource::cpu(&[95.0; 10]);
    let policy = cpu_80();
    let notifier = RecordingNotifier::default();
    let mut evaluator = Evaluator::new(&source, &policy, &notifier, EvaluatorSettings::default());

    for _ in 0..10 {
        evaluator.tick().await;
    }

    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(evaluator.stats().ticks, 10);
    assert_eq!(evaluator.stats().events, 1);
}

#[tokio::test]
async fn value_equal_to_threshold_is_not_a_breach() {
    let source = ScriptedSource::cpu(&[80.0]);
    let policy = cpu_80();
    let notifier = RecordingNotifier::default();
    let mut evaluator = Evaluator::new(&source, &policy, &notifier, EvaluatorSettings::default());

    let outcome = evaluator.tick().await;

    assert!(outcome.events.is_empty());
    assert!(!evaluator.state().is_active(&Entity::Cpu));
}

#[tokio::test]
async fn every_tick_mode_repeats_while_breaching() {
    let source = ScriptedSource::cpu(&[85.0, 90.0, 88.0, 40.0]);
    let policy = cpu_80();
    let notifier = RecordingNotifier::default();
    let settings = EvaluatorSettings {
        repeat: RepeatPolicy::EveryTick,
        ..EvaluatorSettings::default()
    };
    let mut evaluator = Evaluator::new(&source, &policy, &notifier, settings);

    for _ in 0..4 {
        evaluator.tick().await;
    }

    let transitions: Vec<_> = notifier.sent().iter().map(|e| e.transition).collect();
    assert_eq!(
        transitions,
        vec![
            Transition::EnteredBreach,
            Transition::StillBreaching,
            Transition::StillBreaching
        ]
    );
}

#[tokio::test]
async fn recovery_is_notified_when_enabled() {
    let source = ScriptedSource::cpu(&[85.0, 50.0]);
    let policy = cpu_80();
    let notifier = RecordingNotifier::default();
    let settings = EvaluatorSettings {
        notify_on_recovery: true,
        ..EvaluatorSettings::default()
    };
    let mut evaluator = Evaluator::new(&source, &policy, &notifier, settings);

    evaluator.tick().await;
    evaluator.tick().await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].is_recovery());
    assert_eq!(sent[1].subject(), "Resolved: CPU usage is back to 50.0%");
}

#[tokio::test]
async fn unmounted_volume_is_pruned_and_returns_unflagged() {
    let data = Entity::disk("/data");
    let source = ScriptedSource::new(vec![
        Ok(set(&[(Entity::Cpu, 10.0), (data.clone(), 95.0)])),
        Ok(set(&[(Entity::Cpu, 10.0)])),
        Ok(set(&[(Entity::Cpu, 10.0), (data.clone(), 96.0)])),
    ]);
    let policy = ThresholdPolicy::default();
    let notifier = RecordingNotifier::default();
    let mut evaluator = Evaluator::new(&source, &policy, &notifier, EvaluatorSettings::default());

    evaluator.tick().await;
    assert!(evaluator.state().is_active(&data));

    evaluator.tick().await;
    assert!(!evaluator.state().is_active(&data));
    assert!(evaluator.state().last_usage(&data).is_none());

    let t3 = evaluator.tick().await;
    assert_eq!(t3.events.len(), 1);
    assert_eq!(t3.events[0].transition, Transition::EnteredBreach);
    assert_eq!(notifier.sent().len(), 2);
}

#[tokio::test]
async fn unreadable_volume_keeps_its_flag() {
    let data = Entity::disk("/data");
    let source = ScriptedSource::new(vec![
        Ok(set(&[(Entity::Cpu, 10.0), (data.clone(), 95.0)])),
        Ok(set(&[(Entity::Cpu, 10.0)]).with_unavailable(data.clone(), "stale NFS handle")),
        Ok(set(&[(Entity::Cpu, 10.0), (data.clone(), 95.0)])),
    ]);
    let policy = ThresholdPolicy::default();
    let notifier = RecordingNotifier::default();
    let mut evaluator = Evaluator::new(&source, &policy, &notifier, EvaluatorSettings::default());

    evaluator.tick().await;
    let t2 = evaluator.tick().await;
    assert_eq!(t2.skipped, 1);
    assert!(evaluator.state().is_active(&data));

    let t3 = evaluator.tick().await;
    assert!(t3.events.is_empty());
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn failure_for_one_entity_does_not_block_others() {
    let source = ScriptedSource::new(vec![Ok(set(&[
        (Entity::Cpu, 99.0),
        (Entity::Memory, 99.0),
        (Entity::disk("/"), 99.0),
    ]))]);
    let policy = ThresholdPolicy::default();
    let notifier = FailsFor {
        entity: Entity::Memory,
        inner: RecordingNotifier::default(),
    };
    let mut evaluator = Evaluator::new(&source, &policy, &notifier, EvaluatorSettings::default());

    let outcome = evaluator.tick().await;

    assert_eq!(outcome.events.len(), 3);
    assert_eq!(outcome.delivered, 2);
    assert_eq!(outcome.failed, 1);
    // No rollback: the failed entity is still considered in breach.
    assert!(evaluator.state().is_active(&Entity::Memory));
    let delivered: Vec<_> = notifier.inner.sent().into_iter().map(|e| e.entity).collect();
    assert!(delivered.contains(&Entity::Cpu));
    assert!(delivered.contains(&Entity::disk("/")));
}

#[tokio::test]
async fn failed_dispatch_is_not_retried_next_tick() {
    let source = ScriptedSource::cpu(&[99.0, 99.0]);
    let policy = cpu_80();
    let notifier = FailsFor {
        entity: Entity::Cpu,
        inner: RecordingNotifier::default(),
    };
    let mut evaluator = Evaluator::new(&source, &policy, &notifier, EvaluatorSettings::default());

    let t1 = evaluator.tick().await;
    let t2 = evaluator.tick().await;

    assert_eq!(t1.failed, 1);
    assert!(t2.events.is_empty());
    assert_eq!(evaluator.stats().failed, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_notifier_times_out_as_failure() {
    let source = ScriptedSource::new(vec![Ok(set(&[
        (Entity::Cpu, 99.0),
        (Entity::Memory, 99.0),
    ]))]);
    let policy = ThresholdPolicy::default();
    let notifier = HangsFor {
        entity: Entity::Cpu,
        inner: RecordingNotifier::default(),
    };
    let settings = EvaluatorSettings {
        dispatch_timeout: Duration::from_millis(100),
        ..EvaluatorSettings::default()
    };
    let mut evaluator = Evaluator::new(&source, &policy, &notifier, settings);

    let outcome = evaluator.tick().await;

    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.delivered, 1);
    assert_eq!(notifier.inner.sent()[0].entity, Entity::Memory);
    assert!(evaluator.state().is_active(&Entity::Cpu));
}

#[tokio::test(start_paused = true)]
async fn source_timeout_leaves_state_unchanged() {
    let policy = cpu_80();
    let notifier = RecordingNotifier::default();
    let settings = EvaluatorSettings {
        sample_timeout: Duration::from_millis(50),
        ..EvaluatorSettings::default()
    };
    let mut evaluator = Evaluator::new(&SlowSource, &policy, &notifier, settings);

    let outcome = evaluator.tick().await;

    assert_eq!(outcome.status, TickStatus::NoData);
    assert!(outcome.events.is_empty());
    assert!(evaluator.state().is_empty());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn unreadable_tick_keeps_previous_state() {
    let source = ScriptedSource::new(vec![
        Ok(set(&[(Entity::Cpu, 95.0)])),
        Err(CollectionError::MetricsUnavailable("procfs gone".into())),
        Ok(SampleSet::default()),
        Ok(set(&[(Entity::Cpu, 95.0)])),
    ]);
    let policy = cpu_80();
    let notifier = RecordingNotifier::default();
    let mut evaluator = Evaluator::new(&source, &policy, &notifier, EvaluatorSettings::default());

    evaluator.tick().await;
    assert_eq!(evaluator.tick().await.status, TickStatus::NoData);
    assert_eq!(evaluator.tick().await.status, TickStatus::NoData);
    assert!(evaluator.state().is_active(&Entity::Cpu));

    let t4 = evaluator.tick().await;
    assert!(t4.events.is_empty());
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(evaluator.stats().no_data_ticks, 2);
}

#[tokio::test]
async fn missing_credentials_log_only_and_still_track_state() {
    let config = AppConfig::default();
    assert!(config.email.credentials().is_err());
    let notifier = build_notifier(&config);

    let source = ScriptedSource::cpu(&[85.0]);
    let policy = ThresholdPolicy::from(&config.thresholds);
    let mut evaluator =
        Evaluator::new(&source, &policy, &notifier, config.evaluator_settings());

    let outcome = evaluator.tick().await;

    assert_eq!(outcome.events.len(), 1);
    assert_eq!(outcome.delivered, 1);
    assert_eq!(outcome.failed, 0);
    assert!(evaluator.state().is_active(&Entity::Cpu));
}

#[tokio::test]
async fn memory_and_disk_thresholds_are_independent() {
    let source = ScriptedSource::new(vec![Ok(set(&[
        (Entity::Cpu, 50.0),
        (Entity::Memory, 85.0),
        (Entity::disk("/"), 85.0),
    ]))]);
    let policy = ThresholdPolicy::default();
    let notifier = RecordingNotifier::default();
    let mut evaluator = Evaluator::new(&source, &policy, &notifier, EvaluatorSettings::default());

    let outcome = evaluator.tick().await;

    // Disk threshold is 90, memory 80.
    assert_eq!(outcome.events.len(), 1);
    assert_eq!(outcome.events[0].entity, Entity::Memory);
    assert_eq!(evaluator.state().active_entities(), vec![&Entity::Memory]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hung_volume_does_not_block_host_metrics() {
    let (release, gate) = mpsc::channel::<()>();
    let volumes = Arc::new(StuckVolumes {
        gate: Mutex::new(gate),
    });
    let source = SysinfoCollector::with_volumes(volumes, Duration::from_millis(100));
    // Any memory use at all is a breach.
    let policy = ThresholdPolicy::new(100.0, 0.0, 90.0);
    let notifier = RecordingNotifier::default();
    let settings = EvaluatorSettings {
        sample_timeout: Duration::from_secs(5),
        ..EvaluatorSettings::default()
    };
    let mut evaluator = Evaluator::new(&source, &policy, &notifier, settings);

    for _ in 0..3 {
        let outcome = evaluator.tick().await;
        assert_eq!(outcome.status, TickStatus::Completed);
        assert!(outcome.metrics.get(&Entity::Memory).is_some());
        assert!(outcome
            .metrics
            .unavailable
            .iter()
            .any(|u| u.entity == Entity::disk("/mnt/nfs")));
    }

    assert_eq!(evaluator.stats().no_data_ticks, 0);
    assert!(evaluator.state().is_active(&Entity::Memory));
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].entity, Entity::Memory);

    drop(release);
}

#[tokio::test(start_paused = true)]
async fn stalled_channel_does_not_starve_the_others() {
    let source = ScriptedSource::cpu(&[95.0]);
    let policy = cpu_80();
    let hits = Arc::new(AtomicUsize::new(0));
    let notifier = CompositeNotifier::new(vec![
        Box::new(StalledChannel),
        Box::new(CountingChannel(Arc::clone(&hits))),
    ]);
    let mut evaluator = Evaluator::new(&source, &policy, &notifier, EvaluatorSettings::default());

    let outcome = evaluator.tick().await;

    assert_eq!(outcome.events.len(), 1);
    assert_eq!(outcome.failed, 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(evaluator.state().is_active(&Entity::Cpu));
}
