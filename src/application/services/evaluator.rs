use std::collections::HashSet;
use std::time::Duration;

use futures::future::join_all;

use crate::domain::entities::alert_event::{AlertEvent, Transition};
use crate::domain::entities::alert_state::AlertState;
use crate::domain::entities::sample::{Entity, SampleSet};
use crate::domain::ports::metrics_source::{CollectionError, MetricsSource};
use crate::domain::ports::notifier::{NotificationError, Notifier};
use crate::domain::value_objects::repeat_policy::RepeatPolicy;
use crate::domain::value_objects::thresholds::ThresholdPolicy;

/// Knobs that change how a tick turns transitions into notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorSettings {
    pub repeat: RepeatPolicy,
    pub notify_on_recovery: bool,
    pub sample_timeout: Duration,
    pub dispatch_timeout: Duration,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            repeat: RepeatPolicy::Once,
            notify_on_recovery: false,
            sample_timeout: Duration::from_secs(10),
            dispatch_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Samples were evaluated and state updated
    Completed,
    /// Nothing could be read; state left untouched
    NoData,
}

/// Result of a single evaluation tick.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub status: TickStatus,
    pub metrics: SampleSet,
    pub events: Vec<AlertEvent>,
    pub skipped: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl TickOutcome {
    fn no_data(metrics: SampleSet) -> Self {
        Self {
            status: TickStatus::NoData,
            skipped: metrics.unavailable.len(),
            metrics,
            events: Vec::new(),
            delivered: 0,
            failed: 0,
        }
    }
}

/// Running totals across every tick of one evaluator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluatorStats {
    pub ticks: u64,
    pub no_data_ticks: u64,
    pub events: u64,
    pub delivered: u64,
    pub failed: u64,
}

/// Orchestrates one tick: sample → classify → update state → dispatch.
///
/// The evaluator owns the [`AlertState`]; `tick` takes `&mut self`, so two
/// ticks can never run against the same state at once.
pub struct Evaluator<'a> {
    source: &'a dyn MetricsSource,
    policy: &'a ThresholdPolicy,
    notifier: &'a dyn Notifier,
    settings: EvaluatorSettings,
    state: AlertState,
    stats: EvaluatorStats,
}

impl<'a> Evaluator<'a> {
    #[must_use]
    pub fn new(
        source: &'a dyn MetricsSource,
        policy: &'a ThresholdPolicy,
        notifier: &'a dyn Notifier,
        settings: EvaluatorSettings,
    ) -> Self {
        Self {
            source,
            policy,
            notifier,
            settings,
            state: AlertState::new(),
            stats: EvaluatorStats::default(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &AlertState {
        &self.state
    }

    #[must_use]
    pub const fn settings(&self) -> &EvaluatorSettings {
        &self.settings
    }

    #[must_use]
    pub const fn stats(&self) -> EvaluatorStats {
        self.stats
    }

    /// Run one evaluation tick. Never fails: unreadable metrics turn the tick
    /// into a no-op and notifier failures are logged and counted.
    pub async fn tick(&mut self) -> TickOutcome {
        self.stats.ticks += 1;

        let sampled = match tokio::time::timeout(
            self.settings.sample_timeout,
            self.source.sample_all(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CollectionError::Timeout(self.settings.sample_timeout)),
        };
        let metrics = match sampled {
            Ok(metrics) => metrics,
            Err(e) => {
                tracing::warn!("Metrics unavailable, tick skipped: {e}");
                self.stats.no_data_ticks += 1;
                return TickOutcome::no_data(SampleSet::default());
            }
        };

        for missing in &metrics.unavailable {
            tracing::warn!(entity = %missing.entity, "Sample unavailable: {}", missing.reason);
        }

        if metrics.is_empty() {
            tracing::warn!("No metrics could be read this tick, alert state unchanged");
            self.stats.no_data_ticks += 1;
            return TickOutcome::no_data(metrics);
        }

        let events = self.evaluate(&metrics);
        let (delivered, failed) = self.dispatch(&events).await;

        self.stats.events += events.len() as u64;
        self.stats.delivered += delivered as u64;
        self.stats.failed += failed as u64;

        TickOutcome {
            status: TickStatus::Completed,
            skipped: metrics.unavailable.len(),
            metrics,
            events,
            delivered,
            failed,
        }
    }

    /// Classify every sample, update state and collect the events to send.
    fn evaluate(&mut self, metrics: &SampleSet) -> Vec<AlertEvent> {
        let mut events = Vec::new();

        for sample in &metrics.samples {
            let breach = self.policy.classify(sample);
            let was_active = self.state.is_active(&sample.entity);
            self.state.observe(&sample.entity, sample.usage_percent);

            let transition = match (was_active, breach) {
                (false, true) => {
                    self.state.set_active(&sample.entity, true);
                    Some(Transition::EnteredBreach)
                }
                (true, true) => (self.settings.repeat == RepeatPolicy::EveryTick)
                    .then_some(Transition::StillBreaching),
                (true, false) => {
                    self.state.set_active(&sample.entity, false);
                    self.settings
                        .notify_on_recovery
                        .then_some(Transition::Recovered)
                }
                (false, false) => None,
            };

            match transition {
                Some(transition) => {
                    tracing::debug!(
                        entity = %sample.entity,
                        usage = sample.usage_percent,
                        %transition,
                        "Threshold transition"
                    );
                    events.push(AlertEvent {
                        entity: sample.entity.clone(),
                        usage_percent: sample.usage_percent,
                        transition,
                        timestamp: sample.timestamp,
                    });
                }
                None if breach => {
                    tracing::debug!(entity = %sample.entity, "Still in breach, notification suppressed");
                }
                None => {}
            }
        }

        // Unreadable-but-enumerated entities keep their state.
        let known: HashSet<Entity> = metrics
            .samples
            .iter()
            .map(|s| s.entity.clone())
            .chain(metrics.unavailable.iter().map(|u| u.entity.clone()))
            .collect();
        self.state.prune(&known);

        events
    }

    /// Send every event concurrently and wait for all of them.
    /// Returns `(delivered, failed)`.
    async fn dispatch(&self, events: &[AlertEvent]) -> (usize, usize) {
        if events.is_empty() {
            tracing::debug!("System OK, nothing to notify");
            return (0, 0);
        }

        let timeout = self.settings.dispatch_timeout;
        let notifier = self.notifier;
        let results = join_all(events.iter().map(move |event| async move {
            let result = match tokio::time::timeout(timeout, notifier.notify(event)).await {
                Ok(result) => result,
                Err(_) => Err(NotificationError::Timeout(timeout)),
            };
            (event, result)
        }))
        .await;

        let mut failed = 0usize;
        for (event, result) in &results {
            match result {
                Ok(()) => tracing::info!(
                    entity = %event.entity,
                    transition = %event.transition,
                    "Alert sent: {} usage at {:.1}%",
                    event.entity,
                    event.usage_percent
                ),
                Err(e) => {
                    failed += 1;
                    tracing::warn!("Failed to send alert for {}: {e}", event.entity);
                }
            }
        }

        (results.len() - failed, failed)
    }
}
