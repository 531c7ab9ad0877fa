use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use super::evaluator::{Evaluator, TickOutcome, TickStatus};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Drives an [`Evaluator`] on a fixed period.
///
/// Each tick is awaited before the timer is polled again, so ticks never
/// overlap. A tick that overruns the period delays the next one instead of
/// queueing a burst of catch-up ticks.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    period: Duration,
}

impl Scheduler {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_PERIOD),
        }
    }

    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Tick immediately, then every period, until `shutdown` resolves.
    /// Returns the number of ticks run.
    pub async fn run<F>(&self, evaluator: &mut Evaluator<'_>, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Scheduler started (period: {:?})", self.period);
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);
        let mut ticks = 0u64;

        loop {
            // Shutdown is checked first so an overdue timer cannot starve it.
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping after {ticks} tick(s)");
                    break;
                }
                _ = interval.tick() => {
                    let outcome = evaluator.tick().await;
                    ticks += 1;
                    log_outcome(ticks, &outcome);
                }
            }
        }

        ticks
    }

    /// Run exactly `count` ticks on the schedule and return their outcomes.
    pub async fn run_for(&self, evaluator: &mut Evaluator<'_>, count: usize) -> Vec<TickOutcome> {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut outcomes = Vec::with_capacity(count);
        for n in 1..=count {
            interval.tick().await;
            let outcome = evaluator.tick().await;
            log_outcome(n as u64, &outcome);
            outcomes.push(outcome);
        }
        outcomes
    }
}

fn log_outcome(tick: u64, outcome: &TickOutcome) {
    match outcome.status {
        TickStatus::Completed => tracing::info!(
            "Tick {tick} done: {} sample(s), {} skipped, {} alert(s) sent, {} failed",
            outcome.metrics.samples.len(),
            outcome.skipped,
            outcome.delivered,
            outcome.failed
        ),
        TickStatus::NoData => tracing::warn!("Tick {tick} produced no data"),
    }
}
