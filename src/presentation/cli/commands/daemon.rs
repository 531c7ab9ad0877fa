use std::future::Future;

use crate::application::services::evaluator::Evaluator;
use crate::application::services::scheduler::Scheduler;

/// Run the monitoring loop until `shutdown` resolves.
///
/// The CLI passes Ctrl+C (SIGINT) as the shutdown future. SIGTERM is not
/// handled; under systemd use `KillSignal=SIGINT`.
///
/// Failing ticks are logged by the scheduler and never stop the daemon.
pub async fn run_daemon<F>(scheduler: &Scheduler, evaluator: &mut Evaluator<'_>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tracing::info!(
        "Daemon started (interval: {:?}, repeat: {})",
        scheduler.period(),
        evaluator.settings().repeat
    );
    let ticks = scheduler.run(evaluator, shutdown).await;
    let stats = evaluator.stats();
    tracing::info!(
        ticks,
        alerts = stats.events,
        delivered = stats.delivered,
        failed = stats.failed,
        "Daemon stopped"
    );
    println!("\nStopping hostwatch...");
}

/// Resolves on Ctrl+C. If the signal handler cannot be installed the
/// daemon keeps running and must be killed externally.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
