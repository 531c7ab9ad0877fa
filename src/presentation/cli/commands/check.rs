use colored::Colorize;
use serde::Serialize;

use crate::application::services::evaluator::{Evaluator, TickOutcome, TickStatus};
use crate::domain::entities::alert_event::AlertEvent;
use crate::domain::entities::host::HostReport;
use crate::domain::value_objects::thresholds::ThresholdPolicy;
use crate::infrastructure::collectors::sysinfo_collector::SysinfoCollector;
use crate::presentation::cli::formatters::status_fmt::print_report;

/// JSON shape of a `check` run.
#[derive(Debug, Serialize)]
pub struct CheckSummary<'a> {
    pub report: HostReport,
    pub events: &'a [AlertEvent],
    pub delivered: usize,
    pub failed: usize,
}

impl<'a> CheckSummary<'a> {
    #[must_use]
    pub fn from_outcome(outcome: &'a TickOutcome, report: HostReport) -> Self {
        Self {
            report,
            events: &outcome.events,
            delivered: outcome.delivered,
            failed: outcome.failed,
        }
    }
}

/// Runs one evaluation tick, then prints the snapshot report.
///
/// Alert delivery failures are reported but never turn into an error.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub async fn run_check(
    evaluator: &mut Evaluator<'_>,
    policy: &ThresholdPolicy,
    json: bool,
) -> anyhow::Result<()> {
    let outcome = evaluator.tick().await;
    let report = SysinfoCollector::host_report(outcome.metrics.clone());

    if json {
        let summary = CheckSummary::from_outcome(&outcome, report);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_report(&report, policy);
    println!();

    if outcome.status == TickStatus::NoData {
        eprintln!("{}", "No metrics could be read; nothing evaluated.".yellow());
        return Ok(());
    }
    print_event_summary(&outcome);
    Ok(())
}

fn print_event_summary(outcome: &TickOutcome) {
    if outcome.events.is_empty() {
        println!("{}", "✓ All resources within thresholds".green());
        return;
    }
    for event in &outcome.events {
        println!("  {} {}", "⚠".yellow().bold(), event.subject());
    }
    if outcome.failed > 0 {
        println!(
            "{}",
            format!(
                "{} of {} alert(s) could not be delivered",
                outcome.failed,
                outcome.events.len()
            )
            .red()
        );
    }
}
