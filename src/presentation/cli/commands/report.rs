use std::time::Duration;

use anyhow::Context;

use crate::domain::ports::metrics_source::MetricsSource;
use crate::domain::value_objects::thresholds::ThresholdPolicy;
use crate::infrastructure::collectors::sysinfo_collector::SysinfoCollector;
use crate::presentation::cli::formatters::status_fmt::print_report;

/// Samples once and prints the report. No alert state is touched and
/// nothing is sent.
///
/// # Errors
///
/// Returns an error if sampling fails or times out, or if JSON
/// serialization fails.
pub async fn run_report(
    source: &dyn MetricsSource,
    policy: &ThresholdPolicy,
    sample_timeout: Duration,
    json: bool,
) -> anyhow::Result<()> {
    let metrics = tokio::time::timeout(sample_timeout, source.sample_all())
        .await
        .with_context(|| format!("Sampling timed out after {sample_timeout:?}"))?
        .context("Failed to sample system metrics")?;
    let report = SysinfoCollector::host_report(metrics);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, policy);
    }
    Ok(())
}
