use std::fmt::Write as _;

use chrono::Local;
use colored::{ColoredString, Colorize};

use crate::domain::entities::host::HostReport;
use crate::domain::entities::sample::{Entity, MetricSample};
use crate::domain::value_objects::thresholds::ThresholdPolicy;

/// Usage within this many points of the threshold is shown as a warning.
const WARN_MARGIN: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Ok,
    Warn,
    Breach,
}

fn level(value: f64, threshold: f64) -> Level {
    if value > threshold {
        Level::Breach
    } else if value >= threshold - WARN_MARGIN {
        Level::Warn
    } else {
        Level::Ok
    }
}

#[must_use]
pub fn progress_bar(value: f64, threshold: f64, width: usize) -> String {
    let ratio = (value / 100.0).clamp(0.0, 1.0);
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);

    let bar_filled = "█".repeat(filled);
    let bar_empty = "░".repeat(empty);

    let colored_bar = match level(value, threshold) {
        Level::Breach => bar_filled.red().bold(),
        Level::Warn => bar_filled.yellow(),
        Level::Ok => bar_filled.green(),
    };

    format!("{colored_bar}{bar_empty}")
}

#[must_use]
pub fn colorize_percent(value: f64, threshold: f64) -> ColoredString {
    let text = format!("{value:.1}%");
    match level(value, threshold) {
        Level::Breach => text.red().bold(),
        Level::Warn => text.yellow(),
        Level::Ok => text.green(),
    }
}

pub fn print_section_header(title: &str) {
    println!("{}", title.bold().cyan());
    let display_width = title.chars().count();
    println!("{}", "─".repeat(display_width).cyan());
}

fn metric_line(sample: &MetricSample, policy: &ThresholdPolicy, width: usize) -> String {
    let threshold = policy.threshold_for(&sample.entity);
    let marker = if policy.classify(sample) {
        format!("  ▲ over {threshold:.0}%").red().bold().to_string()
    } else {
        String::new()
    };
    format!(
        "{} {}{marker}",
        progress_bar(sample.usage_percent, threshold, width),
        colorize_percent(sample.usage_percent, threshold)
    )
}

/// Render the snapshot report as display lines, without the header.
#[must_use]
pub fn render_report(report: &HostReport, policy: &ThresholdPolicy) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Hostname: {}", report.hostname);
    let _ = writeln!(out, "  System Uptime: {}", report.uptime_display());

    for entity in [Entity::Cpu, Entity::Memory] {
        match report.metrics.get(&entity) {
            Some(sample) => {
                let _ = writeln!(
                    out,
                    "  {:<8} {}",
                    format!("{entity}:"),
                    metric_line(sample, policy, 30)
                );
            }
            None => {
                let _ = writeln!(out, "  {:<8} {}", format!("{entity}:"), "n/a".dimmed());
            }
        }
    }

    let disks: Vec<_> = report.metrics.disks().collect();
    if !disks.is_empty() || !report.metrics.unavailable.is_empty() {
        let _ = writeln!(out, "  Disk Usage:");
        for sample in disks {
            let mount = match &sample.entity {
                Entity::Disk(mount) => mount.as_str(),
                _ => continue,
            };
            let _ = writeln!(
                out,
                "    {mount:<16} {}",
                metric_line(sample, policy, 20)
            );
        }
        for missing in &report.metrics.unavailable {
            let _ = writeln!(
                out,
                "    {:<16} {}",
                missing.entity.to_string(),
                format!("unavailable ({})", missing.reason).dimmed()
            );
        }
    }

    out
}

/// Print the snapshot report under a timestamped header.
pub fn print_report(report: &HostReport, policy: &ThresholdPolicy) {
    let at = report
        .timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S");
    print_section_header(&format!("System Monitor Report - {at}"));
    print!("{}", render_report(report, policy));
}
