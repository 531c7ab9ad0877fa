use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hostwatch: host resource threshold monitor
///
/// Samples CPU, memory and disk usage, compares them against thresholds
/// and sends an alert when a resource enters breach.
#[derive(Parser, Debug)]
#[command(name = "hostwatch")]
#[command(version, about, long_about)]
pub struct Cli {
    /// Subcommand to execute (defaults to `check`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to custom config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sample once, send alerts for breaches and print the report
    #[command(alias = "c")]
    Check {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the current usage report without alerting
    #[command(alias = "r")]
    Report {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Keep checking on a fixed interval until Ctrl+C
    #[command(alias = "d")]
    Daemon {
        /// Interval in seconds (default: config)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}
