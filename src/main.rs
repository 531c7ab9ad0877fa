use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use hostwatch::application::config::AppConfig;
use hostwatch::application::services::evaluator::Evaluator;
use hostwatch::application::services::scheduler::Scheduler;
use hostwatch::domain::value_objects::thresholds::ThresholdPolicy;
use hostwatch::infrastructure::collectors::sysinfo_collector::SysinfoCollector;
use hostwatch::infrastructure::notifications::build_notifier;
use hostwatch::presentation::cli::app::{Cli, Commands};
use hostwatch::presentation::cli::commands::check::run_check;
use hostwatch::presentation::cli::commands::daemon::{ctrl_c, run_daemon};
use hostwatch::presentation::cli::commands::report::run_report;

fn print_banner() {
    println!("{}", "━".repeat(40).cyan());
    println!("{}", "  HOSTWATCH · Resource Monitor".bold().cyan());
    println!("{}", "━".repeat(40).cyan());
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    // A missing .env is normal; real env vars still apply.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env loaded: {e}");
    }

    let config = AppConfig::load(cli.config.as_deref())?;

    // Manual DI: main.rs is the only place that knows concrete types
    let settings = config.evaluator_settings();
    let collector = SysinfoCollector::new().with_volume_timeout(settings.sample_timeout / 2);
    let policy = ThresholdPolicy::from(&config.thresholds);

    match cli.command.unwrap_or(Commands::Check { json: false }) {
        Commands::Report { json } => {
            run_report(&collector, &policy, settings.sample_timeout, json).await?;
        }
        Commands::Check { json } => {
            let notifier = build_notifier(&config);
            let mut evaluator = Evaluator::new(&collector, &policy, &notifier, settings);
            run_check(&mut evaluator, &policy, json).await?;
        }
        Commands::Daemon { interval } => {
            let period = interval.map_or_else(
                || config.interval(),
                |secs| Duration::from_secs(secs.max(1)),
            );
            let notifier = build_notifier(&config);
            tracing::info!("{} notification channel(s) active", notifier.len());
            let mut evaluator = Evaluator::new(&collector, &policy, &notifier, settings);
            print_banner();
            run_daemon(&Scheduler::new(period), &mut evaluator, ctrl_c()).await;
        }
    }

    Ok(())
}
