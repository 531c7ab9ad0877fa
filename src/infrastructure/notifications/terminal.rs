use async_trait::async_trait;
use colored::Colorize;

use crate::domain::entities::alert_event::{AlertEvent, Transition};
use crate::domain::ports::notifier::{NotificationError, Notifier};

const SEPARATOR_WIDTH: usize = 70;

/// Prints alert banners to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl TerminalNotifier {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for TerminalNotifier {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError> {
        println!("{}", render(event));
        Ok(())
    }
}

fn render(event: &AlertEvent) -> String {
    let separator = "\u{2500}".repeat(SEPARATOR_WIDTH);
    format!(
        "\n{sep}\n{} {}\n{sep}\n{}\n{sep}\n",
        transition_badge(event.transition),
        event.subject().bold(),
        event.body(),
        sep = separator.dimmed()
    )
}

#[must_use]
fn transition_badge(transition: Transition) -> String {
    match transition {
        Transition::EnteredBreach => " ALERT ".on_red().white().bold().to_string(),
        Transition::StillBreaching => " STILL HIGH ".on_yellow().black().bold().to_string(),
        Transition::Recovered => " RESOLVED ".on_green().black().to_string(),
    }
}
