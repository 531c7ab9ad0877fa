pub mod composite;
pub mod email;
pub mod log_file;
pub mod log_only;
pub mod terminal;
pub mod webhook;

use std::time::Duration;

use crate::application::config::AppConfig;
use crate::domain::ports::notifier::Notifier;

pub use composite::CompositeNotifier;
pub use email::EmailNotifier;
pub use log_file::LogFileNotifier;
pub use log_only::LogOnlyNotifier;
pub use terminal::TerminalNotifier;
pub use webhook::WebhookNotifier;

/// Assemble the channels enabled in `config`.
///
/// Email is used when its settings are complete; otherwise a warning is
/// logged once and alerts go to [`LogOnlyNotifier`]. A channel that cannot
/// be built is skipped with a warning. Nothing here opens a connection.
#[must_use]
pub fn build_notifier(config: &AppConfig) -> CompositeNotifier {
    let timeout = Duration::from_secs(config.alerting.dispatch_timeout_secs.max(1));
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();

    match config.email.credentials() {
        Ok(creds) => match EmailNotifier::new(&creds, timeout) {
            Ok(email) => notifiers.push(Box::new(email)),
            Err(e) => {
                tracing::warn!("Email channel disabled: {e}");
                notifiers.push(Box::new(LogOnlyNotifier::new()));
            }
        },
        Err(e) => {
            tracing::warn!("{e}; alerts will only be logged");
            notifiers.push(Box::new(LogOnlyNotifier::new()));
        }
    }

    if config.notifications.terminal {
        notifiers.push(Box::new(TerminalNotifier::new()));
    }

    if let Some(ref path) = config.notifications.log_file {
        notifiers.push(Box::new(LogFileNotifier::new(path)));
    }

    if let Some(ref url) = config.notifications.webhook_url {
        match WebhookNotifier::new(url.clone(), timeout) {
            Ok(webhook) => notifiers.push(Box::new(webhook)),
            Err(e) => tracing::warn!("Webhook channel disabled: {e}"),
        }
    }

    CompositeNotifier::new(notifiers)
}
