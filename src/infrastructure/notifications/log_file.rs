use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::entities::alert_event::AlertEvent;
use crate::domain::ports::notifier::{NotificationError, Notifier};

const DEFAULT_LOG_PATH: &str = "~/.local/share/hostwatch/alerts.log";

/// Appends each alert as one JSON line.
pub struct LogFileNotifier {
    path: PathBuf,
}

impl LogFileNotifier {
    #[must_use]
    pub fn new(path: &str) -> Self {
        let expanded = shellexpand::tilde(path);
        Self {
            path: PathBuf::from(expanded.as_ref()),
        }
    }
}

fn append_line(path: &Path, line: &str) -> Result<(), NotificationError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            NotificationError::SendFailed(format!("cannot create log directory: {e}"))
        })?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| NotificationError::SendFailed(format!("cannot open alert log: {e}")))?;

    // One write per entry so concurrent appends never interleave.
    file.write_all(format!("{line}\n").as_bytes())
        .map_err(|e| NotificationError::SendFailed(format!("cannot write alert log: {e}")))
}

impl Default for LogFileNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_PATH)
    }
}

#[async_trait]
impl Notifier for LogFileNotifier {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError> {
        let entry = serde_json::json!({
            "timestamp": event.timestamp.to_rfc3339(),
            "entity": event.entity.to_string(),
            "usage_percent": event.usage_percent,
            "transition": event.transition.to_string(),
            "subject": event.subject(),
        });

        let line = serde_json::to_string(&entry)
            .map_err(|e| NotificationError::SendFailed(format!("JSON serialization failed: {e}")))?;

        // File I/O stays off the async workers.
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_line(&path, &line))
            .await
            .map_err(|e| NotificationError::SendFailed(format!("alert log task failed: {e}")))?
    }
}
