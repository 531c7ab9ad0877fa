use async_trait::async_trait;

use crate::domain::entities::alert_event::AlertEvent;
use crate::domain::ports::notifier::{NotificationError, Notifier};

/// Stand-in for email when SMTP settings are incomplete: the would-be alert
/// is written to the log and reported as delivered.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyNotifier;

impl LogOnlyNotifier {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogOnlyNotifier {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError> {
        tracing::warn!(
            entity = %event.entity,
            transition = %event.transition,
            "{} (email not configured)",
            event.subject()
        );
        Ok(())
    }
}
