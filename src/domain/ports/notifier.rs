use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::alert_event::AlertEvent;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("failed to send notification: {0}")]
    SendFailed(String),
    #[error("notification channel unavailable: {0}")]
    ChannelUnavailable(String),
    #[error("notification timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one alert event.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError` if the notification fails to send
    /// or the channel is unavailable.
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError>;
}
