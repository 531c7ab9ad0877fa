use async_trait::async_trait;
use futures::future::join_all;

use crate::domain::entities::alert_event::AlertEvent;
use crate::domain::ports::notifier::{NotificationError, Notifier};

/// Forwards notifications to multiple notifiers.
///
/// All notifiers run concurrently, so a slow channel does not hold back the
/// others. Returns the first error in channel order (if any).
pub struct CompositeNotifier {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl CompositeNotifier {
    #[must_use]
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for CompositeNotifier {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl Notifier for CompositeNotifier {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError> {
        let results = join_all(self.notifiers.iter().map(|n| n.notify(event))).await;

        let mut first_error = None;
        for e in results.into_iter().filter_map(Result::err) {
            tracing::warn!("Notification channel failed: {e}");
            if first_error.is_none() {
                first_error = Some(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
