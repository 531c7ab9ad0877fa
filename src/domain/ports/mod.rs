pub mod metrics_source;
pub mod notifier;

pub use metrics_source::{CollectionError, MetricsSource};
pub use notifier::{NotificationError, Notifier};
