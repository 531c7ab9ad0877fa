use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use super::sample::Entity;

/// How an entity's breach flag moved during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    EnteredBreach,
    StillBreaching,
    Recovered,
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnteredBreach => write!(f, "entered-breach"),
            Self::StillBreaching => write!(f, "still-breaching"),
            Self::Recovered => write!(f, "recovered"),
        }
    }
}

/// Transient event produced by a tick and handed straight to the notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub entity: Entity,
    pub usage_percent: f64,
    pub transition: Transition,
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    #[must_use]
    pub const fn is_recovery(&self) -> bool {
        matches!(self.transition, Transition::Recovered)
    }

    #[must_use]
    pub fn subject(&self) -> String {
        if self.is_recovery() {
            format!(
                "Resolved: {} usage is back to {:.1}%",
                self.entity, self.usage_percent
            )
        } else {
            format!(
                "Alert: {} usage is at {:.1}%",
                self.entity, self.usage_percent
            )
        }
    }

    #[must_use]
    pub fn body(&self) -> String {
        let at = self
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S");
        if self.is_recovery() {
            format!(
                "{} recovered: Current usage is at {:.1}% as of {at}. No action is required.",
                self.entity, self.usage_percent
            )
        } else {
            format!(
                "{} warning: Current usage is at {:.1}% as of {at}. Please check your system.",
                self.entity, self.usage_percent
            )
        }
    }
}
