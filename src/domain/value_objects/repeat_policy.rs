use serde::{Deserialize, Serialize};

/// How often a sustained breach is notified
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Notify once when an entity enters breach; re-arm after recovery
    #[default]
    Once,
    /// Notify on every tick the entity is above its threshold
    EveryTick,
}

impl std::fmt::Display for RepeatPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Once => write!(f, "once"),
            Self::EveryTick => write!(f, "every_tick"),
        }
    }
}
