use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sample::SampleSet;

/// Host identity plus the samples shown in the snapshot report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostReport {
    pub timestamp: DateTime<Utc>,
    pub hostname: String,
    pub uptime_secs: u64,
    pub metrics: SampleSet,
}

impl HostReport {
    /// Uptime as `Nd HH:MM:SS`, or `HH:MM:SS` under a day.
    #[must_use]
    pub fn uptime_display(&self) -> String {
        let days = self.uptime_secs / 86_400;
        let hours = (self.uptime_secs % 86_400) / 3_600;
        let minutes = (self.uptime_secs % 3_600) / 60;
        let seconds = self.uptime_secs % 60;
        if days > 0 {
            format!("{days}d {hours:02}:{minutes:02}:{seconds:02}")
        } else {
            format!("{hours:02}:{minutes:02}:{seconds:02}")
        }
    }
}
