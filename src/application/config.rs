use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::application::services::evaluator::EvaluatorSettings;
use crate::domain::value_objects::repeat_policy::RepeatPolicy;
use crate::domain::value_objects::thresholds::ThresholdPolicy;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("email notifications not configured, missing: {}", .missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },
}

/// Top-level application configuration: defaults, then TOML, then environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub alerting: AlertingConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

/// Polling cadence and sampling limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_sample_timeout")]
    pub sample_timeout_secs: u64,
}

/// Usage percentages above which an entity is in breach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_cpu")]
    pub cpu_percent: f64,
    #[serde(default = "default_memory")]
    pub memory_percent: f64,
    #[serde(default = "default_disk")]
    pub disk_percent: f64,
}

/// When and how long to try notifying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertingConfig {
    #[serde(default)]
    pub repeat: RepeatPolicy,
    #[serde(default)]
    pub notify_on_recovery: bool,
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_secs: u64,
}

/// Extra notification channels besides email.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub terminal: bool,
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// SMTP settings. All of server, user, password and recipient are required
/// for email delivery; otherwise alerts are only logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub smtp_server: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_user: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    #[serde(default)]
    pub alert_email: Option<String>,
}

/// Validated SMTP credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCredentials {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
    pub alert_email: String,
}

// --- Defaults ---

const fn default_interval() -> u64 {
    60
}

const fn default_sample_timeout() -> u64 {
    10
}

const fn default_cpu() -> f64 {
    80.0
}

const fn default_memory() -> f64 {
    80.0
}

const fn default_disk() -> f64 {
    90.0
}

const fn default_dispatch_timeout() -> u64 {
    15
}

const fn default_smtp_port() -> u16 {
    587
}

// --- Default impls ---

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            sample_timeout_secs: default_sample_timeout(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            cpu_percent: default_cpu(),
            memory_percent: default_memory(),
            disk_percent: default_disk(),
        }
    }
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            repeat: RepeatPolicy::default(),
            notify_on_recovery: false,
            dispatch_timeout_secs: default_dispatch_timeout(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: None,
            smtp_port: default_smtp_port(),
            smtp_user: None,
            smtp_password: None,
            alert_email: None,
        }
    }
}

impl EmailConfig {
    /// Check that every field needed to send mail is present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Incomplete` naming each missing setting.
    pub fn credentials(&self) -> Result<EmailCredentials, ConfigError> {
        fn present(value: Option<&String>) -> Option<String> {
            value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_owned)
        }

        let server = present(self.smtp_server.as_ref());
        let user = present(self.smtp_user.as_ref());
        let password = present(self.smtp_password.as_ref());
        let recipient = present(self.alert_email.as_ref());

        match (server, user, password, recipient) {
            (Some(smtp_server), Some(smtp_user), Some(smtp_password), Some(alert_email)) => {
                Ok(EmailCredentials {
                    smtp_server,
                    smtp_port: self.smtp_port,
                    smtp_user,
                    smtp_password,
                    alert_email,
                })
            }
            (server, user, password, recipient) => {
                let missing = [
                    (server.is_none(), ENV_SMTP_SERVER),
                    (user.is_none(), ENV_SMTP_USER),
                    (password.is_none(), ENV_APP_PASSWORD),
                    (recipient.is_none(), ENV_ALERT_EMAIL),
                ]
                .into_iter()
                .filter_map(|(is_missing, name)| is_missing.then_some(name))
                .collect();
                Err(ConfigError::Incomplete { missing })
            }
        }
    }
}

// --- Environment ---

pub const ENV_ALERT_EMAIL: &str = "ALERT_EMAIL";
pub const ENV_SMTP_SERVER: &str = "SMTP_SERVER";
pub const ENV_SMTP_PORT: &str = "SMTP_PORT";
pub const ENV_SMTP_USER: &str = "SMTP_USER";
pub const ENV_APP_PASSWORD: &str = "APP_PASSWORD";
pub const ENV_CPU_THRESHOLD: &str = "HOSTWATCH_CPU_THRESHOLD";
pub const ENV_MEMORY_THRESHOLD: &str = "HOSTWATCH_MEMORY_THRESHOLD";
pub const ENV_DISK_THRESHOLD: &str = "HOSTWATCH_DISK_THRESHOLD";
pub const ENV_INTERVAL_SECS: &str = "HOSTWATCH_INTERVAL_SECS";
pub const ENV_NOTIFY_EVERY_TICK: &str = "HOSTWATCH_NOTIFY_EVERY_TICK";

fn parse_env<T: std::str::FromStr>(name: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {name}={raw:?}: not a valid value");
            None
        }
    }
}

fn parse_flag(name: &str, raw: Option<String>) -> Option<bool> {
    let raw = raw?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!("Ignoring {name}={raw:?}: expected true or false");
            None
        }
    }
}

// --- AppConfig methods ---

impl AppConfig {
    /// Build the effective configuration: the TOML file at `path` (or the
    /// default location, if it exists) overlaid with the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file cannot be read, or if
    /// any config file present is not valid TOML.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => match Self::config_path() {
                Some(default_path) if default_path.exists() => Self::load_from(&default_path)?,
                _ => Self::default(),
            },
        };
        config.apply_env_with(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML content is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Overlay environment variables, read through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = text(ENV_ALERT_EMAIL) {
            self.email.alert_email = Some(v);
        }
        if let Some(v) = text(ENV_SMTP_SERVER) {
            self.email.smtp_server = Some(v);
        }
        if let Some(v) = text(ENV_SMTP_USER) {
            self.email.smtp_user = Some(v);
        }
        if let Some(v) = text(ENV_APP_PASSWORD) {
            self.email.smtp_password = Some(v);
        }
        if let Some(v) = parse_env(ENV_SMTP_PORT, text(ENV_SMTP_PORT)) {
            self.email.smtp_port = v;
        }
        if let Some(v) = parse_env(ENV_CPU_THRESHOLD, text(ENV_CPU_THRESHOLD)) {
            self.thresholds.cpu_percent = v;
        }
        if let Some(v) = parse_env(ENV_MEMORY_THRESHOLD, text(ENV_MEMORY_THRESHOLD)) {
            self.thresholds.memory_percent = v;
        }
        if let Some(v) = parse_env(ENV_DISK_THRESHOLD, text(ENV_DISK_THRESHOLD)) {
            self.thresholds.disk_percent = v;
        }
        if let Some(v) = parse_env(ENV_INTERVAL_SECS, text(ENV_INTERVAL_SECS)) {
            self.general.interval_secs = v;
        }
        if let Some(every_tick) = parse_flag(ENV_NOTIFY_EVERY_TICK, text(ENV_NOTIFY_EVERY_TICK)) {
            self.alerting.repeat = if every_tick {
                RepeatPolicy::EveryTick
            } else {
                RepeatPolicy::Once
            };
        }
    }

    /// Polling period, never shorter than one second.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.general.interval_secs.max(1))
    }

    #[must_use]
    pub fn evaluator_settings(&self) -> EvaluatorSettings {
        EvaluatorSettings {
            repeat: self.alerting.repeat,
            notify_on_recovery: self.alerting.notify_on_recovery,
            sample_timeout: Duration::from_secs(self.general.sample_timeout_secs.max(1)),
            dispatch_timeout: Duration::from_secs(self.alerting.dispatch_timeout_secs.max(1)),
        }
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hostwatch").join("config.toml"))
    }
}

impl From<&ThresholdConfig> for ThresholdPolicy {
    fn from(config: &ThresholdConfig) -> Self {
        // Clamp percentages to valid range
        Self::new(
            config.cpu_percent.clamp(0.0, 100.0),
            config.memory_percent.clamp(0.0, 100.0),
            config.disk_percent.clamp(0.0, 100.0),
        )
    }
}
