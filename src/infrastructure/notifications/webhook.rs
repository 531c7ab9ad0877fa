use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::entities::alert_event::{AlertEvent, Transition};
use crate::domain::ports::notifier::{NotificationError, Notifier};

/// Webhook notification format, auto-detected from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WebhookFormat {
    Slack,
    Discord,
    Generic,
}

/// Posts alert events to an HTTP webhook endpoint.
///
/// Supports Slack (colored attachments), Discord (embeds) and a generic JSON
/// payload. The format is auto-detected from the webhook URL.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
    format: WebhookFormat,
}

impl WebhookNotifier {
    /// Creates a new webhook notifier targeting the given URL.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::ChannelUnavailable` if the HTTP client
    /// cannot be initialized (e.g. TLS backend failure).
    pub fn new(url: String, timeout: Duration) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                NotificationError::ChannelUnavailable(format!("cannot build HTTP client: {e}"))
            })?;

        let format = detect_format(&url);
        Ok(Self {
            url,
            client,
            format,
        })
    }

    fn payload(&self, event: &AlertEvent) -> Value {
        match self.format {
            WebhookFormat::Slack => format_slack(event),
            WebhookFormat::Discord => format_discord(event),
            WebhookFormat::Generic => format_generic(event),
        }
    }
}

fn detect_format(url: &str) -> WebhookFormat {
    // Extract host from URL (scheme://host/path) to avoid substring false positives
    let host = url
        .split("//")
        .nth(1)
        .and_then(|s| s.split('/').next())
        .and_then(|h| h.split(':').next())
        .unwrap_or("");

    if host == "hooks.slack.com" {
        WebhookFormat::Slack
    } else if host == "discord.com" || host == "discordapp.com" {
        WebhookFormat::Discord
    } else {
        WebhookFormat::Generic
    }
}

const fn color_hex(transition: Transition) -> &'static str {
    match transition {
        Transition::EnteredBreach => "#E74C3C",
        Transition::StillBreaching => "#E67E22",
        Transition::Recovered => "#2ECC71",
    }
}

const fn color_decimal(transition: Transition) -> u32 {
    match transition {
        Transition::EnteredBreach => 0x00_E7_4C_3C,
        Transition::StillBreaching => 0x00_E6_7E_22,
        Transition::Recovered => 0x00_2E_CC_71,
    }
}

fn format_slack(event: &AlertEvent) -> Value {
    json!({
        "text": event.subject(),
        "attachments": [{
            "color": color_hex(event.transition),
            "text": event.body(),
        }]
    })
}

fn format_discord(event: &AlertEvent) -> Value {
    json!({
        "username": "hostwatch",
        "embeds": [{
            "title": event.subject(),
            "description": event.body(),
            "color": color_decimal(event.transition),
            "timestamp": event.timestamp.to_rfc3339()
        }]
    })
}

fn format_generic(event: &AlertEvent) -> Value {
    json!({
        "source": "hostwatch",
        "entity": event.entity.to_string(),
        "usage_percent": event.usage_percent,
        "transition": event.transition.to_string(),
        "subject": event.subject(),
        "body": event.body(),
        "timestamp": event.timestamp.to_rfc3339()
    })
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.payload(event))
            .send()
            .await
            .map_err(|e| NotificationError::SendFailed(format!("webhook request failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotificationError::SendFailed(format!(
                "webhook returned HTTP {}",
                response.status()
            )))
        }
    }
}
