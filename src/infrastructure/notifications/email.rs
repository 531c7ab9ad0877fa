//! SMTP delivery of alert events.
//!
//! Uses the `lettre` async transport over STARTTLS (implicit TLS on port 465).
//! The transport is configured in [`EmailNotifier::new`] but connects only
//! when a message is actually sent.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::application::config::EmailCredentials;
use crate::domain::entities::alert_event::AlertEvent;
use crate::domain::ports::notifier::{NotificationError, Notifier};

const IMPLICIT_TLS_PORT: u16 = 465;

pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// # Errors
    ///
    /// Returns `NotificationError::ChannelUnavailable` if an address does not
    /// parse or the TLS parameters for the relay cannot be built.
    pub fn new(creds: &EmailCredentials, timeout: Duration) -> Result<Self, NotificationError> {
        let from: Mailbox = creds.smtp_user.parse().map_err(|e| {
            NotificationError::ChannelUnavailable(format!(
                "invalid sender address {:?}: {e}",
                creds.smtp_user
            ))
        })?;
        let to: Mailbox = creds.alert_email.parse().map_err(|e| {
            NotificationError::ChannelUnavailable(format!(
                "invalid recipient address {:?}: {e}",
                creds.alert_email
            ))
        })?;

        let builder = if creds.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&creds.smtp_server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&creds.smtp_server)
        }
        .map_err(|e| {
            NotificationError::ChannelUnavailable(format!(
                "cannot configure SMTP relay {}: {e}",
                creds.smtp_server
            ))
        })?;

        let transport = builder
            .port(creds.smtp_port)
            .credentials(Credentials::new(
                creds.smtp_user.clone(),
                creds.smtp_password.clone(),
            ))
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            transport,
            from,
            to,
        })
    }

    fn build_message(&self, event: &AlertEvent) -> Result<Message, NotificationError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(event.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(event.body())
            .map_err(|e| NotificationError::SendFailed(format!("cannot build email: {e}")))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError> {
        let message = self.build_message(event)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SMTP delivery failed: {e}")))?;
        tracing::debug!(to = %self.to, "Alert email sent: {}", event.subject());
        Ok(())
    }
}
