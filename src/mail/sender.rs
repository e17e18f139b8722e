//! Mail-sending collaborator: raw MIME out via SMTP.

use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::error::SendError;
use crate::mail::composer::{ForwardMessage, parse_mailbox};

/// What the mail service returned for a send.
///
/// A send counts as confirmed only when an identifier came back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

impl SendReceipt {
    pub fn confirmed(message_id: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.message_id.is_some()
    }
}

/// Sends already-rendered messages.
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Sender name for logging.
    fn name(&self) -> &str;

    /// Hand `raw` to the mail service for delivery to `recipients`.
    async fn send_raw_message(
        &self,
        sender: &str,
        recipients: &[String],
        raw: &[u8],
    ) -> Result<SendReceipt, SendError>;
}

/// Render and send a composed message.
pub async fn send_forward(
    mailer: &dyn MailSender,
    message: &ForwardMessage,
) -> Result<SendReceipt, SendError> {
    let raw = message.to_raw()?;
    mailer
        .send_raw_message(&message.sender, &message.recipients, &raw)
        .await
}

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

/// SMTP-backed sender.
#[derive(Clone)]
pub struct SmtpMailSender {
    transport: SmtpTransport,
}

impl SmtpMailSender {
    pub fn new(config: &SmtpConfig) -> Result<Self, SendError> {
        let creds = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );
        let transport = SmtpTransport::relay(&config.host)
            .map_err(|e| SendError::Transport(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(creds)
            .build();
        Ok(Self { transport })
    }
}

#[async_trait]
impl MailSender for SmtpMailSender {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send_raw_message(
        &self,
        sender: &str,
        recipients: &[String],
        raw: &[u8],
    ) -> Result<SendReceipt, SendError> {
        let from = envelope_address(sender)?;
        let to = recipients
            .iter()
            .map(|r| envelope_address(r))
            .collect::<Result<Vec<_>, _>>()?;
        let envelope = Envelope::new(Some(from), to)
            .map_err(|e| SendError::Transport(format!("Invalid envelope: {e}")))?;

        let transport = self.transport.clone();
        let raw = raw.to_vec();
        let response = tokio::task::spawn_blocking(move || transport.send_raw(&envelope, &raw))
            .await
            .map_err(|e| SendError::Transport(format!("SMTP send task panicked: {e}")))?
            .map_err(|e| SendError::Transport(format!("SMTP send failed: {e}")))?;

        if !response.is_positive() {
            return Ok(SendReceipt::default());
        }

        let reply = response
            .message()
            .map(|line| line.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let message_id = message_id_from_reply(&reply);
        info!(
            recipients = recipients.len(),
            message_id = message_id.as_deref().unwrap_or("-"),
            "Mail accepted by SMTP relay"
        );
        Ok(SendReceipt { message_id })
    }
}

impl std::fmt::Debug for SmtpMailSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailSender").finish_non_exhaustive()
    }
}

fn envelope_address(address: &str) -> Result<Address, SendError> {
    parse_mailbox(address)
        .map(|mailbox| mailbox.email)
        .map_err(|e| SendError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// Pull a message identifier out of an SMTP reply.
///
/// `250 2.0.0 Ok: queued as 4XyZ` yields `4XyZ`; any other non-empty reply
/// is kept whole.
pub fn message_id_from_reply(reply: &str) -> Option<String> {
    let reply = reply.trim();
    if reply.is_empty() {
        return None;
    }
    match reply.split_once("queued as ") {
        Some((_, rest)) => rest.split_whitespace().next().map(str::to_string),
        None => Some(reply.to_string()),
    }
}
