//! Mail transport for notifications.
//!
//! Uses SMTP via lettre. Credentials are supplied per send rather than at
//! construction, because they are resolved from the secret backend on every
//! invocation.

use std::future::Future;

use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use uuid::Uuid;

use registration_notifier_core::{DeliveryReceipt, NotificationMessage};

use crate::config::SmtpConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum TransportError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// The sender address is not a valid mailbox.
    #[error("Invalid sender address: {0}")]
    InvalidSender(String),

    /// Every recipient was rejected before submission.
    #[error("No deliverable recipients (rejected: {})", .0.join(", "))]
    NoValidRecipients(Vec<String>),
}

/// Mail account credentials.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct MailCredentials {
    /// Account identity, also used as the sender address
    pub user: String,
    pub password: SecretString,
}

impl std::fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailCredentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Something that can deliver a [`NotificationMessage`].
pub trait MailTransport: Send + Sync {
    /// Submit one message.
    fn send(
        &self,
        credentials: &MailCredentials,
        message: &NotificationMessage,
    ) -> impl Future<Output = Result<DeliveryReceipt, TransportError>> + Send;
}

/// A lettre message plus the bookkeeping for its receipt.
#[derive(Debug)]
pub struct PreparedMessage {
    pub message: Message,
    pub message_id: String,
    /// Recipients placed on the envelope.
    pub accepted: Vec<String>,
    /// Recipients lettre could not parse as mailboxes; not submitted.
    pub rejected: Vec<String>,
}

/// Convert a notification into a multipart lettre message.
///
/// Recipients that fail mailbox parsing are moved to `rejected` instead of
/// failing the whole message. An unparseable reply-to is dropped.
///
/// # Errors
///
/// Returns error if the sender is invalid, no recipient survives, or the
/// message cannot be assembled.
pub fn prepare_message(
    notification: &NotificationMessage,
) -> Result<PreparedMessage, TransportError> {
    let from_address: Address = notification
        .from
        .address
        .parse()
        .map_err(|_| TransportError::InvalidSender(notification.from.address.clone()))?;

    let message_id = format!("<{}@{}>", Uuid::new_v4(), from_address.domain());
    let from = Mailbox::new(Some(notification.from.name.clone()), from_address);

    let mut builder = Message::builder()
        .from(from)
        .subject(notification.subject.clone())
        .message_id(Some(message_id.clone()));

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for recipient in &notification.to {
        match recipient.as_str().parse::<Address>() {
            Ok(address) => {
                builder = builder.to(Mailbox::new(None, address));
                accepted.push(recipient.to_string());
            }
            Err(e) => {
                tracing::warn!(
                    recipient = %recipient,
                    error = %e,
                    "Skipping unparseable recipient"
                );
                rejected.push(recipient.to_string());
            }
        }
    }

    if accepted.is_empty() {
        return Err(TransportError::NoValidRecipients(rejected));
    }

    if let Some(reply_to) = &notification.reply_to {
        match reply_to.parse::<Address>() {
            Ok(address) => builder = builder.reply_to(Mailbox::new(None, address)),
            Err(e) => {
                tracing::warn!(reply_to = %reply_to, error = %e, "Dropping invalid reply-to");
            }
        }
    }

    let message = builder.multipart(
        MultiPart::alternative()
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(notification.text.clone()),
            )
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(notification.html.clone()),
            ),
    )?;

    Ok(PreparedMessage {
        message,
        message_id,
        accepted,
        rejected,
    })
}

/// SMTP relay transport.
#[derive(Debug, Clone)]
pub struct SmtpMailTransport {
    host: String,
    port: u16,
}

impl SmtpMailTransport {
    /// Create a transport for the configured relay.
    #[must_use]
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }

    fn mailer(
        &self,
        credentials: &MailCredentials,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, SmtpError> {
        let credentials = Credentials::new(
            credentials.user.clone(),
            credentials.password.expose_secret().to_string(),
        );

        Ok(AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?
            .port(self.port)
            .credentials(credentials)
            .build())
    }
}

impl MailTransport for SmtpMailTransport {
    async fn send(
        &self,
        credentials: &MailCredentials,
        message: &NotificationMessage,
    ) -> Result<DeliveryReceipt, TransportError> {
        let prepared = prepare_message(message)?;
        let mailer = self.mailer(credentials)?;

        let response = mailer.send(prepared.message).await?;
        let lines: Vec<String> = response.message().map(ToString::to_string).collect();

        tracing::debug!(
            host = %self.host,
            port = self.port,
            code = %response.code(),
            "SMTP relay accepted message"
        );

        Ok(DeliveryReceipt {
            message_id: prepared.message_id,
            accepted: prepared.accepted,
            rejected: prepared.rejected,
            response: format!("{} {}", response.code(), lines.join(" ")),
        })
    }
}
