//! Registration notification flow.
//!
//! # Flow
//!
//! 1. Read every admin record
//! 2. Keep opted-in admins with usable, unique addresses
//! 3. Stop quietly if nobody is left
//! 4. Resolve the mail credentials; stop (logged, not failed) if missing
//! 5. Render the bodies and submit one message
//! 6. Report transport failures to the caller so the platform can retry
//!
//! [`RegistrationNotifier::handle`] is the whole invocation. It owns no
//! global state; every collaborator is passed in at construction.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use registration_notifier_core::{DeliveryReceipt, Sender, UserCreatedEvent, recipients};

use super::email::{MailCredentials, MailTransport, TransportError};
use super::render::compose_message;
use super::secrets::{SecretError, SecretProvider};
use crate::config::{MessageConfig, SecretsConfig};
use crate::db::{AdminDirectory, DirectoryError};

/// Errors that fail an invocation.
///
/// Missing recipients and missing credentials are not errors; see [`Outcome`].
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Admin records could not be read.
    #[error("failed to read admins: {0}")]
    Directory(#[from] DirectoryError),

    /// The secret backend failed (as opposed to the secret being absent).
    #[error("failed to resolve mail credentials: {0}")]
    Secrets(#[from] SecretError),

    /// A body template failed to render.
    #[error("failed to render notification: {0}")]
    Render(#[from] askama::Error),

    /// The mail transport rejected the message or could not be reached.
    #[error("failed to send notification: {0}")]
    Transport(#[from] TransportError),
}

/// How a successful invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The message was accepted by the transport.
    Sent(DeliveryReceipt),
    /// No admin wants or can receive the notification.
    NoRecipients,
    /// A mail secret is absent or empty. Logged as an error; a retry cannot fix it.
    MissingCredentials,
}

/// Settings the notifier needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub message: MessageConfig,
    pub secrets: SecretsConfig,
}

/// Emails admins about new user registrations.
pub struct RegistrationNotifier<D, S, T> {
    directory: D,
    secrets: S,
    transport: T,
    settings: NotifierSettings,
}

impl<D, S, T> RegistrationNotifier<D, S, T>
where
    D: AdminDirectory,
    S: SecretProvider,
    T: MailTransport,
{
    #[must_use]
    pub const fn new(directory: D, secrets: S, transport: T, settings: NotifierSettings) -> Self {
        Self {
            directory,
            secrets,
            transport,
            settings,
        }
    }

    /// Handle one user-created event.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` when the admin query, secret backend, rendering
    /// or transport fails. Each is worth retrying the whole invocation.
    #[tracing::instrument(name = "notify_registration", skip_all, fields(user_id = %event.user_id))]
    pub async fn handle(&self, event: &UserCreatedEvent) -> Result<Outcome, NotifyError> {
        tracing::info!(created_at = ?event.created_at, "Registration event received");

        let admins = self.directory.list_admins().await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to fetch admins");
        })?;
        tracing::info!(count = admins.len(), "Admins fetched");

        let recipients = recipients::collect(&admins);
        tracing::info!(count = recipients.len(), "Recipients computed");

        if recipients.is_empty() {
            tracing::info!("No admin recipients with email notifications enabled, skipping");
            return Ok(Outcome::NoRecipients);
        }

        let Some(credentials) = self.credentials().await? else {
            return Ok(Outcome::MissingCredentials);
        };

        let from = Sender {
            name: self.settings.message.sender_name.clone(),
            address: credentials.user.clone(),
        };
        let message = compose_message(
            &event.record,
            recipients,
            from,
            &self.settings.message.portal_url,
        )?;

        tracing::info!(
            to = ?message.to.iter().map(ToString::to_string).collect::<Vec<_>>(),
            reply_to = ?message.reply_to,
            "Sending registration notification"
        );

        match self.transport.send(&credentials, &message).await {
            Ok(receipt) => {
                tracing::info!(
                    message_id = %receipt.message_id,
                    accepted = ?receipt.accepted,
                    rejected = ?receipt.rejected,
                    response = %receipt.response,
                    "Registration notification sent"
                );
                Ok(Outcome::Sent(receipt))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to send registration notification");
                Err(e.into())
            }
        }
    }

    /// Resolve both mail secrets.
    ///
    /// `Ok(None)` (after logging) when either is absent or empty.
    async fn credentials(&self) -> Result<Option<MailCredentials>, NotifyError> {
        let names = &self.settings.secrets;

        let user = self.resolve_non_empty(&names.user_secret).await?;
        let password = self.resolve_non_empty(&names.password_secret).await?;

        match (user, password) {
            (Some(user), Some(password)) => Ok(Some(MailCredentials {
                user: user.expose_secret().to_string(),
                password,
            })),
            (user, password) => {
                tracing::error!(
                    user_secret = %names.user_secret,
                    user_secret_present = user.is_some(),
                    password_secret = %names.password_secret,
                    password_secret_present = password.is_some(),
                    "Mail credentials are not configured, notification not sent"
                );
                Ok(None)
            }
        }
    }

    async fn resolve_non_empty(&self, name: &str) -> Result<Option<SecretString>, NotifyError> {
        let value = self.secrets.resolve(name).await.inspect_err(|e| {
            tracing::error!(secret = name, error = %e, "Secret lookup failed");
        })?;

        Ok(value.filter(|secret| !secret.expose_secret().trim().is_empty()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use registration_notifier_core::{AdminRecord, NotificationMessage, UserRecord};

    use super::*;
    use crate::config::SecretBackend;
    use crate::services::secrets::InMemorySecretProvider;

    struct Admins(Vec<AdminRecord>);

    impl AdminDirectory for Admins {
        async fn list_admins(&self) -> Result<Vec<AdminRecord>, DirectoryError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<(String, NotificationMessage)>>,
    }

    impl MailTransport for Outbox {
        async fn send(
            &self,
            credentials: &MailCredentials,
            message: &NotificationMessage,
        ) -> Result<DeliveryReceipt, TransportError> {
            self.sent
                .lock()
                .unwrap()
                .push((credentials.user.clone(), message.clone()));
            Ok(DeliveryReceipt {
                message_id: "<id@example.com>".to_string(),
                accepted: message.to.iter().map(ToString::to_string).collect(),
                rejected: Vec::new(),
                response: "250 OK".to_string(),
            })
        }
    }

    fn settings() -> NotifierSettings {
        NotifierSettings {
            message: MessageConfig {
                sender_name: "App Notification".to_string(),
                portal_url: "https://admin.example.org".to_string(),
            },
            secrets: SecretsConfig {
                backend: SecretBackend::Env,
                user_secret: "GMAIL_EMAIL".to_string(),
                password_secret: "GMAIL_PASSWORD".to_string(),
            },
        }
    }

    fn admin(email: &str) -> AdminRecord {
        AdminRecord {
            id: email.to_string(),
            email: Some(email.to_string()),
            email_notifications: None,
        }
    }

    fn event() -> UserCreatedEvent {
        UserCreatedEvent::new(
            "u1",
            UserRecord {
                full_name: Some("Jane Doe".to_string()),
                email: Some("jane@example.com".to_string()),
                ..UserRecord::default()
            },
        )
    }

    #[tokio::test]
    async fn test_sender_uses_account_identity() {
        let secrets = InMemorySecretProvider::new()
            .with("GMAIL_EMAIL", "notify@example.com")
            .with("GMAIL_PASSWORD", "app-password");
        let notifier = RegistrationNotifier::new(
            Admins(vec![admin("admin@example.com")]),
            secrets,
            Outbox::default(),
            settings(),
        );

        let outcome = notifier.handle(&event()).await.unwrap();
        assert!(matches!(outcome, Outcome::Sent(_)));

        let sent = notifier.transport.sent.lock().unwrap();
        let (user, message) = sent.first().unwrap();
        assert_eq!(user, "notify@example.com");
        assert_eq!(message.from.address, "notify@example.com");
        assert_eq!(message.from.name, "App Notification");
    }

    #[tokio::test]
    async fn test_blank_secret_counts_as_missing() {
        let secrets = InMemorySecretProvider::new()
            .with("GMAIL_EMAIL", "notify@example.com")
            .with("GMAIL_PASSWORD", "   ");
        let notifier = RegistrationNotifier::new(
            Admins(vec![admin("admin@example.com")]),
            secrets,
            Outbox::default(),
            settings(),
        );

        let outcome = notifier.handle(&event()).await.unwrap();
        assert_eq!(outcome, Outcome::MissingCredentials);
        assert!(notifier.transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_secrets_not_read_without_recipients() {
        struct PanickingSecrets;

        impl SecretProvider for PanickingSecrets {
            async fn resolve(&self, _name: &str) -> Result<Option<SecretString>, SecretError> {
                panic!("secrets must not be resolved when there are no recipients");
            }
        }

        let notifier = RegistrationNotifier::new(
            Admins(Vec::new()),
            PanickingSecrets,
            Outbox::default(),
            settings(),
        );

        assert_eq!(notifier.handle(&event()).await.unwrap(), Outcome::NoRecipients);
    }
}
