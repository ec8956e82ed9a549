//! Shared fixtures for the registration notifier integration tests.
//!
//! # Test Categories
//!
//! - `notifier_flow` - the notification flow against in-memory collaborators
//! - `http_events` - the event endpoint, driven through the router
//! - `gcp_rest` - Firestore and Secret Manager clients against a local fake
//!
//! Nothing here talks to Google or an SMTP relay.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use serde_json::Value;

use registration_notifier::config::{MessageConfig, SecretBackend, SecretsConfig};
use registration_notifier::db::{AdminDirectory, DirectoryError};
use registration_notifier::gcp::GcpError;
use registration_notifier::services::{
    InMemorySecretProvider, MailCredentials, MailTransport, NotifierSettings, RegistrationNotifier,
    TransportError,
};
use registration_notifier_core::{
    AdminRecord, DeliveryReceipt, NotificationMessage, UserCreatedEvent, UserRecord,
};

pub const PORTAL_URL: &str = "https://admin.example.org/users";
pub const SENDER_ADDRESS: &str = "notify@example.com";

/// Admin directory returning a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    admins: Vec<AdminRecord>,
}

impl StaticDirectory {
    #[must_use]
    pub const fn new(admins: Vec<AdminRecord>) -> Self {
        Self { admins }
    }

    /// Build from raw decoded admin documents, in order.
    ///
    /// # Panics
    ///
    /// Panics if a document is not a JSON object.
    #[must_use]
    pub fn from_documents(documents: &[Value]) -> Self {
        let admins = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let fields = doc.as_object().expect("admin document must be an object");
                AdminRecord::from_fields(format!("admin-{i}"), fields)
            })
            .collect();
        Self { admins }
    }
}

impl AdminDirectory for StaticDirectory {
    async fn list_admins(&self) -> Result<Vec<AdminRecord>, DirectoryError> {
        Ok(self.admins.clone())
    }
}

/// Admin directory whose backend always answers 503.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingDirectory;

impl AdminDirectory for FailingDirectory {
    async fn list_admins(&self) -> Result<Vec<AdminRecord>, DirectoryError> {
        Err(DirectoryError::Database(GcpError::Api {
            status: 503,
            message: "The service is currently unavailable.".to_string(),
        }))
    }
}

/// One captured send.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub account: String,
    pub message: NotificationMessage,
}

/// Transport that records every message and accepts it.
///
/// Clones share the same outbox.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl RecordingTransport {
    /// Everything sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MailTransport for RecordingTransport {
    async fn send(
        &self,
        credentials: &MailCredentials,
        message: &NotificationMessage,
    ) -> Result<DeliveryReceipt, TransportError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                account: credentials.user.clone(),
                message: message.clone(),
            });

        Ok(DeliveryReceipt {
            message_id: "<test@example.com>".to_string(),
            accepted: message.to.iter().map(ToString::to_string).collect(),
            rejected: Vec::new(),
            response: "250 2.0.0 OK".to_string(),
        })
    }
}

/// Transport whose every send fails before reaching a relay.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingTransport;

impl MailTransport for FailingTransport {
    async fn send(
        &self,
        _credentials: &MailCredentials,
        message: &NotificationMessage,
    ) -> Result<DeliveryReceipt, TransportError> {
        Err(TransportError::NoValidRecipients(
            message.to.iter().map(ToString::to_string).collect(),
        ))
    }
}

/// Settings using the default secret names.
#[must_use]
pub fn settings() -> NotifierSettings {
    NotifierSettings {
        message: MessageConfig {
            sender_name: "App Notification".to_string(),
            portal_url: PORTAL_URL.to_string(),
        },
        secrets: SecretsConfig {
            backend: SecretBackend::Env,
            user_secret: "GMAIL_EMAIL".to_string(),
            password_secret: "GMAIL_PASSWORD".to_string(),
        },
    }
}

/// Both mail secrets provisioned.
#[must_use]
pub fn credentials() -> InMemorySecretProvider {
    InMemorySecretProvider::new()
        .with("GMAIL_EMAIL", SENDER_ADDRESS)
        .with("GMAIL_PASSWORD", "app-password")
}

/// A notifier over the given collaborators with default settings.
#[must_use]
pub fn notifier<D, T>(
    directory: D,
    secrets: InMemorySecretProvider,
    transport: T,
) -> RegistrationNotifier<D, InMemorySecretProvider, T>
where
    D: AdminDirectory,
    T: MailTransport,
{
    RegistrationNotifier::new(directory, secrets, transport, settings())
}

/// The registration used throughout the flow tests.
#[must_use]
pub fn jane_doe() -> UserCreatedEvent {
    let record = UserRecord {
        full_name: Some("Jane Doe".to_string()),
        email: Some("jane@example.com".to_string()),
        role: Some("farmer".to_string()),
        status: Some("pending".to_string()),
        ..UserRecord::default()
    };
    UserCreatedEvent::new("jane-uid", record)
}

/// Serve `router` on an ephemeral local port.
///
/// # Panics
///
/// Panics if the listener cannot be bound.
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    addr
}
