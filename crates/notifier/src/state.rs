//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::NotifierConfig;
use crate::db::{AdminDirectory, FirestoreAdminDirectory};
use crate::gcp::FirestoreClient;
use crate::services::{
    ConfiguredSecrets, MailTransport, NotifierSettings, RegistrationNotifier, SecretProvider,
    SmtpMailTransport,
};

/// The notifier wired to Firestore, the configured secret backend and SMTP.
pub type ProductionNotifier =
    RegistrationNotifier<FirestoreAdminDirectory, ConfiguredSecrets, SmtpMailTransport>;

/// Application state shared across all handlers.
pub struct AppState<D, S, T> {
    inner: Arc<AppStateInner<D, S, T>>,
}

struct AppStateInner<D, S, T> {
    notifier: RegistrationNotifier<D, S, T>,
    users_collection: String,
}

impl<D, S, T> Clone for AppState<D, S, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D, S, T> AppState<D, S, T>
where
    D: AdminDirectory,
    S: SecretProvider,
    T: MailTransport,
{
    /// Wrap a notifier that handles creations in `users_collection`.
    pub fn new(
        notifier: RegistrationNotifier<D, S, T>,
        users_collection: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                notifier,
                users_collection: users_collection.into(),
            }),
        }
    }

    #[must_use]
    pub fn notifier(&self) -> &RegistrationNotifier<D, S, T> {
        &self.inner.notifier
    }

    /// Collection path whose document creations this service handles.
    #[must_use]
    pub fn users_collection(&self) -> &str {
        &self.inner.users_collection
    }
}

impl AppState<FirestoreAdminDirectory, ConfiguredSecrets, SmtpMailTransport> {
    /// Build production collaborators from configuration.
    #[must_use]
    pub fn from_config(config: &NotifierConfig, http: reqwest::Client) -> Self {
        let firestore = FirestoreClient::new(&config.firestore, http.clone());
        let directory = FirestoreAdminDirectory::new(firestore, config.admins_collection.clone());
        let secrets =
            ConfiguredSecrets::new(config.secrets.backend, &config.firestore.project_id, http);
        let transport = SmtpMailTransport::new(&config.smtp);

        let settings = NotifierSettings {
            message: config.message.clone(),
            secrets: config.secrets.clone(),
        };

        let notifier: ProductionNotifier =
            RegistrationNotifier::new(directory, secrets, transport, settings);

        Self::new(notifier, config.users_collection.clone())
    }
}
