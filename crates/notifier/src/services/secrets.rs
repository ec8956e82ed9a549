//! Secret resolution for the mail credentials.
//!
//! Secrets are looked up by name on every invocation through a
//! [`SecretProvider`]. `Ok(None)` means the secret is not provisioned; an
//! `Err` means the backend itself failed and the lookup may succeed on retry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

use crate::config::SecretBackend;
use crate::gcp::{AccessTokenSource, GcpError, check_status};

const SECRET_MANAGER_HOST: &str = "https://secretmanager.googleapis.com";

/// Errors that can occur when resolving a secret.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The secret backend request failed.
    #[error("secret backend error: {0}")]
    Backend(#[from] GcpError),

    /// The secret payload could not be decoded.
    #[error("invalid payload for secret {name}: {reason}")]
    InvalidPayload { name: String, reason: String },
}

/// Resolves named secrets.
pub trait SecretProvider: Send + Sync {
    /// Look up `name`. Returns `Ok(None)` when the secret does not exist.
    fn resolve(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<SecretString>, SecretError>> + Send;
}

/// Reads secrets from the process environment.
///
/// Hosting platforms mount secrets as environment variables, so this is the
/// default backend. Values are read at resolve time, not cached.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretProvider;

impl SecretProvider for EnvSecretProvider {
    async fn resolve(&self, name: &str) -> Result<Option<SecretString>, SecretError> {
        Ok(std::env::var(name).ok().map(SecretString::from))
    }
}

/// Fixed set of secrets held in memory.
#[derive(Clone, Default)]
pub struct InMemorySecretProvider {
    values: HashMap<String, String>,
}

impl std::fmt::Debug for InMemorySecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySecretProvider")
            .field("names", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl InMemorySecretProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl SecretProvider for InMemorySecretProvider {
    async fn resolve(&self, name: &str) -> Result<Option<SecretString>, SecretError> {
        Ok(self.values.get(name).cloned().map(SecretString::from))
    }
}

#[derive(Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Deserialize)]
struct SecretPayload {
    #[serde(default)]
    data: String,
}

/// Reads the latest version of secrets from Google Secret Manager.
#[derive(Clone)]
pub struct SecretManagerProvider {
    inner: Arc<SecretManagerInner>,
}

struct SecretManagerInner {
    client: reqwest::Client,
    /// `{host}/v1/projects/{project}/secrets`
    secrets_url: String,
    auth: AccessTokenSource,
}

impl SecretManagerProvider {
    /// Provider for `project`, authenticated with the runtime service account.
    #[must_use]
    pub fn new(project_id: &str, client: reqwest::Client) -> Self {
        let auth = AccessTokenSource::metadata(client.clone());
        Self::with_host(SECRET_MANAGER_HOST, project_id, client, auth)
    }

    /// Provider against an explicit API host.
    #[must_use]
    pub fn with_host(
        host: &str,
        project_id: &str,
        client: reqwest::Client,
        auth: AccessTokenSource,
    ) -> Self {
        let secrets_url = format!(
            "{}/v1/projects/{}/secrets",
            host.trim_end_matches('/'),
            urlencoding::encode(project_id)
        );

        Self {
            inner: Arc::new(SecretManagerInner {
                client,
                secrets_url,
                auth,
            }),
        }
    }
}

impl SecretProvider for SecretManagerProvider {
    async fn resolve(&self, name: &str) -> Result<Option<SecretString>, SecretError> {
        let url = format!(
            "{}/{}/versions/latest:access",
            self.inner.secrets_url,
            urlencoding::encode(name)
        );

        let request = self.inner.auth.authorize(self.inner.client.get(&url)).await?;
        let response = request.send().await.map_err(GcpError::from)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(secret = name, "Secret not found in Secret Manager");
            return Ok(None);
        }

        let body: AccessSecretVersionResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| GcpError::Parse(e.to_string()))?;

        decode_payload(name, &body.payload.data).map(Some)
    }
}

fn decode_payload(name: &str, data: &str) -> Result<SecretString, SecretError> {
    let invalid = |reason: String| SecretError::InvalidPayload {
        name: name.to_string(),
        reason,
    };

    let bytes = STANDARD.decode(data).map_err(|e| invalid(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| invalid(e.to_string()))?;
    Ok(SecretString::from(text))
}

/// The provider selected by configuration.
#[derive(Clone)]
pub enum ConfiguredSecrets {
    Env(EnvSecretProvider),
    SecretManager(SecretManagerProvider),
}

impl ConfiguredSecrets {
    /// Build the provider for `backend`.
    #[must_use]
    pub fn new(backend: SecretBackend, project_id: &str, client: reqwest::Client) -> Self {
        match backend {
            SecretBackend::Env => Self::Env(EnvSecretProvider),
            SecretBackend::SecretManager => {
                Self::SecretManager(SecretManagerProvider::new(project_id, client))
            }
        }
    }
}

impl SecretProvider for ConfiguredSecrets {
    async fn resolve(&self, name: &str) -> Result<Option<SecretString>, SecretError> {
        match self {
            Self::Env(provider) => provider.resolve(name).await,
            Self::SecretManager(provider) => provider.resolve(name).await,
        }
    }
}
