//! OAuth access tokens for Google APIs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{GcpError, check_status};

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are dropped from the cache this long before Google expires them.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Where API requests get their bearer token.
#[derive(Clone)]
pub enum AccessTokenSource {
    /// The runtime service account, via the metadata server.
    Metadata(MetadataTokenSource),
    /// No authentication (Firestore emulator).
    Anonymous,
}

impl std::fmt::Debug for AccessTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Metadata(_) => f.write_str("AccessTokenSource::Metadata"),
            Self::Anonymous => f.write_str("AccessTokenSource::Anonymous"),
        }
    }
}

impl AccessTokenSource {
    /// Token source backed by the instance metadata server.
    #[must_use]
    pub fn metadata(client: reqwest::Client) -> Self {
        Self::Metadata(MetadataTokenSource::new(client, METADATA_TOKEN_URL))
    }

    /// Attach a bearer token to the request, if this source has one.
    ///
    /// # Errors
    ///
    /// Returns `GcpError::Auth` if the metadata server cannot issue a token.
    pub async fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, GcpError> {
        match self {
            Self::Metadata(source) => {
                let token = source.token().await?;
                Ok(request.bearer_auth(token.expose_secret()))
            }
            Self::Anonymous => Ok(request),
        }
    }
}

/// Fetches and caches service account tokens.
///
/// One token is shared by every request in the process until shortly before
/// it expires.
#[derive(Clone)]
pub struct MetadataTokenSource {
    client: reqwest::Client,
    endpoint: Arc<str>,
    cache: Cache<(), CachedToken>,
}

#[derive(Clone)]
struct CachedToken {
    token: Arc<SecretString>,
    lifetime: Duration,
}

struct TokenExpiry;

impl Expiry<(), CachedToken> for TokenExpiry {
    fn expire_after_create(
        &self,
        _key: &(),
        value: &CachedToken,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.lifetime)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

impl MetadataTokenSource {
    fn new(client: reqwest::Client, endpoint: &str) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .expire_after(TokenExpiry)
            .build();

        Self {
            client,
            endpoint: Arc::from(endpoint),
            cache,
        }
    }

    async fn token(&self) -> Result<Arc<SecretString>, GcpError> {
        let cached = self
            .cache
            .try_get_with((), self.fetch())
            .await
            .map_err(|e| GcpError::Auth(e.to_string()))?;

        Ok(cached.token)
    }

    async fn fetch(&self) -> Result<CachedToken, GcpError> {
        let response = self
            .client
            .get(self.endpoint.as_ref())
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        let body: TokenResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| GcpError::Parse(e.to_string()))?;

        tracing::debug!(expires_in = body.expires_in, "Fetched access token");

        Ok(CachedToken {
            token: Arc::new(SecretString::from(body.access_token)),
            lifetime: Duration::from_secs(body.expires_in).saturating_sub(EXPIRY_MARGIN),
        })
    }
}
