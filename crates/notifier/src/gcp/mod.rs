//! Google Cloud REST clients.
//!
//! This module provides:
//! - [`AccessTokenSource`] for OAuth tokens from the instance metadata server
//! - [`FirestoreClient`] for listing collection documents
//! - [`value`] for decoding Firestore's typed value encoding
//!
//! Clients talk to the REST APIs with `reqwest`. There is no gRPC and no
//! global client; each client is constructed explicitly and cloned cheaply.

mod auth;
mod firestore;
pub mod value;

pub use auth::AccessTokenSource;
pub use firestore::{Document, DocumentPath, FirestoreClient, RawDocument};

use thiserror::Error;

/// Errors that can occur when calling Google Cloud APIs.
#[derive(Debug, Error)]
pub enum GcpError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Could not obtain an access token.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Turn a non-success response into [`GcpError::Api`].
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, GcpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(GcpError::Api {
        status: status.as_u16(),
        message,
    })
}
