//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! POST /        - Firestore "document created" event delivery
//! GET  /health  - Liveness check
//! ```

pub mod events;

use axum::{
    Router,
    routing::{get, post},
};

use crate::db::AdminDirectory;
use crate::services::{MailTransport, SecretProvider};
use crate::state::AppState;

/// Build the router for a notifier with the given collaborators.
pub fn routes<D, S, T>() -> Router<AppState<D, S, T>>
where
    D: AdminDirectory + 'static,
    S: SecretProvider + 'static,
    T: MailTransport + 'static,
{
    Router::new()
        .route("/", post(events::receive_event::<D, S, T>))
        .route("/health", get(health))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
