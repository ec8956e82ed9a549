//! Unified error handling for the HTTP adapter.
//!
//! The status code is the only signal the invoking platform reads: 2xx means
//! done, 5xx means retry. Malformed events get a 4xx because replaying them
//! cannot succeed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::NotifyError;

/// Application-level error type for event delivery.
#[derive(Debug, Error)]
pub enum AppError {
    /// The event payload is malformed or not for this handler.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The notification flow failed.
    #[error("Notification failed: {0}")]
    Notify(#[from] NotifyError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::Notify(_) => {
                let event_id = sentry::capture_error(&self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Event handling failed"
                );
            }
            Self::BadRequest(_) => {
                tracing::warn!(error = %self, "Rejected event");
            }
        }

        let (status, message) = match &self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            // Don't expose internal error details to the caller
            Self::Notify(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, message).into_response()
    }
}
