//! Event delivery endpoint.
//!
//! The platform POSTs a Firestore `DocumentEventData` as JSON:
//!
//! ```json
//! {
//!   "value": {
//!     "name": "projects/p/databases/(default)/documents/users/abc123",
//!     "fields": { "fullName": { "stringValue": "Jane Doe" } },
//!     "createTime": "2026-01-02T03:04:05Z"
//!   }
//! }
//! ```
//!
//! CloudEvent metadata arrives in `ce-*` headers and is only logged.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;

use registration_notifier_core::{UserCreatedEvent, UserRecord};

use crate::db::AdminDirectory;
use crate::error::AppError;
use crate::gcp::{DocumentPath, RawDocument};
use crate::services::{MailTransport, SecretProvider};
use crate::state::AppState;

/// Firestore event payload. `oldValue` and `updateMask` are ignored.
#[derive(Debug, Deserialize)]
pub struct DocumentEventData {
    pub value: Option<RawDocument>,
}

/// Handle one delivered event.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for payloads that cannot be handled and
/// `AppError::Notify` when the notification flow fails.
pub async fn receive_event<D, S, T>(
    State(state): State<AppState<D, S, T>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError>
where
    D: AdminDirectory + 'static,
    S: SecretProvider + 'static,
    T: MailTransport + 'static,
{
    tracing::debug!(
        ce_id = header(&headers, "ce-id"),
        ce_type = header(&headers, "ce-type"),
        ce_subject = header(&headers, "ce-subject"),
        "Event delivered"
    );

    let event = parse_event(&body, state.users_collection())?;
    let outcome = state.notifier().handle(&event).await?;

    tracing::debug!(user_id = %event.user_id, ?outcome, "Event handled");
    Ok(StatusCode::NO_CONTENT)
}

/// Decode a delivered payload into a [`UserCreatedEvent`].
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the body is not a document event, has no
/// document, or the document is outside `users_collection`.
pub fn parse_event(body: &[u8], users_collection: &str) -> Result<UserCreatedEvent, AppError> {
    let payload: DocumentEventData = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("invalid event payload: {e}")))?;

    let document = payload
        .value
        .ok_or_else(|| AppError::BadRequest("event has no document value".to_string()))?
        .decode();

    let path = DocumentPath::parse(&document.name).ok_or_else(|| {
        AppError::BadRequest(format!("unrecognised document name: {}", document.name))
    })?;

    if path.collection != users_collection {
        return Err(AppError::BadRequest(format!(
            "document {} is not in the {users_collection} collection",
            document.name
        )));
    }

    let mut event =
        UserCreatedEvent::new(path.document_id, UserRecord::from_fields(&document.fields));
    if let Some(created_at) = document.create_time {
        event = event.with_created_at(created_at);
    }

    Ok(event)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
