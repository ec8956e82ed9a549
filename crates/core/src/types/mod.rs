//! Core types for the registration notifier.
//!
//! This module provides type-safe wrappers for the documents the notifier
//! reads and the message it produces.

pub mod admin;
pub mod email;
pub mod event;
pub mod message;
pub mod user;

pub use admin::AdminRecord;
pub use email::{Email, EmailError};
pub use event::UserCreatedEvent;
pub use message::{DeliveryReceipt, NotificationMessage, REGISTRATION_SUBJECT, Sender};
pub use user::UserRecord;

use serde_json::{Map, Value};

/// Read a field as display text.
///
/// Strings are returned as-is, numbers and booleans are rendered. Any other
/// type (maps, arrays, null) is treated as absent.
pub(crate) fn field_text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
