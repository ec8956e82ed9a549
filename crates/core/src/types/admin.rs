//! Administrator documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An administrator as read from the admins collection.
///
/// `email` holds the raw field only when it is a string; anything else on the
/// wire is dropped here and the admin simply has no usable address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRecord {
    /// Document ID within the admins collection.
    pub id: String,
    pub email: Option<String>,
    /// `notificationPrefs.email`. Only a boolean counts; other types are
    /// treated as unset.
    pub email_notifications: Option<bool>,
}

impl AdminRecord {
    /// Build a record from a decoded document field map.
    #[must_use]
    pub fn from_fields(id: impl Into<String>, fields: &Map<String, Value>) -> Self {
        let email = match fields.get("email") {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };

        let email_notifications = fields
            .get("notificationPrefs")
            .and_then(|prefs| prefs.get("email"))
            .and_then(Value::as_bool);

        Self {
            id: id.into(),
            email,
            email_notifications,
        }
    }

    /// Whether this admin wants registration emails.
    ///
    /// A missing preference means yes. Only an explicit `false` opts out.
    #[must_use]
    pub fn wants_email(&self) -> bool {
        self.email_notifications != Some(false)
    }
}
