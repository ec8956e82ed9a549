//! The trigger payload handed to the notifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserRecord;

/// A user document was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreatedEvent {
    /// The `{userId}` path parameter of the created document.
    pub user_id: String,
    pub record: UserRecord,
    /// Document creation time, when the event source reports one.
    pub created_at: Option<DateTime<Utc>>,
}

impl UserCreatedEvent {
    #[must_use]
    pub fn new(user_id: impl Into<String>, record: UserRecord) -> Self {
        Self {
            user_id: user_id.into(),
            record,
            created_at: None,
        }
    }

    #[must_use]
    pub const fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}
