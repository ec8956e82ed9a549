//! Snapshot of a newly created user document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::field_text;

/// Role shown when the document carries none.
pub const DEFAULT_ROLE: &str = "user";

/// Status shown when the document carries none.
pub const DEFAULT_STATUS: &str = "pending";

/// A user document as it looked when the creation event fired.
///
/// Every field is optional on the wire. The accessors apply the display
/// defaults; an empty string counts as missing, so an empty `fullName` falls
/// through to `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub address: Option<String>,
}

impl UserRecord {
    /// Build a record from a decoded document field map.
    ///
    /// Unknown fields are ignored. Numeric and boolean values are rendered to
    /// text so a phone number stored as an integer still shows up.
    #[must_use]
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            full_name: field_text(fields, "fullName"),
            name: field_text(fields, "name"),
            email: field_text(fields, "email"),
            phone_number: field_text(fields, "phoneNumber"),
            phone: field_text(fields, "phone"),
            role: field_text(fields, "role"),
            status: field_text(fields, "status"),
            address: field_text(fields, "address"),
        }
    }

    /// `fullName`, else `name`, else empty.
    #[must_use]
    pub fn display_name(&self) -> &str {
        first_non_empty(&[&self.full_name, &self.name]).unwrap_or("")
    }

    /// The user's email, or empty.
    #[must_use]
    pub fn email(&self) -> &str {
        first_non_empty(&[&self.email]).unwrap_or("")
    }

    /// `phoneNumber`, else `phone`. `None` when both are missing or empty.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        first_non_empty(&[&self.phone_number, &self.phone])
    }

    #[must_use]
    pub fn role(&self) -> &str {
        first_non_empty(&[&self.role]).unwrap_or(DEFAULT_ROLE)
    }

    #[must_use]
    pub fn status(&self) -> &str {
        first_non_empty(&[&self.status]).unwrap_or(DEFAULT_STATUS)
    }

    #[must_use]
    pub fn address(&self) -> Option<&str> {
        first_non_empty(&[&self.address])
    }

    /// Address replies should go to, when the user gave one.
    #[must_use]
    pub fn reply_to(&self) -> Option<&str> {
        first_non_empty(&[&self.email])
    }
}

fn first_non_empty<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .filter_map(Option::as_deref)
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: &Value) -> UserRecord {
        UserRecord::from_fields(value.as_object().expect("object"))
    }

    #[test]
    fn test_defaults_for_empty_document() {
        let user = record(&json!({}));
        assert_eq!(user.display_name(), "");
        assert_eq!(user.email(), "");
        assert_eq!(user.phone(), None);
        assert_eq!(user.role(), "user");
        assert_eq!(user.status(), "pending");
        assert_eq!(user.address(), None);
        assert_eq!(user.reply_to(), None);
    }

    #[test]
    fn test_full_name_preferred_over_name() {
        let user = record(&json!({"fullName": "Jane Doe", "name": "jane"}));
        assert_eq!(user.display_name(), "Jane Doe");
    }

    #[test]
    fn test_empty_full_name_falls_through() {
        let user = record(&json!({"fullName": "", "name": "jane"}));
        assert_eq!(user.display_name(), "jane");
    }

    #[test]
    fn test_phone_number_preferred_over_phone() {
        let user = record(&json!({"phoneNumber": "555-0100", "phone": "555-0199"}));
        assert_eq!(user.phone(), Some("555-0100"));

        let user = record(&json!({"phone": "555-0199"}));
        assert_eq!(user.phone(), Some("555-0199"));

        let user = record(&json!({"phoneNumber": ""}));
        assert_eq!(user.phone(), None);
    }

    #[test]
    fn test_numeric_phone_is_rendered() {
        let user = record(&json!({"phoneNumber": 9_171_234_567_i64}));
        assert_eq!(user.phone(), Some("9171234567"));
    }

    #[test]
    fn test_non_scalar_fields_ignored() {
        let user = record(&json!({"role": {"nested": true}, "address": ["a"], "status": null}));
        assert_eq!(user.role(), "user");
        assert_eq!(user.status(), "pending");
        assert_eq!(user.address(), None);
    }

    #[test]
    fn test_explicit_role_and_status() {
        let user = record(&json!({"role": "farmer", "status": "approved"}));
        assert_eq!(user.role(), "farmer");
        assert_eq!(user.status(), "approved");
    }

    #[test]
    fn test_reply_to_uses_email() {
        let user = record(&json!({"email": "jane@example.com"}));
        assert_eq!(user.reply_to(), Some("jane@example.com"));
    }
}
