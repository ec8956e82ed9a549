//! Recipient selection.
//!
//! Turns the admins collection into the `To` list of a notification:
//! opted-out admins are dropped, values without an @ are dropped, and
//! duplicates collapse to their first occurrence. Anything containing an @
//! is kept; the mail transport decides whether it is deliverable.

use std::collections::HashSet;

use crate::types::{AdminRecord, Email};

/// Compute the recipient list for a registration notification.
///
/// Deduplication is by exact string equality, so addresses differing only in
/// case are kept as separate recipients. Order follows the admin list.
#[must_use]
pub fn collect(admins: &[AdminRecord]) -> Vec<Email> {
    let mut seen = HashSet::new();

    admins
        .iter()
        .filter(|admin| admin.wants_email())
        .filter_map(|admin| admin.email.as_deref())
        .filter_map(|raw| Email::parse(raw).ok())
        .filter(|email| seen.insert(email.clone()))
        .collect()
}
