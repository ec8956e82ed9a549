//! Read access to the admins collection.
//!
//! # Collections
//!
//! - `admins` - One document per administrator: `email` and an optional
//!   `notificationPrefs.email` flag
//!
//! The collection is read in full on every event. Nothing is cached, so a
//! preference change applies to the next registration.

pub mod admins;

use std::future::Future;

use thiserror::Error;

use registration_notifier_core::AdminRecord;

use crate::gcp::GcpError;

pub use admins::FirestoreAdminDirectory;

/// Errors that can occur while reading admin records.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The document database request failed.
    #[error("database error: {0}")]
    Database(#[from] GcpError),
}

/// Source of administrator records.
pub trait AdminDirectory: Send + Sync {
    /// Every admin record, in collection order.
    fn list_admins(&self) -> impl Future<Output = Result<Vec<AdminRecord>, DirectoryError>> + Send;
}
