//! Registration Notifier Core - Shared types library.
//!
//! This crate provides the domain types used by the notifier:
//! - [`UserRecord`] - snapshot of a newly created user document
//! - [`AdminRecord`] - an administrator and their notification preferences
//! - [`NotificationMessage`] - the outgoing email, before transport
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Document fields arrive as `serde_json` maps that the
//! notifier crate has already decoded from the database wire format.
//!
//! # Modules
//!
//! - [`types`] - Email newtype, records, events and message types
//! - [`recipients`] - Recipient selection from admin records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod recipients;
pub mod types;

pub use types::*;
