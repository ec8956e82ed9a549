//! Registration notifier library.
//!
//! Emails every opted-in administrator when a new user document is created
//! in Firestore. The binary in `main.rs` serves this as an HTTP endpoint that
//! receives Firestore "document created" events.
//!
//! # Layout
//!
//! - [`services::RegistrationNotifier`] - the notification flow
//! - [`db`] - admin records from Firestore
//! - [`services::secrets`] - mail credentials, resolved per invocation
//! - [`services::email`] - SMTP delivery via lettre
//! - [`routes`] - event delivery endpoint

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod gcp;
pub mod routes;
pub mod services;
pub mod state;
