//! Outgoing notification and the relay's answer to it.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::Email;

/// Subject line of every registration notification.
pub const REGISTRATION_SUBJECT: &str = "New user registration received";

/// The `From` identity: a display name plus the mail account address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub name: String,
    pub address: String,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" <{}>", self.name, self.address)
    }
}

/// An email ready to hand to a transport. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub from: Sender,
    pub to: Vec<Email>,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub reply_to: Option<String>,
}

/// What the relay reported after accepting a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
    /// Raw response text from the relay.
    pub response: String,
}
