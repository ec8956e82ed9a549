//! Business logic services.
//!
//! # Services
//!
//! - `notifier` - The registration notification flow
//! - `render` - Text and HTML bodies from Askama templates
//! - `email` - Mail transport via SMTP
//! - `secrets` - Mail credential lookup

pub mod email;
pub mod notifier;
pub mod render;
pub mod secrets;

pub use email::{MailCredentials, MailTransport, SmtpMailTransport, TransportError};
pub use notifier::{NotifierSettings, NotifyError, Outcome, RegistrationNotifier};
pub use render::{compose_message, render_bodies};
pub use secrets::{
    ConfiguredSecrets, EnvSecretProvider, InMemorySecretProvider, SecretError, SecretManagerProvider,
    SecretProvider,
};
