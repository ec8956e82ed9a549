//! Notifier configuration loaded from environment variables.
//!
//! The two mail secrets are NOT read here. They are resolved on every
//! invocation through the configured secret backend, so a rotated or newly
//! provisioned secret takes effect without a restart.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GOOGLE_CLOUD_PROJECT` - Project hosting Firestore (falls back to `GCLOUD_PROJECT`)
//!
//! ## Optional
//! - `ADMIN_PORTAL_URL` - Admin portal link included in every notification
//!   (default: `https://admin.registration-notifier.app`)
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 8080)
//! - `FIRESTORE_DATABASE` - Database ID (default: `(default)`)
//! - `FIRESTORE_EMULATOR_HOST` - `host:port` of a Firestore emulator (disables auth)
//! - `USERS_COLLECTION` - Collection whose creations trigger notifications (default: users)
//! - `ADMINS_COLLECTION` - Collection holding admin documents (default: admins)
//! - `SMTP_HOST` - SMTP relay hostname (default: smtp.gmail.com)
//! - `SMTP_PORT` - SMTP relay port (default: 587)
//! - `NOTIFY_SENDER_NAME` - Display name on the From header (default: App Notification)
//! - `SECRET_SOURCE` - `env` or `secret-manager` (default: env)
//! - `MAIL_USER_SECRET` - Name of the mail account secret (default: `GMAIL_EMAIL`)
//! - `MAIL_PASSWORD_SECRET` - Name of the mail password secret (default: `GMAIL_PASSWORD`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;
use url::Url;

const DEFAULT_PORTAL_URL: &str = "https://admin.registration-notifier.app";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SENDER_NAME: &str = "App Notification";
const DEFAULT_USER_SECRET: &str = "GMAIL_EMAIL";
const DEFAULT_PASSWORD_SECRET: &str = "GMAIL_PASSWORD";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Notifier configuration.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Firestore connection settings
    pub firestore: FirestoreConfig,
    /// Collection whose document creations are handled
    pub users_collection: String,
    /// Collection listing administrators
    pub admins_collection: String,
    /// Outgoing mail relay
    pub smtp: SmtpConfig,
    /// Message content settings
    pub message: MessageConfig,
    /// Where the mail credentials come from
    pub secrets: SecretsConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

/// Firestore connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    /// When set, requests go over plain HTTP to this `host:port` without credentials.
    pub emulator_host: Option<String>,
}

/// SMTP relay settings. Credentials are resolved per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
}

/// Fixed parts of the notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageConfig {
    /// Display name on the From header
    pub sender_name: String,
    /// Admin portal link included in both bodies
    pub portal_url: String,
}

/// Backend used to resolve the mail credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretBackend {
    /// Process environment, as mounted by the hosting platform.
    #[default]
    Env,
    /// Google Secret Manager, latest version.
    SecretManager,
}

impl FromStr for SecretBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "env" => Ok(Self::Env),
            "secret-manager" => Ok(Self::SecretManager),
            other => Err(format!(
                "unknown secret source '{other}' (expected 'env' or 'secret-manager')"
            )),
        }
    }
}

/// Names of the two mail secrets and the backend holding them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretsConfig {
    pub backend: SecretBackend,
    /// Secret holding the mail account identity (sender address)
    pub user_secret: String,
    /// Secret holding the mail account password
    pub password_secret: String,
}

impl NotifierConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let host = env.parsed_or("HOST", "0.0.0.0")?;
        let port = env.parsed_or("PORT", "8080")?;

        let project_id = env
            .optional("GOOGLE_CLOUD_PROJECT")
            .or_else(|| env.optional("GCLOUD_PROJECT"))
            .ok_or_else(|| ConfigError::MissingEnvVar("GOOGLE_CLOUD_PROJECT".to_string()))?;

        let firestore = FirestoreConfig {
            project_id,
            database: env.or_default("FIRESTORE_DATABASE", "(default)"),
            emulator_host: env.optional("FIRESTORE_EMULATOR_HOST"),
        };

        let smtp = SmtpConfig {
            host: env.or_default("SMTP_HOST", DEFAULT_SMTP_HOST),
            port: env.parsed_or("SMTP_PORT", "587")?,
        };

        let portal_url = env.or_default("ADMIN_PORTAL_URL", DEFAULT_PORTAL_URL);
        Url::parse(&portal_url).map_err(|e| {
            ConfigError::InvalidEnvVar("ADMIN_PORTAL_URL".to_string(), e.to_string())
        })?;

        let message = MessageConfig {
            sender_name: env.or_default("NOTIFY_SENDER_NAME", DEFAULT_SENDER_NAME),
            portal_url,
        };

        let secrets = SecretsConfig {
            backend: env.parsed_or("SECRET_SOURCE", "env")?,
            user_secret: env.or_default("MAIL_USER_SECRET", DEFAULT_USER_SECRET),
            password_secret: env.or_default("MAIL_PASSWORD_SECRET", DEFAULT_PASSWORD_SECRET),
        };

        let sentry_sample_rate = env
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            firestore,
            users_collection: env.or_default("USERS_COLLECTION", "users"),
            admins_collection: env.or_default("ADMINS_COLLECTION", "admins"),
            smtp,
            message,
            secrets,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Variable lookup with the parsing helpers used by `from_lookup`.
struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Unset and empty values are both treated as missing.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<NotifierConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        NotifierConfig::from_lookup(|key| map.get(key).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("GOOGLE_CLOUD_PROJECT", "demo-project"),
        ("ADMIN_PORTAL_URL", "https://admin.example.org"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(MINIMAL).unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.firestore.project_id, "demo-project");
        assert_eq!(config.firestore.database, "(default)");
        assert_eq!(config.firestore.emulator_host, None);
        assert_eq!(config.users_collection, "users");
        assert_eq!(config.admins_collection, "admins");
        assert_eq!(config.smtp.host, "smtp.gmail.com");
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.message.sender_name, "App Notification");
        assert_eq!(config.secrets.backend, SecretBackend::Env);
        assert_eq!(config.secrets.user_secret, "GMAIL_EMAIL");
        assert_eq!(config.secrets.password_secret, "GMAIL_PASSWORD");
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_project() {
        let err = load(&[("ADMIN_PORTAL_URL", "https://admin.example.org")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "GOOGLE_CLOUD_PROJECT"));
    }

    #[test]
    fn test_gcloud_project_fallback() {
        let config = load(&[
            ("GCLOUD_PROJECT", "legacy-project"),
            ("ADMIN_PORTAL_URL", "https://admin.example.org"),
        ])
        .unwrap();
        assert_eq!(config.firestore.project_id, "legacy-project");
    }

    #[test]
    fn test_missing_portal_url_uses_fixed_default() {
        let config = load(&[("GOOGLE_CLOUD_PROJECT", "p")]).unwrap();
        assert_eq!(config.message.portal_url, DEFAULT_PORTAL_URL);
        assert!(Url::parse(&config.message.portal_url).is_ok());
    }

    #[test]
    fn test_invalid_portal_url() {
        let err = load(&[("GOOGLE_CLOUD_PROJECT", "p"), ("ADMIN_PORTAL_URL", "not a url")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "ADMIN_PORTAL_URL"));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("PORT", "eighty"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "PORT"));
    }

    #[test]
    fn test_secret_manager_backend() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("SECRET_SOURCE", "secret-manager"));
        vars.push(("MAIL_USER_SECRET", "SMTP_USER"));
        let config = load(&vars).unwrap();
        assert_eq!(config.secrets.backend, SecretBackend::SecretManager);
        assert_eq!(config.secrets.user_secret, "SMTP_USER");
    }

    #[test]
    fn test_unknown_secret_backend() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("SECRET_SOURCE", "vault"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_empty_value_uses_default() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("SMTP_HOST", ""));
        vars.push(("FIRESTORE_EMULATOR_HOST", ""));
        let config = load(&vars).unwrap();
        assert_eq!(config.smtp.host, "smtp.gmail.com");
        assert_eq!(config.firestore.emulator_host, None);
    }
}
