//! Firestore REST client.
//!
//! Only what the notifier needs: listing every document of a collection and
//! decoding documents delivered in trigger payloads.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use super::value::decode_fields;
use super::{AccessTokenSource, GcpError, check_status};
use crate::config::FirestoreConfig;

const PRODUCTION_HOST: &str = "https://firestore.googleapis.com";

/// Documents requested per page when listing a collection.
const PAGE_SIZE: u32 = 300;

/// A document as Firestore encodes it on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    /// Full resource name, `projects/{p}/databases/{d}/documents/{path}`.
    pub name: String,
    /// Typed field values (`{"stringValue": ...}` and friends).
    #[serde(default)]
    pub fields: Map<String, Value>,
    pub create_time: Option<DateTime<Utc>>,
}

impl RawDocument {
    /// Decode typed fields into plain JSON.
    #[must_use]
    pub fn decode(self) -> Document {
        Document {
            fields: decode_fields(&self.fields),
            name: self.name,
            create_time: self.create_time,
        }
    }
}

/// A document with its fields decoded to plain JSON values.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub name: String,
    pub fields: Map<String, Value>,
    pub create_time: Option<DateTime<Utc>>,
}

impl Document {
    /// The last segment of the resource name.
    #[must_use]
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }
}

/// Collection path and document ID split out of a resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPath<'a> {
    /// Slash-separated collection path, e.g. `users` or `orgs/o1/users`.
    pub collection: &'a str,
    pub document_id: &'a str,
}

impl<'a> DocumentPath<'a> {
    /// Parse `projects/{p}/databases/{d}/documents/{collection...}/{id}`.
    ///
    /// Also accepts the relative `documents/...` form used in event subjects.
    /// Returns `None` when the name has no `documents/` segment or no
    /// collection in front of the ID.
    #[must_use]
    pub fn parse(name: &'a str) -> Option<Self> {
        let relative = match name.split_once("/documents/") {
            Some((_, rest)) => rest,
            None => name.strip_prefix("documents/")?,
        };

        let (collection, document_id) = relative.rsplit_once('/')?;
        if collection.is_empty() || document_id.is_empty() {
            return None;
        }

        Some(Self {
            collection,
            document_id,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

/// Firestore REST client.
///
/// Cheap to clone; clones share the HTTP connection pool and token cache.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
}

struct FirestoreClientInner {
    client: reqwest::Client,
    /// `{host}/v1/projects/{p}/databases/{d}/documents`
    documents_url: String,
    auth: AccessTokenSource,
}

impl FirestoreClient {
    /// Create a client for the configured project and database.
    ///
    /// Talks to the emulator without credentials when one is configured,
    /// otherwise to production with metadata server tokens.
    #[must_use]
    pub fn new(config: &FirestoreConfig, client: reqwest::Client) -> Self {
        let (host, auth) = match &config.emulator_host {
            Some(emulator) => (format!("http://{emulator}"), AccessTokenSource::Anonymous),
            None => (
                PRODUCTION_HOST.to_string(),
                AccessTokenSource::metadata(client.clone()),
            ),
        };

        Self::with_host(&host, config, client, auth)
    }

    /// Create a client against an explicit API host.
    #[must_use]
    pub fn with_host(
        host: &str,
        config: &FirestoreConfig,
        client: reqwest::Client,
        auth: AccessTokenSource,
    ) -> Self {
        let documents_url = format!(
            "{}/v1/projects/{}/databases/{}/documents",
            host.trim_end_matches('/'),
            urlencoding::encode(&config.project_id),
            config.database,
        );

        Self {
            inner: Arc::new(FirestoreClientInner {
                client,
                documents_url,
                auth,
            }),
        }
    }

    /// List every document in a collection, following page tokens.
    ///
    /// # Errors
    ///
    /// Returns `GcpError` if any page request fails or cannot be parsed.
    pub async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, GcpError> {
        let base = Url::parse(&format!("{}/{collection}", self.inner.documents_url))
            .map_err(|e| GcpError::Parse(format!("invalid collection URL: {e}")))?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0_u32;

        loop {
            let mut url = base.clone();
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &PAGE_SIZE.to_string());
                if let Some(token) = page_token.take() {
                    query.append_pair("pageToken", &token);
                }
            }

            let request = self.inner.client.get(url);
            let response = self.inner.auth.authorize(request).await?.send().await?;

            let page: ListDocumentsResponse = check_status(response)
                .await?
                .json()
                .await
                .map_err(|e| GcpError::Parse(e.to_string()))?;

            pages += 1;
            documents.extend(page.documents.into_iter().map(RawDocument::decode));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(collection, pages, count = documents.len(), "Listed documents");
        Ok(documents)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_path_full_name() {
        let path =
            DocumentPath::parse("projects/p/databases/(default)/documents/users/abc123").unwrap();
        assert_eq!(path.collection, "users");
        assert_eq!(path.document_id, "abc123");
    }

    #[test]
    fn test_document_path_relative_subject() {
        let path = DocumentPath::parse("documents/users/abc123").unwrap();
        assert_eq!(path.collection, "users");
        assert_eq!(path.document_id, "abc123");
    }

    #[test]
    fn test_document_path_subcollection() {
        let path =
            DocumentPath::parse("projects/p/databases/(default)/documents/orgs/o1/users/u1")
                .unwrap();
        assert_eq!(path.collection, "orgs/o1/users");
        assert_eq!(path.document_id, "u1");
    }

    #[test]
    fn test_document_path_invalid() {
        assert!(DocumentPath::parse("users/abc").is_none());
        assert!(DocumentPath::parse("projects/p/databases/d/documents/users").is_none());
        assert!(DocumentPath::parse("projects/p/databases/d/documents/users/").is_none());
    }

    #[test]
    fn test_raw_document_decode() {
        let raw: RawDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/admins/a1",
            "fields": {
                "email": {"stringValue": "admin@example.com"},
                "notificationPrefs": {"mapValue": {"fields": {"email": {"booleanValue": false}}}}
            },
            "createTime": "2026-01-02T03:04:05.678Z",
            "updateTime": "2026-01-02T03:04:05.678Z"
        }))
        .unwrap();

        let document = raw.decode();
        assert_eq!(document.id(), "a1");
        assert_eq!(
            Value::Object(document.fields),
            json!({"email": "admin@example.com", "notificationPrefs": {"email": false}})
        );
        assert!(document.create_time.is_some());
    }

    #[test]
    fn test_raw_document_without_fields() {
        let raw: RawDocument =
            serde_json::from_value(json!({"name": "projects/p/databases/d/documents/admins/x"}))
                .unwrap();
        assert!(raw.decode().fields.is_empty());
    }

    #[test]
    fn test_documents_url() {
        let config = FirestoreConfig {
            project_id: "demo".to_string(),
            database: "(default)".to_string(),
            emulator_host: Some("localhost:8081".to_string()),
        };
        let client = FirestoreClient::new(&config, reqwest::Client::new());
        assert_eq!(
            client.inner.documents_url,
            "http://localhost:8081/v1/projects/demo/databases/(default)/documents"
        );
    }
}
