//! Admin directory backed by a Firestore collection.

use registration_notifier_core::AdminRecord;

use super::{AdminDirectory, DirectoryError};
use crate::gcp::FirestoreClient;

/// Reads admins from a Firestore collection.
#[derive(Clone)]
pub struct FirestoreAdminDirectory {
    client: FirestoreClient,
    collection: String,
}

impl FirestoreAdminDirectory {
    /// Create a directory over `collection`.
    #[must_use]
    pub fn new(client: FirestoreClient, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }
}

impl AdminDirectory for FirestoreAdminDirectory {
    async fn list_admins(&self) -> Result<Vec<AdminRecord>, DirectoryError> {
        let documents = self.client.list_documents(&self.collection).await?;

        Ok(documents
            .iter()
            .map(|document| AdminRecord::from_fields(document.id(), &document.fields))
            .collect())
    }
}
