use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use signet_core::{
    is_qr_token, DocumentBlob, DocumentBlobId, Envelope, EnvelopeId, EnvelopeItem, EnvelopeItemId,
    EnvelopeStatus, PageMetadata,
};
use signet_state::{DeadLetter, EnvelopeStore, StateError};

/// In-memory [`EnvelopeStore`] backed by [`DashMap`]s.
///
/// Blobs are stored separately from envelopes and joined on read, so a
/// metadata write through `save_page_metadata` is visible to every
/// envelope view immediately. Suitable for tests and single-process
/// deployments.
#[derive(Debug, Default)]
pub struct MemoryEnvelopeStore {
    envelopes: DashMap<String, Envelope>,
    blobs: DashMap<String, DocumentBlob>,
    dead_letters: Mutex<Vec<DeadLetter>>,
}

impl MemoryEnvelopeStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble an envelope view with current blob records joined in.
    fn hydrate(&self, envelope: &Envelope) -> Envelope {
        let mut view = envelope.clone();
        for item in &mut view.items {
            if let Some(blob) = self.blobs.get(item.blob.id.as_str()) {
                item.blob = blob.clone();
            }
        }
        view
    }
}

#[async_trait]
impl EnvelopeStore for MemoryEnvelopeStore {
    async fn get_envelope(&self, id: &EnvelopeId) -> Result<Option<Envelope>, StateError> {
        Ok(self
            .envelopes
            .get(id.as_str())
            .map(|envelope| self.hydrate(&envelope)))
    }

    async fn find_by_recipient_token(
        &self,
        token: &str,
        envelope_id: &EnvelopeId,
    ) -> Result<Option<Envelope>, StateError> {
        let Some(envelope) = self.envelopes.get(envelope_id.as_str()) else {
            return Ok(None);
        };

        let matches = envelope
            .recipients
            .iter()
            .any(|recipient| recipient.token == token);

        Ok(matches.then(|| self.hydrate(&envelope)))
    }

    async fn find_by_qr_token(
        &self,
        token: &str,
        envelope_id: &EnvelopeId,
    ) -> Result<Option<Envelope>, StateError> {
        let Some(envelope) = self.envelopes.get(envelope_id.as_str()) else {
            return Ok(None);
        };

        let matches = envelope.qr_token.as_deref() == Some(token);

        Ok(matches.then(|| self.hydrate(&envelope)))
    }

    async fn find_item_by_token(
        &self,
        token: &str,
        item_id: &EnvelopeItemId,
    ) -> Result<Option<(Envelope, EnvelopeItem)>, StateError> {
        for envelope in &self.envelopes {
            if envelope.item(item_id).is_none() {
                continue;
            }

            let granted = if is_qr_token(token) {
                envelope.qr_token.as_deref() == Some(token)
            } else {
                envelope
                    .recipients
                    .iter()
                    .any(|recipient| recipient.token == token)
            };

            if granted {
                let view = self.hydrate(&envelope);
                let found = view.item(item_id).cloned();
                return Ok(found.map(|found| (view, found)));
            }
            // Item exists but the token does not grant it.
            return Ok(None);
        }

        Ok(None)
    }

    async fn insert_envelope(&self, envelope: Envelope) -> Result<(), StateError> {
        for item in &envelope.items {
            self.blobs
                .insert(item.blob.id.as_str().to_owned(), item.blob.clone());
        }
        self.envelopes
            .insert(envelope.id.as_str().to_owned(), envelope);
        Ok(())
    }

    async fn create_blob(&self, blob: DocumentBlob) -> Result<(), StateError> {
        self.blobs.insert(blob.id.as_str().to_owned(), blob);
        Ok(())
    }

    async fn get_blob(&self, id: &DocumentBlobId) -> Result<Option<DocumentBlob>, StateError> {
        Ok(self.blobs.get(id.as_str()).map(|blob| blob.value().clone()))
    }

    async fn set_envelope_status(
        &self,
        id: &EnvelopeId,
        status: EnvelopeStatus,
    ) -> Result<(), StateError> {
        let mut envelope = self
            .envelopes
            .get_mut(id.as_str())
            .ok_or_else(|| StateError::NotFound(id.to_string()))?;
        envelope.status = status;
        Ok(())
    }

    async fn save_page_metadata(
        &self,
        blob_id: &DocumentBlobId,
        metadata: &PageMetadata,
    ) -> Result<(), StateError> {
        let mut blob = self
            .blobs
            .get_mut(blob_id.as_str())
            .ok_or_else(|| StateError::NotFound(blob_id.to_string()))?;
        // Last-writer-wins: concurrent backfills write identical values.
        blob.metadata = Some(metadata.clone());
        Ok(())
    }

    async fn record_dead_letter(&self, record: DeadLetter) -> Result<(), StateError> {
        self.dead_letters
            .lock()
            .map_err(|e| StateError::Backend(e.to_string()))?
            .push(record);
        Ok(())
    }

    async fn dead_letters(&self) -> Result<Vec<DeadLetter>, StateError> {
        Ok(self
            .dead_letters
            .lock()
            .map_err(|e| StateError::Backend(e.to_string()))?
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signet_core::{PageSize, Recipient, StorageKind, TeamId};

    fn sample_envelope() -> Envelope {
        Envelope {
            id: EnvelopeId::new("env-1"),
            team_id: TeamId::new("team-1"),
            status: EnvelopeStatus::Draft,
            qr_token: Some("qr_public".to_owned()),
            items: vec![EnvelopeItem {
                id: EnvelopeItemId::new("item-1"),
                envelope_id: EnvelopeId::new("env-1"),
                title: "contract.pdf".to_owned(),
                order: 1,
                blob: DocumentBlob::new(
                    DocumentBlobId::new("blob-1"),
                    StorageKind::Inline,
                    "payload",
                ),
            }],
            recipients: vec![Recipient {
                email: "signer@example.com".to_owned(),
                token: "recipient-token".to_owned(),
            }],
        }
    }

    #[tokio::test]
    async fn metadata_write_is_visible_through_envelope_view() {
        let store = MemoryEnvelopeStore::new();
        store.insert_envelope(sample_envelope()).await.unwrap();

        let metadata = PageMetadata {
            pages: vec![PageSize {
                width: 612.0,
                height: 792.0,
            }],
        };
        store
            .save_page_metadata(&DocumentBlobId::new("blob-1"), &metadata)
            .await
            .unwrap();

        let envelope = store
            .get_envelope(&EnvelopeId::new("env-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(envelope.items[0].blob.metadata, Some(metadata));
    }

    #[tokio::test]
    async fn concurrent_metadata_writes_converge() {
        use std::sync::Arc;

        let store = Arc::new(MemoryEnvelopeStore::new());
        store.insert_envelope(sample_envelope()).await.unwrap();

        let metadata = PageMetadata {
            pages: vec![PageSize {
                width: 595.0,
                height: 842.0,
            }],
        };

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let metadata = metadata.clone();
            handles.push(tokio::spawn(async move {
                store
                    .save_page_metadata(&DocumentBlobId::new("blob-1"), &metadata)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let blob = store
            .get_blob(&DocumentBlobId::new("blob-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(blob.metadata, Some(metadata));
    }

    #[tokio::test]
    async fn dead_letters_accumulate_in_order() {
        let store = MemoryEnvelopeStore::new();
        store
            .record_dead_letter(DeadLetter::new("extract_page_images", "blob-1", "boom"))
            .await
            .unwrap();
        store
            .record_dead_letter(DeadLetter::new("extract_page_images", "blob-2", "bang"))
            .await
            .unwrap();

        let records = store.dead_letters().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].subject, "blob-1");
        assert_eq!(records[1].subject, "blob-2");
    }

    #[tokio::test]
    async fn status_transition_is_visible_on_read() {
        let store = MemoryEnvelopeStore::new();
        store.insert_envelope(sample_envelope()).await.unwrap();

        store
            .set_envelope_status(&EnvelopeId::new("env-1"), EnvelopeStatus::Completed)
            .await
            .unwrap();

        let envelope = store
            .get_envelope(&EnvelopeId::new("env-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(envelope.status, EnvelopeStatus::Completed);

        let err = store
            .set_envelope_status(&EnvelopeId::new("ghost"), EnvelopeStatus::Draft)
            .await
            .unwrap_err();
        assert!(matches!(err, StateError::NotFound(_)));
    }

    #[tokio::test]
    async fn recipient_token_is_scoped_to_its_envelope() {
        let store = MemoryEnvelopeStore::new();
        store.insert_envelope(sample_envelope()).await.unwrap();

        let hit = store
            .find_by_recipient_token("recipient-token", &EnvelopeId::new("env-1"))
            .await
            .unwrap();
        assert!(hit.is_some());

        let miss = store
            .find_by_recipient_token("other-token", &EnvelopeId::new("env-1"))
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn qr_token_resolves_item_without_recipient_lookup() {
        let store = MemoryEnvelopeStore::new();
        store.insert_envelope(sample_envelope()).await.unwrap();

        let hit = store
            .find_item_by_token("qr_public", &EnvelopeItemId::new("item-1"))
            .await
            .unwrap();
        assert!(hit.is_some());

        let miss = store
            .find_item_by_token("qr_wrong", &EnvelopeItemId::new("item-1"))
            .await
            .unwrap();
        assert!(miss.is_none());
    }
}
