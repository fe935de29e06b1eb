use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use signet_core::StorageKind;
use tracing::debug;
use uuid::Uuid;

use crate::error::StorageError;
use crate::store::ObjectStore;

/// Which transport newly stored documents go to.
///
/// Existing documents carry their own [`StorageKind`] and are always read
/// back through whatever transport wrote them, regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageTransport {
    /// Base64-encode document bytes into the payload itself.
    #[default]
    Inline,
    /// Write document bytes to the object store and keep only the key.
    ObjectStore,
}

/// Result of storing a document: the kind/payload pair to persist on the
/// owning record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub kind: StorageKind,
    pub payload: String,
}

/// Facade over the two document storage transports.
///
/// Inline documents round-trip through base64 without touching the object
/// store. Object-key documents are written under a fresh `{uuid}/{filename}`
/// key so sibling artifacts (page images) can share the uuid prefix.
pub struct DocumentStorage<S> {
    objects: S,
    transport: StorageTransport,
}

impl<S: ObjectStore> DocumentStorage<S> {
    pub fn new(objects: S, transport: StorageTransport) -> Self {
        Self { objects, transport }
    }

    pub fn transport(&self) -> StorageTransport {
        self.transport
    }

    /// The underlying object store, for callers that manage derived
    /// artifacts (page images) directly.
    pub fn objects(&self) -> &S {
        &self.objects
    }

    /// Store a document's bytes and return the kind/payload to persist.
    pub async fn store_document(
        &self,
        data: Bytes,
        filename: &str,
    ) -> Result<StoredDocument, StorageError> {
        match self.transport {
            StorageTransport::Inline => Ok(StoredDocument {
                kind: StorageKind::Inline,
                payload: BASE64.encode(&data),
            }),
            StorageTransport::ObjectStore => {
                let key = object_key(filename);
                debug!(key = %key, size = data.len(), "writing document to object store");
                self.objects.put(&key, "application/pdf", data).await?;
                Ok(StoredDocument {
                    kind: StorageKind::ObjectKey,
                    payload: key,
                })
            }
        }
    }

    /// Load a document's bytes back from its kind/payload pair.
    pub async fn load_document(
        &self,
        kind: StorageKind,
        payload: &str,
    ) -> Result<Bytes, StorageError> {
        match kind {
            StorageKind::Inline => {
                let decoded = BASE64
                    .decode(payload)
                    .map_err(|err| StorageError::InvalidPayload(err.to_string()))?;
                Ok(Bytes::from(decoded))
            }
            StorageKind::ObjectKey => self
                .objects
                .get(payload)
                .await?
                .ok_or_else(|| StorageError::NotFound(payload.to_owned())),
        }
    }
}

/// Build a fresh object key for an uploaded document.
///
/// The uuid prefix keeps unrelated uploads with the same filename apart and
/// doubles as the prefix page images are keyed under.
fn object_key(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}/{safe}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryObjectStore;
    use crate::store::page_image_key;

    fn inline_storage() -> DocumentStorage<MemoryObjectStore> {
        DocumentStorage::new(MemoryObjectStore::new(), StorageTransport::Inline)
    }

    fn object_storage() -> DocumentStorage<MemoryObjectStore> {
        DocumentStorage::new(MemoryObjectStore::new(), StorageTransport::ObjectStore)
    }

    #[tokio::test]
    async fn inline_round_trip() {
        let storage = inline_storage();
        let stored = storage
            .store_document(Bytes::from_static(b"%PDF-1.7 tiny"), "tiny.pdf")
            .await
            .unwrap();

        assert_eq!(stored.kind, StorageKind::Inline);
        assert!(storage.objects().is_empty());

        let bytes = storage
            .load_document(stored.kind, &stored.payload)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.7 tiny");
    }

    #[tokio::test]
    async fn inline_rejects_garbage_payload() {
        let storage = inline_storage();
        let err = storage
            .load_document(StorageKind::Inline, "not!!base64@@")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn object_round_trip_keys_under_uuid_prefix() {
        let storage = object_storage();
        let stored = storage
            .store_document(Bytes::from_static(b"doc"), "contract.pdf")
            .await
            .unwrap();

        assert_eq!(stored.kind, StorageKind::ObjectKey);
        let (prefix, name) = stored.payload.split_once('/').unwrap();
        assert!(Uuid::parse_str(prefix).is_ok());
        assert_eq!(name, "contract.pdf");

        let bytes = storage
            .load_document(stored.kind, &stored.payload)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"doc");
    }

    #[tokio::test]
    async fn object_key_sanitizes_filename() {
        let storage = object_storage();
        let stored = storage
            .store_document(Bytes::from_static(b"doc"), "my contract (v2).pdf")
            .await
            .unwrap();
        let (_, name) = stored.payload.split_once('/').unwrap();
        assert_eq!(name, "my_contract__v2_.pdf");
    }

    #[tokio::test]
    async fn document_key_is_valid_page_image_prefix() {
        let storage = object_storage();
        let stored = storage
            .store_document(Bytes::from_static(b"doc"), "a.pdf")
            .await
            .unwrap();
        let image_key = page_image_key(&stored.payload, 0).unwrap();
        assert!(stored.payload.starts_with(image_key.split('/').next().unwrap()));
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let storage = object_storage();
        let err = storage
            .load_document(StorageKind::ObjectKey, "deadbeef/gone.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
