use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageError;

/// Keys longer than this cannot be object-store keys; anything bigger is
/// almost certainly a base64 document payload passed where a key was
/// expected.
pub const MAX_KEY_LEN: usize = 100;

/// Pluggable object storage backend.
///
/// Implementors provide the actual storage mechanism (S3, in-memory).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object under the given key, overwriting any previous value.
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> Result<(), StorageError>;

    /// Retrieve an object by key. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<T> {
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> Result<(), StorageError> {
        (**self).put(key, content_type, data).await
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        (**self).get(key).await
    }
}

/// Derive the object-store key for one rendered page image.
///
/// Page images live next to the document under its key prefix:
/// `{prefix}/{page_index}.jpeg`, where `prefix` is the first `/`-segment
/// of the document's payload key. Fails with [`StorageError::InvalidKey`]
/// when the payload cannot be a key (inline base64 handed in by mistake).
pub fn page_image_key(document_payload: &str, page_index: usize) -> Result<String, StorageError> {
    if document_payload.len() > MAX_KEY_LEN {
        return Err(StorageError::InvalidKey(format!(
            "candidate key is {} bytes long, refusing to treat document bytes as a key",
            document_payload.len()
        )));
    }

    let prefix = document_payload
        .split('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| StorageError::InvalidKey(document_payload.to_owned()))?;

    Ok(format!("{prefix}/{page_index}.jpeg"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_image_key_uses_first_path_segment() {
        let key = page_image_key("ab12cd34/contract.pdf", 3).unwrap();
        assert_eq!(key, "ab12cd34/3.jpeg");
    }

    #[test]
    fn page_image_key_rejects_oversized_payloads() {
        let payload = "A".repeat(MAX_KEY_LEN + 1);
        let err = page_image_key(&payload, 0).unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[test]
    fn page_image_key_rejects_empty_prefix() {
        assert!(page_image_key("/orphan.pdf", 0).is_err());
    }
}
