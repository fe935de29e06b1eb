use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::error::StorageError;
use crate::store::ObjectStore;

/// In-memory [`ObjectStore`] backed by a [`DashMap`].
///
/// Used by tests and by deployments that keep documents inline in the
/// database but still want page-image caching within one process.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<String, Bytes>,
}

impl MemoryObjectStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, _content_type: &str, data: Bytes) -> Result<(), StorageError> {
        self.objects.insert(key.to_owned(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        Ok(self.objects.get(key).map(|entry| entry.value().clone()))
    }
}
