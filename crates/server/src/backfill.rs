use std::sync::Arc;

use signet_core::{DocumentBlob, PageMetadata};
use tracing::debug;

use crate::api::AppState;
use crate::error::ServerError;

/// Return a blob's page metadata, deriving and persisting it on first use.
///
/// Blobs created before metadata extraction existed (or whose background
/// job died) are healed here on the read path. The write is
/// last-writer-wins in the store; racing backfills recompute identical
/// metadata from identical bytes, so the race is harmless.
pub async fn load_metadata(
    state: &AppState,
    blob: &DocumentBlob,
) -> Result<PageMetadata, ServerError> {
    if let Some(metadata) = &blob.metadata {
        return Ok(metadata.clone());
    }

    let bytes = state.storage.load_document(blob.kind, &blob.payload).await?;
    let metadata = signet_pdf::page_dimensions(&Arc::new(bytes.to_vec()))?;
    state.store.save_page_metadata(&blob.id, &metadata).await?;
    debug!(
        blob_id = %blob.id,
        pages = metadata.page_count(),
        "backfilled page metadata"
    );
    Ok(metadata)
}
