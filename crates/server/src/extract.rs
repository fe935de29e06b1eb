//! Background metadata extraction and page-image pre-warming.
//!
//! Runs after every successful upload. Failures never surface to the
//! uploader; they land in the dead-letter table where operators can see
//! and replay them. The read path tolerates a job that never ran: metadata
//! is backfilled on demand, page images fall back to on-the-fly rendering.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, TryStreamExt};
use signet_core::{DocumentBlobId, StorageKind};
use signet_state::DeadLetter;
use signet_storage::page_image_key;
use tracing::{error, info, warn};

use crate::api::AppState;
use crate::error::ServerError;

const JOB_NAME: &str = "extract_page_images";

/// Spawn the extraction job for a freshly stored blob.
pub fn spawn_extraction(state: AppState, blob_id: DocumentBlobId) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = run(&state, &blob_id).await {
            warn!(blob_id = %blob_id, error = %err, "extraction job failed");
            let record = DeadLetter::new(JOB_NAME, blob_id.as_str(), err.to_string());
            if let Err(store_err) = state.store.record_dead_letter(record).await {
                error!(blob_id = %blob_id, error = %store_err, "failed to record dead letter");
            }
        }
    })
}

async fn run(state: &AppState, blob_id: &DocumentBlobId) -> Result<(), ServerError> {
    let blob = state
        .store
        .get_blob(blob_id)
        .await?
        .ok_or(ServerError::NotFound)?;

    let bytes = state.storage.load_document(blob.kind, &blob.payload).await?;
    let data = Arc::new(bytes.to_vec());

    let metadata = signet_pdf::page_dimensions(&data)?;
    state.store.save_page_metadata(&blob.id, &metadata).await?;

    // Pre-warmed images are only worth persisting when the document itself
    // lives in the object store; inline documents render on demand.
    if blob.kind == StorageKind::ObjectKey {
        let images = state
            .rasterizer
            .render_all_within(
                data,
                state.render.scale,
                Duration::from_secs(state.render.batch_timeout_seconds),
            )
            .await?;
        let count = images.len();
        stream::iter(images.into_iter().map(Ok))
            .try_for_each_concurrent(state.render.max_concurrent_uploads, |image| {
                let payload = &blob.payload;
                let storage = &state.storage;
                async move {
                    let key = page_image_key(payload, image.page_index)?;
                    storage
                        .objects()
                        .put(&key, "image/jpeg", Bytes::from(image.jpeg))
                        .await?;
                    Ok::<(), ServerError>(())
                }
            })
            .await?;
        info!(blob_id = %blob.id, pages = count, "pre-warmed page images");
    } else {
        info!(blob_id = %blob.id, pages = metadata.page_count(), "extracted page metadata");
    }

    Ok(())
}
