//! Page image delivery with the two-tier lookup: pre-warmed object store
//! first, on-the-fly rendering as the fallback.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use bytes::Bytes;
use tracing::debug;

use signet_core::{EnvelopeId, EnvelopeItem, EnvelopeItemId, PageVersion, StorageKind};
use signet_storage::page_image_key;

use crate::auth;
use crate::delivery;
use crate::error::ServerError;

use super::{AppState, TokenQuery};

/// `GET /api/files/envelope/{envelope_id}/envelopeItem/{item_id}/dataId/{data_id}/{version}/{page_index}/image.jpeg`
pub async fn page_image(
    State(state): State<AppState>,
    Path((envelope_id, item_id, data_id, version, page_index)): Path<(
        String,
        String,
        String,
        String,
        usize,
    )>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let (_, envelope) = auth::session_envelope(
        &state,
        &headers,
        query.token.as_deref(),
        &EnvelopeId::new(envelope_id),
    )
    .await?;
    let item = envelope
        .item(&EnvelopeItemId::new(item_id))
        .ok_or(ServerError::NotFound)?;
    serve_page(&state, item, &data_id, &version, page_index, &headers).await
}

/// `GET /api/files/token/{token}/envelope/{envelope_id}/envelopeItem/{item_id}/dataId/{data_id}/{version}/{page_index}/image.jpeg`
pub async fn page_image_by_token(
    State(state): State<AppState>,
    Path((token, envelope_id, item_id, data_id, version, page_index)): Path<(
        String,
        String,
        String,
        String,
        String,
        usize,
    )>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let envelope =
        auth::envelope_by_share_token(&state, &token, &EnvelopeId::new(envelope_id)).await?;
    let item = envelope
        .item(&EnvelopeItemId::new(item_id))
        .ok_or(ServerError::NotFound)?;
    serve_page(&state, item, &data_id, &version, page_index, &headers).await
}

async fn serve_page(
    state: &AppState,
    item: &EnvelopeItem,
    data_id: &str,
    version: &str,
    page_index: usize,
    headers: &HeaderMap,
) -> Result<Response, ServerError> {
    // The data id in the URL must name this item's blob; a stale or foreign
    // id is indistinguishable from a missing resource.
    if item.blob.id.as_str() != data_id {
        return Err(ServerError::NotFound);
    }
    let version: PageVersion = version
        .parse()
        .map_err(|()| ServerError::BadRequest(format!("unknown page version: {version}")))?;

    let payload = item.blob.payload_for_page(version);
    let etag = delivery::page_etag(payload, page_index);
    if delivery::not_modified(headers, &etag) {
        return Ok(delivery::not_modified_response(&etag));
    }

    // Tier one: the pre-warmed image next to the document in the object
    // store. Only object-key payloads can have one.
    if item.blob.kind == StorageKind::ObjectKey {
        let key = page_image_key(payload, page_index)?;
        if let Some(bytes) = state.storage.objects().get(&key).await? {
            return Ok(delivery::jpeg_response(bytes, &etag));
        }
        debug!(key = %key, "no pre-warmed image, rendering on demand");
    }

    // Tier two: render the page now. The result is served but not written
    // back; the pre-warm job owns object-store writes.
    let bytes = state.storage.load_document(item.blob.kind, payload).await?;
    let image = state
        .rasterizer
        .render_page(Arc::new(bytes.to_vec()), page_index, state.render.scale)
        .await?;
    Ok(delivery::jpeg_response(Bytes::from(image.jpeg), &etag))
}
