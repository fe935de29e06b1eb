//! Whole-file delivery: inline views and downloads, session and token
//! variants.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;

use signet_core::{Envelope, EnvelopeId, EnvelopeItem, EnvelopeItemId, FileVersion};

use crate::auth;
use crate::delivery;
use crate::error::ServerError;

use super::{AppState, TokenQuery};

/// `GET /api/files/envelope/{envelope_id}/envelopeItem/{item_id}`
pub async fn view_file(
    State(state): State<AppState>,
    Path((envelope_id, item_id)): Path<(String, String)>,
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
    let item = find_item(&envelope, &item_id)?;
    serve_view(&state, &envelope, item, &headers).await
}

/// `GET /api/files/envelope/{envelope_id}/envelopeItem/{item_id}/download`
pub async fn download_file(
    State(state): State<AppState>,
    Path((envelope_id, item_id)): Path<(String, String)>,
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
    let item = find_item(&envelope, &item_id)?;
    serve_download(&state, item, FileVersion::Signed).await
}

/// `GET /api/files/envelope/{envelope_id}/envelopeItem/{item_id}/download/{version}`
pub async fn download_file_version(
    State(state): State<AppState>,
    Path((envelope_id, item_id, version)): Path<(String, String, String)>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let version = parse_version(&version)?;
    let (_, envelope) = auth::session_envelope(
        &state,
        &headers,
        query.token.as_deref(),
        &EnvelopeId::new(envelope_id),
    )
    .await?;
    let item = find_item(&envelope, &item_id)?;
    serve_download(&state, item, version).await
}

/// `GET /api/files/token/{token}/envelopeItem/{item_id}`
pub async fn view_file_by_token(
    State(state): State<AppState>,
    Path((token, item_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let (envelope, item) =
        auth::item_by_share_token(&state, &token, &EnvelopeItemId::new(item_id)).await?;
    serve_view(&state, &envelope, &item, &headers).await
}

/// `GET /api/files/token/{token}/envelopeItem/{item_id}/download`
pub async fn download_file_by_token(
    State(state): State<AppState>,
    Path((token, item_id)): Path<(String, String)>,
) -> Result<Response, ServerError> {
    let (_, item) =
        auth::item_by_share_token(&state, &token, &EnvelopeItemId::new(item_id)).await?;
    serve_download(&state, &item, FileVersion::Signed).await
}

/// `GET /api/files/token/{token}/envelopeItem/{item_id}/download/{version}`
pub async fn download_file_by_token_version(
    State(state): State<AppState>,
    Path((token, item_id, version)): Path<(String, String, String)>,
) -> Result<Response, ServerError> {
    let version = parse_version(&version)?;
    let (_, item) =
        auth::item_by_share_token(&state, &token, &EnvelopeItemId::new(item_id)).await?;
    serve_download(&state, &item, version).await
}

fn find_item<'a>(envelope: &'a Envelope, item_id: &str) -> Result<&'a EnvelopeItem, ServerError> {
    envelope
        .item(&EnvelopeItemId::new(item_id))
        .ok_or(ServerError::NotFound)
}

fn parse_version(version: &str) -> Result<FileVersion, ServerError> {
    version
        .parse()
        .map_err(|()| ServerError::BadRequest(format!("unknown file version: {version}")))
}

/// Serve the signed payload inline, honoring conditional requests.
async fn serve_view(
    state: &AppState,
    envelope: &Envelope,
    item: &EnvelopeItem,
    headers: &HeaderMap,
) -> Result<Response, ServerError> {
    let payload = item.blob.payload_for(FileVersion::Signed);
    let etag = delivery::file_etag(payload);
    if delivery::not_modified(headers, &etag) {
        return Ok(delivery::not_modified_response(&etag));
    }

    let bytes = state.storage.load_document(item.blob.kind, payload).await?;
    Ok(delivery::pdf_view_response(bytes, &etag, envelope.status))
}

/// Serve a download. Downloads ignore `If-None-Match` and carry
/// cache-defeating headers; a download must always produce bytes.
async fn serve_download(
    state: &AppState,
    item: &EnvelopeItem,
    version: FileVersion,
) -> Result<Response, ServerError> {
    let payload = item.blob.payload_for(version);
    let bytes = state.storage.load_document(item.blob.kind, payload).await?;
    let filename = delivery::download_filename(&item.title, version);
    Ok(delivery::pdf_download_response(bytes, &filename))
}
