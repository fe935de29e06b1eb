//! Envelope metadata: everything a client needs to lay out pages without
//! fetching a single image.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use serde::Serialize;

use signet_core::{Envelope, EnvelopeId, EnvelopeStatus, PageSize};

use crate::auth;
use crate::backfill;
use crate::error::ServerError;

use super::{AppState, TokenQuery};

#[derive(Debug, Serialize)]
pub struct MetaResponse {
    pub envelope_id: String,
    pub status: EnvelopeStatus,
    pub items: Vec<MetaItem>,
}

#[derive(Debug, Serialize)]
pub struct MetaItem {
    pub id: String,
    pub title: String,
    pub order: i32,
    /// Blob id for `initial`-version page URLs.
    pub initial_document_data_id: String,
    /// Blob id for `current`-version page URLs.
    pub current_document_data_id: String,
    pub page_count: usize,
    pub pages: Vec<PageSize>,
}

/// `GET /api/files/envelope/{envelope_id}/meta`
pub async fn envelope_meta(
    State(state): State<AppState>,
    Path(envelope_id): Path<String>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
) -> Result<Json<MetaResponse>, ServerError> {
    let (_, envelope) = auth::session_envelope(
        &state,
        &headers,
        query.token.as_deref(),
        &EnvelopeId::new(envelope_id),
    )
    .await?;
    build_meta(&state, &envelope).await
}

/// `GET /api/files/token/{token}/envelope/{envelope_id}/meta`
pub async fn envelope_meta_by_token(
    State(state): State<AppState>,
    Path((token, envelope_id)): Path<(String, String)>,
) -> Result<Json<MetaResponse>, ServerError> {
    let envelope =
        auth::envelope_by_share_token(&state, &token, &EnvelopeId::new(envelope_id)).await?;
    build_meta(&state, &envelope).await
}

async fn build_meta(state: &AppState, envelope: &Envelope) -> Result<Json<MetaResponse>, ServerError> {
    let mut items = Vec::with_capacity(envelope.items.len());
    for item in envelope.items_in_order() {
        let metadata = backfill::load_metadata(state, &item.blob).await?;
        items.push(MetaItem {
            id: item.id.as_str().to_owned(),
            title: item.title.clone(),
            order: item.order,
            initial_document_data_id: item.blob.id.as_str().to_owned(),
            current_document_data_id: item.blob.id.as_str().to_owned(),
            page_count: metadata.page_count(),
            pages: metadata.pages,
        });
    }

    Ok(Json(MetaResponse {
        envelope_id: envelope.id.as_str().to_owned(),
        status: envelope.status,
        items,
    }))
}
