//! PDF upload: size check, normalization, storage, background extraction.

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use signet_core::{DocumentBlob, DocumentBlobId, StorageKind};
use signet_pdf::{NormalizeOptions, PdfError, normalize_pdf};

use crate::error::ServerError;
use crate::extract::spawn_extraction;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub document_data_id: String,
    pub kind: StorageKind,
}

/// `POST /api/files/upload-pdf` -- multipart upload of a single PDF.
///
/// Accepts a `file` field plus optional `title` and `password` fields.
/// The stored document is always the normalized form; the raw upload is
/// discarded. Metadata extraction and page pre-warming run in the
/// background and never delay the response.
pub async fn upload_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ServerError> {
    // Uploads require a real session; presign tokens only grant reads.
    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ServerError::Unauthorized)?;
    let user = state
        .sessions
        .resolve(bearer)
        .await
        .ok_or(ServerError::Unauthorized)?;

    let mut file: Option<(Bytes, String)> = None;
    let mut title: Option<String> = None;
    let mut password: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::BadRequest(err.to_string()))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("document.pdf").to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ServerError::BadRequest(err.to_string()))?;
                file = Some((bytes, filename));
            }
            Some("title") => {
                title = Some(read_text(field).await?);
            }
            Some("password") => {
                password = Some(read_text(field).await?);
            }
            _ => {}
        }
    }

    let (bytes, filename) =
        file.ok_or_else(|| ServerError::BadRequest("missing file field".to_owned()))?;
    if bytes.len() > state.max_upload_bytes {
        return Err(ServerError::PayloadTooLarge { limit: state.max_upload_bytes });
    }

    let options = NormalizeOptions { keep_form: false, password };
    let normalized = tokio::task::spawn_blocking(move || normalize_pdf(&bytes, &options))
        .await
        .map_err(|err| ServerError::Pdf(PdfError::Render(err.to_string())))??;

    let filename = title.unwrap_or(filename);
    let stored = state
        .storage
        .store_document(Bytes::from(normalized), &filename)
        .await?;

    let blob = DocumentBlob::new(
        DocumentBlobId::new(Uuid::new_v4().to_string()),
        stored.kind,
        stored.payload,
    );
    state.store.create_blob(blob.clone()).await?;
    info!(user = %user, blob_id = %blob.id, "stored uploaded document");

    spawn_extraction(state.clone(), blob.id.clone());

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            document_data_id: blob.id.as_str().to_owned(),
            kind: blob.kind,
        }),
    ))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ServerError> {
    field
        .text()
        .await
        .map_err(|err| ServerError::BadRequest(err.to_string()))
}
