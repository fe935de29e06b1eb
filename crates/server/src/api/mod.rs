pub mod files;
pub mod health;
pub mod meta;
pub mod pages;
pub mod upload;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use signet_pdf::Rasterizer;
use signet_state::EnvelopeStore;
use signet_storage::{DocumentStorage, ObjectStore};

use crate::auth::{PresignManager, SessionResolver, TeamDirectory};
use crate::config::RenderConfig;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EnvelopeStore>,
    pub storage: Arc<DocumentStorage<Arc<dyn ObjectStore>>>,
    pub rasterizer: Arc<Rasterizer>,
    pub sessions: Arc<dyn SessionResolver>,
    pub teams: Arc<dyn TeamDirectory>,
    pub presign: Arc<PresignManager>,
    pub render: Arc<RenderConfig>,
    pub max_upload_bytes: usize,
}

/// Optional presign token carried in the query string of session routes.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Build the Axum router with all API routes and middleware.
pub fn router(state: AppState) -> Router {
    // Multipart parsing needs headroom above the document limit itself.
    let body_limit = state.max_upload_bytes + 1024 * 1024;

    Router::new()
        .route("/health", get(health::health))
        // Upload
        .route("/api/files/upload-pdf", post(upload::upload_pdf))
        // Envelope metadata
        .route("/api/files/envelope/{envelope_id}/meta", get(meta::envelope_meta))
        .route(
            "/api/files/token/{token}/envelope/{envelope_id}/meta",
            get(meta::envelope_meta_by_token),
        )
        // Whole files: view and download
        .route(
            "/api/files/envelope/{envelope_id}/envelopeItem/{item_id}",
            get(files::view_file),
        )
        .route(
            "/api/files/envelope/{envelope_id}/envelopeItem/{item_id}/download",
            get(files::download_file),
        )
        .route(
            "/api/files/envelope/{envelope_id}/envelopeItem/{item_id}/download/{version}",
            get(files::download_file_version),
        )
        .route(
            "/api/files/token/{token}/envelopeItem/{item_id}",
            get(files::view_file_by_token),
        )
        .route(
            "/api/files/token/{token}/envelopeItem/{item_id}/download",
            get(files::download_file_by_token),
        )
        .route(
            "/api/files/token/{token}/envelopeItem/{item_id}/download/{version}",
            get(files::download_file_by_token_version),
        )
        // Page images
        .route(
            "/api/files/envelope/{envelope_id}/envelopeItem/{item_id}/dataId/{data_id}/{version}/{page_index}/image.jpeg",
            get(pages::page_image),
        )
        .route(
            "/api/files/token/{token}/envelope/{envelope_id}/envelopeItem/{item_id}/dataId/{data_id}/{version}/{page_index}/image.jpeg",
            get(pages::page_image_by_token),
        )
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
