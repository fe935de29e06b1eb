//! The authorization gate.
//!
//! Every route resolves its envelope and proves access before any document
//! byte is read. Session routes require team membership; token routes are
//! scoped by construction, since the store only resolves a token against
//! the envelope (or item) named in the path.

pub mod presign;
pub mod session;
pub mod teams;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use tracing::debug;

use signet_core::{Envelope, EnvelopeId, EnvelopeItem, EnvelopeItemId, UserId, is_qr_token};

use crate::api::AppState;
use crate::error::ServerError;

pub use presign::PresignManager;
pub use session::{MemorySessionResolver, SessionResolver};
pub use teams::{MemoryTeamDirectory, TeamDirectory};

/// Authenticate the caller and resolve the envelope they may see.
///
/// Accepts either a bearer session or a presign token from the query
/// string. Fails closed: an unverifiable presign token is treated exactly
/// like a missing one. An unauthenticated caller gets 401 before the
/// envelope is even looked up; an authenticated non-member gets 403.
pub async fn session_envelope(
    state: &AppState,
    headers: &HeaderMap,
    query_token: Option<&str>,
    envelope_id: &EnvelopeId,
) -> Result<(UserId, Envelope), ServerError> {
    let user = resolve_caller(state, headers, query_token)
        .await
        .ok_or(ServerError::Unauthorized)?;

    let envelope = state
        .store
        .get_envelope(envelope_id)
        .await?
        .ok_or(ServerError::NotFound)?;

    if !state.teams.is_member(&user, &envelope.team_id).await {
        debug!(user = %user, envelope_id = %envelope.id, "caller is not a member of the owning team");
        return Err(ServerError::Forbidden);
    }

    Ok((user, envelope))
}

/// Resolve a caller from a bearer session or a presign query token.
pub(crate) async fn resolve_caller(
    state: &AppState,
    headers: &HeaderMap,
    query_token: Option<&str>,
) -> Option<UserId> {
    if let Some(bearer) = bearer_token(headers) {
        if let Some(user) = state.sessions.resolve(bearer).await {
            return Some(user);
        }
    }
    query_token.and_then(|token| state.presign.verify(token))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve an envelope through a path share token (recipient or QR).
///
/// `NotFound` on any mismatch; the caller learns nothing about whether the
/// envelope exists.
pub async fn envelope_by_share_token(
    state: &AppState,
    token: &str,
    envelope_id: &EnvelopeId,
) -> Result<Envelope, ServerError> {
    let found = if is_qr_token(token) {
        state.store.find_by_qr_token(token, envelope_id).await?
    } else {
        state.store.find_by_recipient_token(token, envelope_id).await?
    };
    found.ok_or(ServerError::NotFound)
}

/// Resolve a single envelope item through a path share token.
pub async fn item_by_share_token(
    state: &AppState,
    token: &str,
    item_id: &EnvelopeItemId,
) -> Result<(Envelope, EnvelopeItem), ServerError> {
    state
        .store
        .find_item_by_token(token, item_id)
        .await?
        .ok_or(ServerError::NotFound)
}
