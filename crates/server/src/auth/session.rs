use async_trait::async_trait;
use dashmap::DashMap;

use signet_core::UserId;

/// Resolves bearer tokens to users.
///
/// The session system itself lives outside this service; the server only
/// needs the lookup.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolve a bearer token. `None` for unknown or expired tokens.
    async fn resolve(&self, bearer: &str) -> Option<UserId>;
}

/// In-memory session table for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemorySessionResolver {
    sessions: DashMap<String, UserId>,
}

impl MemorySessionResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_session(&self, bearer: impl Into<String>, user: UserId) {
        self.sessions.insert(bearer.into(), user);
    }
}

#[async_trait]
impl SessionResolver for MemorySessionResolver {
    async fn resolve(&self, bearer: &str) -> Option<UserId> {
        self.sessions.get(bearer).map(|entry| entry.value().clone())
    }
}
