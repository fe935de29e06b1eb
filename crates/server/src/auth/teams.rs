use async_trait::async_trait;
use dashmap::DashMap;

use signet_core::{TeamId, UserId};

/// Answers team membership questions for the authorization gate.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn is_member(&self, user: &UserId, team: &TeamId) -> bool;
}

/// In-memory team membership table.
#[derive(Debug, Default)]
pub struct MemoryTeamDirectory {
    members: DashMap<String, Vec<String>>,
}

impl MemoryTeamDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, team: &TeamId, user: &UserId) {
        self.members
            .entry(team.as_str().to_owned())
            .or_default()
            .push(user.as_str().to_owned());
    }
}

#[async_trait]
impl TeamDirectory for MemoryTeamDirectory {
    async fn is_member(&self, user: &UserId, team: &TeamId) -> bool {
        self.members
            .get(team.as_str())
            .is_some_and(|users| users.iter().any(|member| member == user.as_str()))
    }
}
