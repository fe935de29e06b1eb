use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded failure from a background job.
///
/// Background work (page-image extraction, cache pre-warming) must never
/// fail an otherwise-successful user-facing operation, so instead of
/// propagating, failures are written here where they stay observable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetter {
    /// Short machine-readable job kind (e.g. `"extract_page_images"`).
    pub job: String,
    /// Identifier of the entity the job was operating on.
    pub subject: String,
    /// Human-readable failure description.
    pub error: String,
    /// When the failure was recorded.
    pub failed_at: DateTime<Utc>,
}

impl DeadLetter {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(job: impl Into<String>, subject: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            subject: subject.into(),
            error: error.into(),
            failed_at: Utc::now(),
        }
    }
}
