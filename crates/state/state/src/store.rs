use async_trait::async_trait;

use signet_core::{
    DocumentBlob, DocumentBlobId, Envelope, EnvelopeId, EnvelopeItem, EnvelopeItemId,
    EnvelopeStatus, PageMetadata,
};

use crate::error::StateError;

/// Persistence boundary for envelopes, their items and document blobs.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// `save_page_metadata` in particular may be called concurrently by the
/// lazy backfill path; implementations apply last-writer-wins semantics,
/// which is safe because identical bytes always produce identical metadata.
#[async_trait]
pub trait EnvelopeStore: Send + Sync {
    /// Fetch an envelope with all items and blobs. `None` if unknown.
    async fn get_envelope(&self, id: &EnvelopeId) -> Result<Option<Envelope>, StateError>;

    /// Resolve an envelope through a recipient's access token.
    ///
    /// Returns `None` unless the token belongs to a recipient of exactly
    /// this envelope.
    async fn find_by_recipient_token(
        &self,
        token: &str,
        envelope_id: &EnvelopeId,
    ) -> Result<Option<Envelope>, StateError>;

    /// Resolve an envelope through its public QR share token.
    async fn find_by_qr_token(
        &self,
        token: &str,
        envelope_id: &EnvelopeId,
    ) -> Result<Option<Envelope>, StateError>;

    /// Resolve a single envelope item through a share token.
    ///
    /// `qr_`-prefixed tokens match the envelope's `qr_token` column and
    /// bypass the recipient table entirely; all other tokens must belong
    /// to a recipient of the item's envelope.
    async fn find_item_by_token(
        &self,
        token: &str,
        item_id: &EnvelopeItemId,
    ) -> Result<Option<(Envelope, EnvelopeItem)>, StateError>;

    /// Insert a new envelope (with its items and blobs).
    async fn insert_envelope(&self, envelope: Envelope) -> Result<(), StateError>;

    /// Insert a standalone blob record (upload pipeline, before the
    /// envelope item referencing it exists).
    async fn create_blob(&self, blob: DocumentBlob) -> Result<(), StateError>;

    /// Fetch a blob record by id.
    async fn get_blob(&self, id: &DocumentBlobId) -> Result<Option<DocumentBlob>, StateError>;

    /// Transition an envelope's status.
    async fn set_envelope_status(
        &self,
        id: &EnvelopeId,
        status: EnvelopeStatus,
    ) -> Result<(), StateError>;

    /// Persist derived page metadata onto a blob record.
    ///
    /// Overwrites any previous value. Called both by the eager
    /// post-normalization pipeline and by the on-demand backfill path;
    /// redundant writes with identical content are expected and harmless.
    async fn save_page_metadata(
        &self,
        blob_id: &DocumentBlobId,
        metadata: &PageMetadata,
    ) -> Result<(), StateError>;

    /// Record a background job failure.
    async fn record_dead_letter(&self, record: crate::DeadLetter) -> Result<(), StateError>;

    /// All recorded background job failures, oldest first.
    async fn dead_letters(&self) -> Result<Vec<crate::DeadLetter>, StateError>;
}
