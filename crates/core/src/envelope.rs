use serde::{Deserialize, Serialize};

use crate::document::DocumentBlob;
use crate::types::{EnvelopeId, EnvelopeItemId, TeamId};

/// Prefix distinguishing public QR share tokens from recipient tokens.
pub const QR_TOKEN_PREFIX: &str = "qr_";

/// Lifecycle status of a signing envelope.
///
/// `Completed` implies every contained document payload is immutable, which
/// is what lets the delivery layer mark completed files as permanently
/// cacheable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvelopeStatus {
    Draft,
    Pending,
    Completed,
    Rejected,
}

impl EnvelopeStatus {
    /// Whether the envelope's document payloads can still change.
    #[must_use]
    pub fn is_mutable(self) -> bool {
        !matches!(self, Self::Completed)
    }
}

/// A recipient of an envelope, holding a scoped access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    /// Recipient email address.
    pub email: String,
    /// Access token granting this recipient read access to the envelope.
    pub token: String,
}

/// One document file within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeItem {
    pub id: EnvelopeItemId,
    pub envelope_id: EnvelopeId,
    /// Display title, also the basis for download filenames.
    pub title: String,
    /// Display sequence within the envelope; unique per envelope.
    pub order: i32,
    /// The item's document bytes and revisions.
    pub blob: DocumentBlob,
}

/// A signing transaction grouping one or more documents and recipients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub id: EnvelopeId,
    /// Ownership boundary used by the authorization gate.
    pub team_id: TeamId,
    pub status: EnvelopeStatus,
    /// Optional public share token (always `qr_`-prefixed when present).
    pub qr_token: Option<String>,
    pub items: Vec<EnvelopeItem>,
    pub recipients: Vec<Recipient>,
}

impl Envelope {
    /// Find an item by id.
    #[must_use]
    pub fn item(&self, item_id: &EnvelopeItemId) -> Option<&EnvelopeItem> {
        self.items.iter().find(|item| &item.id == item_id)
    }

    /// Items sorted by their display order.
    #[must_use]
    pub fn items_in_order(&self) -> Vec<&EnvelopeItem> {
        let mut items: Vec<&EnvelopeItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.order);
        items
    }
}

/// Whether a share token uses the public QR form.
#[must_use]
pub fn is_qr_token(token: &str) -> bool {
    token.starts_with(QR_TOKEN_PREFIX)
}
