//! Core domain types for the Signet envelope rendering service.
//!
//! This crate defines the data model shared by the storage, state, PDF and
//! HTTP layers: envelopes, envelope items, document blobs and derived page
//! metadata. It deliberately contains no I/O.

pub mod document;
pub mod envelope;
pub mod metadata;
pub mod types;

pub use document::{DocumentBlob, FileVersion, PageVersion, StorageKind};
pub use envelope::{is_qr_token, Envelope, EnvelopeItem, EnvelopeStatus, Recipient, QR_TOKEN_PREFIX};
pub use metadata::{PageMetadata, PageSize};
pub use types::{DocumentBlobId, EnvelopeId, EnvelopeItemId, TeamId, UserId};
