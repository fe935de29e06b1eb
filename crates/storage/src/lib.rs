//! Document byte storage for Signet.
//!
//! Documents travel through one of two transports: inline base64 payloads
//! carried on the owning record, or keys into a pluggable [`ObjectStore`].
//! The [`DocumentStorage`] facade hides the distinction from callers;
//! rendered page images are keyed next to their document via
//! [`page_image_key`].

pub mod document;
pub mod error;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;
pub mod store;

pub use document::{DocumentStorage, StorageTransport, StoredDocument};
pub use error::StorageError;
pub use memory::MemoryObjectStore;
pub use store::{MAX_KEY_LEN, ObjectStore, page_image_key};
