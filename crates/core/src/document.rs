use serde::{Deserialize, Serialize};

use crate::metadata::PageMetadata;
use crate::types::DocumentBlobId;

/// How a document payload is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageKind {
    /// The payload column holds the document bytes themselves, base64-encoded.
    Inline,
    /// The payload column holds an object-store key.
    ObjectKey,
}

/// Stored byte content (and revisions) of one envelope item.
///
/// `payload` is the current revision and is replaced as signing proceeds;
/// `original_payload` is the upload-time revision and never changes. Both
/// must independently decode to valid PDFs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentBlob {
    /// Opaque identity of this blob record.
    pub id: DocumentBlobId,
    /// Addressing mode for both payload columns.
    pub kind: StorageKind,
    /// Current (post-signing) payload: base64 text or object key.
    pub payload: String,
    /// Original (upload-time) payload, same encoding as `payload`.
    pub original_payload: String,
    /// Derived page metadata, computed at most once per payload value.
    /// `None` until the extraction pipeline or the backfill path fills it.
    pub metadata: Option<PageMetadata>,
}

impl DocumentBlob {
    /// Create a fresh blob whose current and original payloads coincide.
    #[must_use]
    pub fn new(id: DocumentBlobId, kind: StorageKind, payload: impl Into<String>) -> Self {
        let payload = payload.into();
        Self {
            id,
            kind,
            original_payload: payload.clone(),
            payload,
            metadata: None,
        }
    }

    /// Select the payload for a whole-file version.
    #[must_use]
    pub fn payload_for(&self, version: FileVersion) -> &str {
        match version {
            FileVersion::Signed => &self.payload,
            FileVersion::Original => &self.original_payload,
        }
    }

    /// Select the payload for a page-image version.
    #[must_use]
    pub fn payload_for_page(&self, version: PageVersion) -> &str {
        match version {
            PageVersion::Current => &self.payload,
            PageVersion::Initial => &self.original_payload,
        }
    }
}

/// Which revision of a whole file to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileVersion {
    /// The current payload, including any applied signatures.
    Signed,
    /// The payload as originally uploaded.
    Original,
}

/// Which revision of a page image to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageVersion {
    /// The payload as originally uploaded.
    Initial,
    /// The current payload.
    Current,
}

impl std::str::FromStr for FileVersion {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signed" => Ok(Self::Signed),
            "original" => Ok(Self::Original),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for PageVersion {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(Self::Initial),
            "current" => Ok(Self::Current),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_selection_tracks_version() {
        let mut blob = DocumentBlob::new(
            DocumentBlobId::new("blob-1"),
            StorageKind::Inline,
            "original-bytes",
        );
        blob.payload = "signed-bytes".to_owned();

        assert_eq!(blob.payload_for(FileVersion::Signed), "signed-bytes");
        assert_eq!(blob.payload_for(FileVersion::Original), "original-bytes");
        assert_eq!(blob.payload_for_page(PageVersion::Current), "signed-bytes");
        assert_eq!(blob.payload_for_page(PageVersion::Initial), "original-bytes");
    }

    #[test]
    fn storage_kind_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&StorageKind::ObjectKey).unwrap(),
            "\"OBJECT_KEY\""
        );
    }
}
