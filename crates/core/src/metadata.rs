use serde::{Deserialize, Serialize};

/// Dimensions of a single PDF page in unscaled user-space units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    /// Page width at scale 1.
    pub width: f64,
    /// Page height at scale 1.
    pub height: f64,
}

/// Derived per-page metadata for one document revision.
///
/// Computed deterministically from the PDF page tree: recomputing from
/// identical bytes yields identical results, which is what makes the
/// lazy backfill path safe to run concurrently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// One entry per page, in page order.
    pub pages: Vec<PageSize>,
}

impl PageMetadata {
    /// Number of pages in the document.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Dimensions for a zero-based page index, if in range.
    #[must_use]
    pub fn page(&self, index: usize) -> Option<&PageSize> {
        self.pages.get(index)
    }
}
