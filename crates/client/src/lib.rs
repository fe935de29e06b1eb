//! Signet render client.
//!
//! A native controller for consuming the Signet delivery API: it loads an
//! envelope's page metadata and derives everything a viewer needs to lay
//! out pages (dimensions, scale factors, image URLs) without fetching a
//! single page image up front.
//!
//! # Quick start
//!
//! ```no_run
//! use signet_client::{Access, EnvelopeRenderController};
//!
//! # async fn example() -> Result<(), signet_client::Error> {
//! let mut controller = EnvelopeRenderController::new(
//!     "http://localhost:8080",
//!     "envelope-1",
//!     Access::ShareToken("tok-abc".to_owned()),
//! );
//! controller.load_meta().await?;
//!
//! if let Some(item) = controller.current_item() {
//!     for layout in controller.page_layouts(&item.id.clone(), 800.0) {
//!         println!("page {} at {}x{} -> {}", layout.page_number, layout.width, layout.height, layout.url);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::Error;

use reqwest::Client;
use serde::Deserialize;

use signet_core::{EnvelopeStatus, PageSize, PageVersion};

/// How the controller authenticates against the delivery API.
#[derive(Debug, Clone)]
pub enum Access {
    /// A bearer session token, sent in the `Authorization` header.
    Session(String),
    /// A recipient or QR share token, embedded in the URL path.
    ShareToken(String),
    /// A presign JWT, appended as a query parameter.
    Presign(String),
}

/// One envelope item as described by the meta endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaItem {
    pub id: String,
    pub title: String,
    pub order: i32,
    pub initial_document_data_id: String,
    pub current_document_data_id: String,
    pub page_count: usize,
    pub pages: Vec<PageSize>,
}

/// The meta endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvelopeMeta {
    pub envelope_id: String,
    pub status: EnvelopeStatus,
    pub items: Vec<MetaItem>,
}

/// Render lifecycle of the controller.
#[derive(Debug, Clone)]
pub enum RenderState {
    /// Metadata has not arrived yet.
    Loading,
    /// Metadata is available and pages can be laid out.
    Loaded(EnvelopeMeta),
    /// Loading failed.
    Error(String),
}

/// Layout for one page at a given container width.
///
/// Derived from metadata alone: `scale` maps unscaled PDF user-space units
/// to container pixels, so a viewer can reserve exact page boxes before any
/// image arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// 1-based page number.
    pub page_number: usize,
    /// Laid-out width in container units (equals the container width).
    pub width: f64,
    /// Laid-out height in container units, aspect-preserving.
    pub height: f64,
    /// `container_width / page_width`.
    pub scale: f64,
    /// Image URL for this page.
    pub url: String,
}

/// Drives envelope rendering against the Signet delivery API.
#[derive(Debug)]
pub struct EnvelopeRenderController {
    client: Client,
    base_url: String,
    envelope_id: String,
    access: Access,
    state: RenderState,
    current_item_id: Option<String>,
}

impl EnvelopeRenderController {
    pub fn new(
        base_url: impl Into<String>,
        envelope_id: impl Into<String>,
        access: Access,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            envelope_id: envelope_id.into(),
            access,
            state: RenderState::Loading,
            current_item_id: None,
        }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Fetch envelope metadata and transition to `Loaded` (or `Error`).
    pub async fn load_meta(&mut self) -> Result<(), Error> {
        match self.fetch_meta().await {
            Ok(meta) => {
                self.apply_meta(meta);
                Ok(())
            }
            Err(err) => {
                self.state = RenderState::Error(err.to_string());
                Err(err)
            }
        }
    }

    /// Install an already-fetched meta response.
    ///
    /// Useful when the surrounding application fetched the envelope itself
    /// (e.g. as part of a larger page load) and hands it down.
    pub fn apply_meta(&mut self, mut meta: EnvelopeMeta) {
        meta.items.sort_by_key(|item| item.order);
        self.state = RenderState::Loaded(meta);
        self.sync_current_item();
    }

    async fn fetch_meta(&self) -> Result<EnvelopeMeta, Error> {
        let url = self.meta_url();
        let mut request = self.client.get(&url);
        if let Access::Session(bearer) = &self.access {
            request = request.header("Authorization", format!("Bearer {bearer}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Items in display order, empty until loaded.
    pub fn items(&self) -> &[MetaItem] {
        match &self.state {
            RenderState::Loaded(meta) => &meta.items,
            _ => &[],
        }
    }

    /// The item currently being viewed.
    pub fn current_item(&self) -> Option<&MetaItem> {
        let id = self.current_item_id.as_deref()?;
        self.items().iter().find(|item| item.id == id)
    }

    /// Switch the current item. Unknown ids are ignored.
    pub fn set_current_item(&mut self, item_id: &str) {
        if self.items().iter().any(|item| item.id == item_id) {
            self.current_item_id = Some(item_id.to_owned());
        }
    }

    /// Keep the current-item pointer valid: if it points at a removed item
    /// (or nothing), fall back to the first remaining item.
    fn sync_current_item(&mut self) {
        let valid = self
            .current_item_id
            .as_deref()
            .is_some_and(|id| self.items().iter().any(|item| item.id == id));
        if !valid {
            self.current_item_id = self.items().first().map(|item| item.id.clone());
        }
    }

    /// Derive page layouts for an item at the given container width.
    ///
    /// Pure metadata math; no image is fetched. Pages with degenerate
    /// (zero-width) dimensions are skipped.
    pub fn page_layouts(&self, item_id: &str, container_width: f64) -> Vec<PageLayout> {
        let Some(item) = self.items().iter().find(|item| item.id == item_id) else {
            return Vec::new();
        };

        item.pages
            .iter()
            .enumerate()
            .filter(|(_, page)| page.width > 0.0)
            .map(|(index, page)| {
                let scale = container_width / page.width;
                PageLayout {
                    page_number: index + 1,
                    width: container_width,
                    height: page.height * scale,
                    scale,
                    url: self.page_image_url(item, PageVersion::Current, index),
                }
            })
            .collect()
    }

    /// URL of the meta endpoint for this envelope, per access mode.
    #[must_use]
    pub fn meta_url(&self) -> String {
        match &self.access {
            Access::ShareToken(token) => format!(
                "{}/api/files/token/{token}/envelope/{}/meta",
                self.base_url, self.envelope_id
            ),
            Access::Session(_) => {
                format!("{}/api/files/envelope/{}/meta", self.base_url, self.envelope_id)
            }
            Access::Presign(token) => format!(
                "{}/api/files/envelope/{}/meta?token={token}",
                self.base_url, self.envelope_id
            ),
        }
    }

    /// URL of one page image, mirroring the server's path scheme.
    #[must_use]
    pub fn page_image_url(&self, item: &MetaItem, version: PageVersion, page_index: usize) -> String {
        let (data_id, version_str) = match version {
            PageVersion::Initial => (&item.initial_document_data_id, "initial"),
            PageVersion::Current => (&item.current_document_data_id, "current"),
        };

        match &self.access {
            Access::ShareToken(token) => format!(
                "{}/api/files/token/{token}/envelope/{}/envelopeItem/{}/dataId/{data_id}/{version_str}/{page_index}/image.jpeg",
                self.base_url, self.envelope_id, item.id
            ),
            Access::Session(_) => format!(
                "{}/api/files/envelope/{}/envelopeItem/{}/dataId/{data_id}/{version_str}/{page_index}/image.jpeg",
                self.base_url, self.envelope_id, item.id
            ),
            Access::Presign(token) => format!(
                "{}/api/files/envelope/{}/envelopeItem/{}/dataId/{data_id}/{version_str}/{page_index}/image.jpeg?token={token}",
                self.base_url, self.envelope_id, item.id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, order: i32, pages: Vec<PageSize>) -> MetaItem {
        MetaItem {
            id: id.to_owned(),
            title: format!("{id}.pdf"),
            order,
            initial_document_data_id: format!("{id}-blob"),
            current_document_data_id: format!("{id}-blob"),
            page_count: pages.len(),
            pages,
        }
    }

    fn meta(items: Vec<MetaItem>) -> EnvelopeMeta {
        EnvelopeMeta {
            envelope_id: "env-1".to_owned(),
            status: EnvelopeStatus::Pending,
            items,
        }
    }

    fn controller() -> EnvelopeRenderController {
        EnvelopeRenderController::new(
            "http://localhost:8080",
            "env-1",
            Access::ShareToken("tok-1".to_owned()),
        )
    }

    #[test]
    fn starts_loading_with_no_items() {
        let c = controller();
        assert!(matches!(c.state(), RenderState::Loading));
        assert!(c.items().is_empty());
        assert!(c.current_item().is_none());
    }

    #[test]
    fn apply_meta_sorts_items_and_selects_first() {
        let mut c = controller();
        c.apply_meta(meta(vec![item("b", 2, vec![]), item("a", 1, vec![])]));

        let ids: Vec<&str> = c.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(c.current_item().unwrap().id, "a");
    }

    #[test]
    fn current_item_falls_back_when_removed() {
        let mut c = controller();
        c.apply_meta(meta(vec![item("a", 1, vec![]), item("b", 2, vec![])]));
        c.set_current_item("b");
        assert_eq!(c.current_item().unwrap().id, "b");

        // "b" disappears on the next load; the pointer falls back to first.
        c.apply_meta(meta(vec![item("a", 1, vec![])]));
        assert_eq!(c.current_item().unwrap().id, "a");

        // Everything disappears; the pointer clears.
        c.apply_meta(meta(vec![]));
        assert!(c.current_item().is_none());
    }

    #[test]
    fn set_current_item_ignores_unknown_ids() {
        let mut c = controller();
        c.apply_meta(meta(vec![item("a", 1, vec![])]));
        c.set_current_item("ghost");
        assert_eq!(c.current_item().unwrap().id, "a");
    }

    #[test]
    fn page_layouts_scale_to_container_width() {
        let mut c = controller();
        c.apply_meta(meta(vec![item(
            "a",
            1,
            vec![
                PageSize { width: 612.0, height: 792.0 },
                PageSize { width: 595.0, height: 842.0 },
            ],
        )]));

        let layouts = c.page_layouts("a", 1224.0);
        assert_eq!(layouts.len(), 2);

        assert_eq!(layouts[0].page_number, 1);
        assert_eq!(layouts[0].width, 1224.0);
        assert_eq!(layouts[0].scale, 2.0);
        assert_eq!(layouts[0].height, 1584.0);

        assert_eq!(layouts[1].page_number, 2);
        let expected_scale = 1224.0 / 595.0;
        assert!((layouts[1].scale - expected_scale).abs() < 1e-9);
        assert!((layouts[1].height - 842.0 * expected_scale).abs() < 1e-9);
    }

    #[test]
    fn page_layouts_skip_degenerate_pages() {
        let mut c = controller();
        c.apply_meta(meta(vec![item(
            "a",
            1,
            vec![PageSize { width: 0.0, height: 100.0 }],
        )]));
        assert!(c.page_layouts("a", 800.0).is_empty());
    }

    #[test]
    fn urls_follow_the_access_mode() {
        let mut by_token = controller();
        by_token.apply_meta(meta(vec![item("a", 1, vec![])]));
        assert_eq!(
            by_token.meta_url(),
            "http://localhost:8080/api/files/token/tok-1/envelope/env-1/meta"
        );
        let token_item = by_token.items()[0].clone();
        assert_eq!(
            by_token.page_image_url(&token_item, PageVersion::Current, 3),
            "http://localhost:8080/api/files/token/tok-1/envelope/env-1/envelopeItem/a/dataId/a-blob/current/3/image.jpeg"
        );

        let by_session = EnvelopeRenderController::new(
            "http://localhost:8080/",
            "env-1",
            Access::Session("session-1".to_owned()),
        );
        assert_eq!(
            by_session.meta_url(),
            "http://localhost:8080/api/files/envelope/env-1/meta"
        );

        let by_presign = EnvelopeRenderController::new(
            "http://localhost:8080",
            "env-1",
            Access::Presign("jwt-token".to_owned()),
        );
        assert_eq!(
            by_presign.page_image_url(&token_item, PageVersion::Initial, 0),
            "http://localhost:8080/api/files/envelope/env-1/envelopeItem/a/dataId/a-blob/initial/0/image.jpeg?token=jwt-token"
        );
    }
}
