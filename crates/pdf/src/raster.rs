//! Page rasterization on top of the `hayro` CPU renderer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use hayro::hayro_interpret::InterpreterSettings;
use hayro::vello_cpu::color::AlphaColor;
use hayro::hayro_syntax::Pdf;
use hayro::{RenderCache, RenderSettings};
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use signet_core::{PageMetadata, PageSize};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::PdfError;

/// Scale factor used when rendering pages for delivery. At 2x a US Letter
/// page comes out 1224px wide, which is crisp enough for on-screen review.
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

/// Upper bound on pages rendered simultaneously per process. Rendering is
/// CPU-bound and each page holds a full-size pixmap while encoding.
pub const DEFAULT_MAX_CONCURRENT_RENDERS: usize = 10;

const JPEG_QUALITY: u8 = 80;

/// One rendered page, JPEG-encoded.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub page_index: usize,
    /// Pixel width of the encoded image.
    pub width: u32,
    /// Pixel height of the encoded image.
    pub height: u32,
    pub jpeg: Vec<u8>,
}

/// Extract per-page dimensions without rendering anything.
pub fn page_dimensions(pdf: &Arc<Vec<u8>>) -> Result<PageMetadata, PdfError> {
    let pdf = open(pdf.clone())?;
    let pages = pdf
        .pages()
        .iter()
        .map(|page| {
            let (width, height) = page.render_dimensions();
            PageSize { width: f64::from(width), height: f64::from(height) }
        })
        .collect();
    Ok(PageMetadata { pages })
}

/// Renders PDF pages to JPEG with bounded concurrency.
///
/// Rendering happens on the blocking thread pool; a semaphore keeps the
/// number of in-flight pixmaps bounded no matter how many requests fan in.
pub struct Rasterizer {
    permits: Arc<Semaphore>,
    rendered: AtomicU64,
}

impl Rasterizer {
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            rendered: AtomicU64::new(0),
        }
    }

    /// Total pages rendered since construction. Cache hits elsewhere in the
    /// pipeline never move this counter.
    pub fn pages_rendered(&self) -> u64 {
        self.rendered.load(Ordering::Relaxed)
    }

    /// Render a single page at the given scale.
    pub async fn render_page(
        &self,
        pdf: Arc<Vec<u8>>,
        page_index: usize,
        scale: f32,
    ) -> Result<PageImage, PdfError> {
        // Holding the permit across spawn_blocking is what bounds the
        // number of live pixmaps.
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PdfError::Render("render pool is shut down".to_owned()))?;

        let image = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            render_page_blocking(&pdf, page_index, scale)
        })
        .await
        .map_err(|err| PdfError::Render(err.to_string()))??;

        self.rendered.fetch_add(1, Ordering::Relaxed);
        debug!(
            page_index,
            width = image.width,
            height = image.height,
            bytes = image.jpeg.len(),
            "rendered page"
        );
        Ok(image)
    }

    /// Render every page of the document, in page order.
    pub async fn render_all(
        &self,
        pdf: Arc<Vec<u8>>,
        scale: f32,
    ) -> Result<Vec<PageImage>, PdfError> {
        let count = open(pdf.clone())?.pages().len();
        futures::future::try_join_all(
            (0..count).map(|page_index| self.render_page(pdf.clone(), page_index, scale)),
        )
        .await
    }

    /// Render every page, aborting the batch when the deadline passes.
    ///
    /// Dropping the batch future cancels pages still waiting on a permit;
    /// pages already on the blocking pool run to completion and release
    /// their permits normally, so an aborted batch leaves nothing behind.
    pub async fn render_all_within(
        &self,
        pdf: Arc<Vec<u8>>,
        scale: f32,
        deadline: Duration,
    ) -> Result<Vec<PageImage>, PdfError> {
        tokio::time::timeout(deadline, self.render_all(pdf, scale))
            .await
            .map_err(|_| PdfError::Timeout(deadline))?
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT_RENDERS)
    }
}

fn open(data: Arc<Vec<u8>>) -> Result<Pdf, PdfError> {
    Pdf::new(data).map_err(|err| PdfError::InvalidDocument(format!("{err:?}")))
}

fn render_page_blocking(
    data: &Arc<Vec<u8>>,
    page_index: usize,
    scale: f32,
) -> Result<PageImage, PdfError> {
    let pdf = open(data.clone())?;
    let pages = pdf.pages();
    let page = pages.get(page_index).ok_or(PdfError::PageOutOfRange {
        page: page_index,
        count: pages.len(),
    })?;

    // The default background is transparent; the RGB strip below requires
    // an opaque white one.
    let settings = RenderSettings {
        x_scale: scale,
        y_scale: scale,
        width: None,
        height: None,
        bg_color: AlphaColor::WHITE,
    };
    let cache = RenderCache::new();
    let pixmap = hayro::render(page, &cache, &InterpreterSettings::default(), &settings);

    let width = u32::from(pixmap.width());
    let height = u32::from(pixmap.height());

    // Every pixel sits over the opaque white background, so alpha is 255
    // throughout and dropping the channel loses nothing.
    let rgba = pixmap.data_as_u8_slice();
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&pixel[..3]);
    }

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode(&rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|err| PdfError::Render(err.to_string()))?;

    Ok(PageImage { page_index, width, height, jpeg })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_pdf, sample_pdf_with_sizes};

    #[test]
    fn page_dimensions_reports_every_page() {
        let pdf = Arc::new(sample_pdf_with_sizes(&[(612.0, 792.0), (595.0, 842.0)]));
        let metadata = page_dimensions(&pdf).unwrap();
        assert_eq!(metadata.page_count(), 2);
        assert_eq!(metadata.page(0).unwrap().width, 612.0);
        assert_eq!(metadata.page(1).unwrap().height, 842.0);
    }

    #[test]
    fn page_dimensions_rejects_garbage() {
        let pdf = Arc::new(b"nope".to_vec());
        assert!(matches!(page_dimensions(&pdf), Err(PdfError::InvalidDocument(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn renders_a_page_at_scale() {
        let pdf = Arc::new(sample_pdf(1));
        let rasterizer = Rasterizer::default();

        let image = rasterizer.render_page(pdf, 0, 2.0).await.unwrap();
        assert_eq!(image.page_index, 0);
        assert_eq!(image.width, 1224);
        assert_eq!(image.height, 1584);
        // JPEG SOI marker.
        assert_eq!(&image.jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(rasterizer.pages_rendered(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rendered_margins_are_white() {
        let pdf = Arc::new(sample_pdf(1));
        let rasterizer = Rasterizer::default();

        let image = rasterizer.render_page(pdf, 0, 1.0).await.unwrap();
        let decoded = image::load_from_memory_with_format(&image.jpeg, image::ImageFormat::Jpeg)
            .unwrap()
            .to_rgb8();

        // The page margin must come out white, not the black that a
        // transparent background collapses to when alpha is dropped.
        let corner = decoded.get_pixel(1, 1);
        assert!(corner.0.iter().all(|&channel| channel > 240), "corner pixel: {corner:?}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn render_all_within_aborts_on_deadline() {
        let pdf = Arc::new(sample_pdf(3));
        let rasterizer = Rasterizer::new(1);

        let err = rasterizer
            .render_all_within(pdf.clone(), 2.0, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, PdfError::Timeout(_)));

        // The pool stays usable after an aborted batch.
        let images = rasterizer
            .render_all_within(pdf, 1.0, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(images.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn render_page_checks_bounds() {
        let pdf = Arc::new(sample_pdf(2));
        let rasterizer = Rasterizer::default();

        let err = rasterizer.render_page(pdf, 5, 1.0).await.unwrap_err();
        assert!(matches!(err, PdfError::PageOutOfRange { page: 5, count: 2 }));
        assert_eq!(rasterizer.pages_rendered(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn render_all_preserves_page_order() {
        let pdf = Arc::new(sample_pdf(3));
        let rasterizer = Rasterizer::new(2);

        let images = rasterizer.render_all(pdf, 1.0).await.unwrap();
        assert_eq!(images.len(), 3);
        for (index, image) in images.iter().enumerate() {
            assert_eq!(image.page_index, index);
        }
        assert_eq!(rasterizer.pages_rendered(), 3);
    }
}
