//! PDF handling for Signet: upload-time normalization and on-demand page
//! rasterization.
//!
//! [`normalize_pdf`] canonicalizes uploaded documents (decryption, form
//! flattening). [`Rasterizer`] turns normalized documents into JPEG page
//! images; [`page_dimensions`] derives the per-page metadata the client
//! lays pages out with.

pub mod error;
pub mod normalize;
pub mod raster;
pub mod testing;

pub use error::PdfError;
pub use normalize::{NormalizeOptions, normalize_pdf};
pub use raster::{
    DEFAULT_MAX_CONCURRENT_RENDERS, DEFAULT_RENDER_SCALE, PageImage, Rasterizer, page_dimensions,
};
