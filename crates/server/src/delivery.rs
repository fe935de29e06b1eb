//! Content-addressed delivery: ETags, cache policy, response assembly.
//!
//! ETags hash the payload *text* (base64 or object key), not the decoded
//! bytes, so computing one never requires fetching the document. Any
//! payload change (a signing pass rewrites the object key / inline text)
//! therefore changes the ETag.

use axum::body::Body;
use axum::http::header::{
    CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, ETAG, EXPIRES, IF_NONE_MATCH, PRAGMA,
};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use sha2::{Digest, Sha256};

use signet_core::{EnvelopeStatus, FileVersion};

/// Cache policy for immutable content (completed files, page images).
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";
/// Cache policy for content that may still change; clients revalidate with
/// `If-None-Match` and mostly get 304s.
const CACHE_REVALIDATE: &str = "public, max-age=0, must-revalidate";
/// Downloads are never cached anywhere.
const CACHE_DOWNLOAD: &str = "no-cache, no-store, must-revalidate";

/// ETag for a whole-file payload.
#[must_use]
pub fn file_etag(payload: &str) -> String {
    hex::encode(Sha256::digest(payload.as_bytes()))
}

/// ETag for one page image, bound to both payload and page index.
#[must_use]
pub fn page_etag(payload: &str, page_index: usize) -> String {
    hex::encode(Sha256::digest(format!("{payload}:{page_index}").as_bytes()))
}

/// Whether the request's `If-None-Match` matches the computed ETag.
#[must_use]
pub fn not_modified(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .split(',')
                .any(|candidate| candidate.trim().trim_matches('"') == etag)
        })
}

/// Cache policy for a viewed (non-download) file or page.
#[must_use]
pub fn view_cache_control(status: EnvelopeStatus) -> &'static str {
    if status.is_mutable() { CACHE_REVALIDATE } else { CACHE_IMMUTABLE }
}

/// Download filename derived from the item title. A pre-existing `.pdf`
/// suffix is stripped so titles uploaded with one don't double it, and
/// characters that can't live in a header value are replaced.
#[must_use]
pub fn download_filename(title: &str, version: FileVersion) -> String {
    let base: String = title
        .strip_suffix(".pdf")
        .unwrap_or(title)
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' || c == ' ' { c } else { '_' })
        .collect();
    match version {
        FileVersion::Signed => format!("{base}_signed.pdf"),
        FileVersion::Original => format!("{base}.pdf"),
    }
}

/// 304 response carrying the ETag, no body.
#[must_use]
pub fn not_modified_response(etag: &str) -> Response {
    response_builder(StatusCode::NOT_MODIFIED)
        .header(ETAG, quoted(etag))
        .body(Body::empty())
        .unwrap_or_default()
}

/// Inline PDF view response.
#[must_use]
pub fn pdf_view_response(bytes: Bytes, etag: &str, status: EnvelopeStatus) -> Response {
    response_builder(StatusCode::OK)
        .header(CONTENT_TYPE, "application/pdf")
        .header(ETAG, quoted(etag))
        .header(CACHE_CONTROL, view_cache_control(status))
        .body(Body::from(bytes))
        .unwrap_or_default()
}

/// PDF download response: attachment disposition, caching disabled,
/// conditional requests ignored.
#[must_use]
pub fn pdf_download_response(bytes: Bytes, filename: &str) -> Response {
    response_builder(StatusCode::OK)
        .header(CONTENT_TYPE, "application/pdf")
        .header(CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\""))
        .header(CACHE_CONTROL, CACHE_DOWNLOAD)
        .header(PRAGMA, "no-cache")
        .header(EXPIRES, "0")
        .body(Body::from(bytes))
        .unwrap_or_default()
}

/// Page image response. Page images are content-addressed through the
/// version-qualified URL, so they are always safe to cache forever.
#[must_use]
pub fn jpeg_response(bytes: Bytes, etag: &str) -> Response {
    response_builder(StatusCode::OK)
        .header(CONTENT_TYPE, "image/jpeg")
        .header(ETAG, quoted(etag))
        .header(CACHE_CONTROL, CACHE_IMMUTABLE)
        .body(Body::from(bytes))
        .unwrap_or_default()
}

fn quoted(etag: &str) -> String {
    format!("\"{etag}\"")
}

fn response_builder(status: StatusCode) -> axum::http::response::Builder {
    Response::builder().status(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn etag_is_deterministic_and_payload_bound() {
        let a = file_etag("payload-a");
        assert_eq!(a, file_etag("payload-a"));
        assert_ne!(a, file_etag("payload-b"));
        // hex sha-256
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn page_etag_differs_per_page() {
        assert_ne!(page_etag("payload", 0), page_etag("payload", 1));
        assert_ne!(page_etag("payload", 0), file_etag("payload"));
    }

    #[test]
    fn if_none_match_accepts_quoted_and_bare() {
        let etag = file_etag("p");
        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_str(&format!("\"{etag}\"")).unwrap());
        assert!(not_modified(&headers, &etag));

        headers.insert(IF_NONE_MATCH, HeaderValue::from_str(&etag).unwrap());
        assert!(not_modified(&headers, &etag));

        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("\"something-else\""));
        assert!(!not_modified(&headers, &etag));
    }

    #[test]
    fn cache_policy_follows_status() {
        assert_eq!(view_cache_control(EnvelopeStatus::Completed), CACHE_IMMUTABLE);
        assert_eq!(view_cache_control(EnvelopeStatus::Draft), CACHE_REVALIDATE);
        assert_eq!(view_cache_control(EnvelopeStatus::Pending), CACHE_REVALIDATE);
    }

    #[test]
    fn download_filename_strips_existing_suffix() {
        assert_eq!(download_filename("contract.pdf", FileVersion::Signed), "contract_signed.pdf");
        assert_eq!(download_filename("contract", FileVersion::Original), "contract.pdf");
    }
}
