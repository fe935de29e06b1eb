//! Document normalization applied to every uploaded PDF.
//!
//! Normalization decrypts password-protected documents, stamps interactive
//! form field appearances into the page content, and strips the interactive
//! structures (`/Annots`, `/AcroForm`, optional content groups) so that
//! rasterized pages match what a signer saw.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, warn};

use crate::error::PdfError;

/// Options for [`normalize_pdf`].
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Skip form flattening, keeping annotations intact.
    pub keep_form: bool,
    /// Password for encrypted documents.
    pub password: Option<String>,
}

/// Normalize an uploaded PDF into the canonical form the rest of the
/// pipeline works with.
///
/// Returns [`PdfError::PasswordRequired`] for encrypted documents with no
/// password and [`PdfError::WrongPassword`] when the supplied password does
/// not open the document. The output is always unencrypted.
pub fn normalize_pdf(pdf: &[u8], options: &NormalizeOptions) -> Result<Vec<u8>, PdfError> {
    let mut doc =
        Document::load_mem(pdf).map_err(|err| PdfError::InvalidDocument(err.to_string()))?;

    if doc.is_encrypted() {
        let password = options.password.as_deref().ok_or(PdfError::PasswordRequired)?;
        // Any decryption failure is treated as a wrong password; lopdf does
        // not distinguish unsupported filters from bad credentials in a way
        // callers can act on.
        doc.decrypt(password).map_err(|err| {
            debug!(error = %err, "PDF decryption failed");
            PdfError::WrongPassword
        })?;
        doc.trailer.remove(b"Encrypt");
    }

    flatten_layers(&mut doc);

    if !options.keep_form {
        flatten_annotations(&mut doc);
        remove_acro_form(&mut doc);
    }

    let mut out = Vec::new();
    doc.compress();
    doc.save_to(&mut out)
        .map_err(|err| PdfError::InvalidDocument(err.to_string()))?;
    Ok(out)
}

/// Make optional content groups (layers) permanent by dropping the
/// configuration that lets viewers toggle them.
fn flatten_layers(doc: &mut Document) {
    if let Some(catalog) = catalog_mut(doc) {
        catalog.remove(b"OCProperties");
    }
}

fn remove_acro_form(doc: &mut Document) {
    if let Some(catalog) = catalog_mut(doc) {
        catalog.remove(b"AcroForm");
    }
}

fn catalog_mut(doc: &mut Document) -> Option<&mut Dictionary> {
    let root = doc.trailer.get(b"Root").ok()?.as_reference().ok()?;
    doc.get_object_mut(root).ok()?.as_dict_mut().ok()
}

/// A widget appearance ready to be stamped into page content.
struct StampedAppearance {
    resource_name: String,
    stream_id: ObjectId,
    /// Content-stream operators placing the appearance over the widget rect.
    operators: String,
}

/// Burn each annotation's normal appearance stream into the page content,
/// then drop the annotations themselves.
fn flatten_annotations(doc: &mut Document) {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for page_id in pages {
        let stamps = collect_appearances(doc, page_id);
        if let Err(err) = apply_stamps(doc, page_id, &stamps) {
            warn!(error = %err, "skipping appearance flattening for one page");
        }
        if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            page.remove(b"Annots");
        }
    }
}

fn collect_appearances(doc: &Document, page_id: ObjectId) -> Vec<StampedAppearance> {
    let Ok(page) = doc.get_object(page_id).and_then(Object::as_dict) else {
        return Vec::new();
    };
    let Some(annots) = page.get(b"Annots").ok().and_then(|obj| resolve_array(doc, obj)) else {
        return Vec::new();
    };

    let mut stamps = Vec::new();
    for annot_obj in annots {
        let Some(annot) = resolve_dict(doc, &annot_obj) else {
            continue;
        };
        let Some(stream_id) = normal_appearance_id(doc, annot) else {
            continue;
        };
        let Some(rect) = annot.get(b"Rect").ok().and_then(|obj| rectangle(doc, obj)) else {
            continue;
        };
        let bbox = doc
            .get_object(stream_id)
            .ok()
            .and_then(|obj| obj.as_stream().ok())
            .and_then(|stream| stream.dict.get(b"BBox").ok().and_then(|obj| rectangle(doc, obj)))
            .unwrap_or([0.0, 0.0, 1.0, 1.0]);

        let (bw, bh) = (bbox[2] - bbox[0], bbox[3] - bbox[1]);
        if bw.abs() < f64::EPSILON || bh.abs() < f64::EPSILON {
            continue;
        }
        let sx = (rect[2] - rect[0]) / bw;
        let sy = (rect[3] - rect[1]) / bh;
        let tx = rect[0] - bbox[0] * sx;
        let ty = rect[1] - bbox[1] * sy;

        let resource_name = format!("SgFlat{}", stamps.len());
        stamps.push(StampedAppearance {
            operators: format!("q {sx:.4} 0 0 {sy:.4} {tx:.4} {ty:.4} cm /{resource_name} Do Q\n"),
            resource_name,
            stream_id,
        });
    }
    stamps
}

/// Locate the annotation's normal appearance stream. Appearance dictionaries
/// keyed by state are resolved through the annotation's `/AS` entry.
fn normal_appearance_id(doc: &Document, annot: &Dictionary) -> Option<ObjectId> {
    let ap = annot.get(b"AP").ok().and_then(|obj| resolve_dict(doc, obj))?;
    // A direct reference to the stream is the common case and must be
    // matched before resolving, which would turn it into the stream itself.
    match ap.get(b"N").ok()? {
        Object::Reference(id) => Some(*id),
        other => match resolve(doc, other) {
            Object::Dictionary(states) => {
                let state = annot.get(b"AS").ok()?.as_name().ok()?;
                states.get(state).ok()?.as_reference().ok()
            }
            _ => None,
        },
    }
}

fn apply_stamps(
    doc: &mut Document,
    page_id: ObjectId,
    stamps: &[StampedAppearance],
) -> Result<(), lopdf::Error> {
    if stamps.is_empty() {
        return Ok(());
    }

    // Resources may be inherited or shared by reference; the page gets its
    // own inline copy so the stamp XObjects stay local to it.
    let mut resources = {
        let page = doc.get_object(page_id)?.as_dict()?;
        match page.get(b"Resources").ok().map(|obj| resolve(doc, obj)) {
            Some(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        }
    };
    let mut xobjects = match resources.get(b"XObject").ok().map(|obj| resolve(doc, obj).clone()) {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };
    for stamp in stamps {
        xobjects.set(stamp.resource_name.as_bytes(), Object::Reference(stamp.stream_id));
    }
    resources.set("XObject", Object::Dictionary(xobjects));

    let operators: String = stamps.iter().map(|stamp| stamp.operators.as_str()).collect();
    let stamp_content_id = doc.add_object(Stream::new(Dictionary::new(), operators.into_bytes()));

    let mut contents = {
        let page = doc.get_object(page_id)?.as_dict()?;
        match page.get(b"Contents") {
            Ok(Object::Array(existing)) => existing.clone(),
            Ok(other @ Object::Reference(_)) => vec![other.clone()],
            _ => Vec::new(),
        }
    };
    contents.push(Object::Reference(stamp_content_id));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", Object::Dictionary(resources));
    page.set("Contents", Object::Array(contents));
    Ok(())
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj).as_dict().ok()
}

fn resolve_array(doc: &Document, obj: &Object) -> Option<Vec<Object>> {
    resolve(doc, obj).as_array().ok().cloned()
}

/// Read a normalized `[x1 y1 x2 y2]` rectangle, lower-left first.
fn rectangle(doc: &Document, obj: &Object) -> Option<[f64; 4]> {
    let array = resolve_array(doc, obj)?;
    if array.len() != 4 {
        return None;
    }
    let mut values = [0.0f64; 4];
    for (slot, item) in values.iter_mut().zip(&array) {
        *slot = number(doc, item)?;
    }
    Some([
        values[0].min(values[2]),
        values[1].min(values[3]),
        values[0].max(values[2]),
        values[1].max(values[3]),
    ])
}

fn number(doc: &Document, obj: &Object) -> Option<f64> {
    match resolve(doc, obj) {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_pdf, sample_pdf_with_annotation, sample_pdf_with_stated_annotation};

    #[test]
    fn rejects_garbage_bytes() {
        let err = normalize_pdf(b"this is not a pdf", &NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, PdfError::InvalidDocument(_)));
    }

    #[test]
    fn plain_document_round_trips() {
        let pdf = sample_pdf(2);
        let out = normalize_pdf(&pdf, &NormalizeOptions::default()).unwrap();
        let doc = Document::load_mem(&out).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn strips_annotations_and_form() {
        let pdf = sample_pdf_with_annotation();
        let out = normalize_pdf(&pdf, &NormalizeOptions::default()).unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        assert!(page.get(b"Annots").is_err());

        let root = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let catalog = doc.get_object(root).unwrap().as_dict().unwrap();
        assert!(catalog.get(b"AcroForm").is_err());
    }

    #[test]
    fn stamps_appearance_into_page_content() {
        let pdf = sample_pdf_with_annotation();
        let out = normalize_pdf(&pdf, &NormalizeOptions::default()).unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();

        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert!(xobjects.get(b"SgFlat0").is_ok());

        let contents = page.get(b"Contents").unwrap().as_array().unwrap();
        assert!(contents.len() >= 2);
    }

    #[test]
    fn stamps_state_keyed_appearance_via_as_entry() {
        let pdf = sample_pdf_with_stated_annotation();
        let out = normalize_pdf(&pdf, &NormalizeOptions::default()).unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();

        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert!(xobjects.get(b"SgFlat0").is_ok());
        assert!(page.get(b"Annots").is_err());
    }

    #[test]
    fn keep_form_leaves_annotations_alone() {
        let pdf = sample_pdf_with_annotation();
        let options = NormalizeOptions { keep_form: true, ..Default::default() };
        let out = normalize_pdf(&pdf, &options).unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        assert!(page.get(b"Annots").is_ok());
    }
}
