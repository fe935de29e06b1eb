//! In-memory PDF fixtures for tests.

use lopdf::{Document, Object, Stream, dictionary};

/// Build a minimal multi-page PDF with US Letter pages.
pub fn sample_pdf(pages: usize) -> Vec<u8> {
    let sizes = vec![(612.0, 792.0); pages];
    sample_pdf_with_sizes(&sizes)
}

/// Build a minimal PDF with one page per `(width, height)` entry, in points.
pub fn sample_pdf_with_sizes(sizes: &[(f64, f64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(sizes.len());
    for (index, (width, height)) in sizes.iter().enumerate() {
        let content = format!("BT /F1 18 Tf 72 {} Td (page {}) Tj ET", height - 72.0, index + 1)
            .into_bytes();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(*width as f32),
                Object::Real(*height as f32),
            ],
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(sizes.len()).unwrap_or(0);
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save fixture pdf");
    out
}

/// Build a single-page PDF carrying one widget annotation whose `/AP /N`
/// is a direct reference to the appearance stream, plus a catalog
/// `/AcroForm` entry.
pub fn sample_pdf_with_annotation() -> Vec<u8> {
    annotated_pdf(false)
}

/// Like [`sample_pdf_with_annotation`], but with the normal appearance
/// keyed by state and selected through the annotation's `/AS` entry.
pub fn sample_pdf_with_stated_annotation() -> Vec<u8> {
    annotated_pdf(true)
}

fn annotated_pdf(stated: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let content_id = doc.add_object(Stream::new(dictionary! {}, b"q Q".to_vec()));
    let appearance_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 100.into(), 20.into()],
        },
        b"0 0 1 rg 0 0 100 20 re f".to_vec(),
    ));
    let normal: Object = if stated {
        dictionary! { "On" => appearance_id }.into()
    } else {
        appearance_id.into()
    };
    let mut annot = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "Rect" => vec![100.into(), 600.into(), 300.into(), 640.into()],
        "AP" => dictionary! { "N" => normal },
    };
    if stated {
        annot.set("AS", Object::Name(b"On".to_vec()));
    }
    let annot_id = doc.add_object(annot);
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Annots" => vec![annot_id.into()],
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => dictionary! { "Fields" => vec![Object::Reference(annot_id)] },
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save fixture pdf");
    out
}
