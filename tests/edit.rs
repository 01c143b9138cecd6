// tests/edit.rs: the text editor end to end: replace, save, reopen.

mod common;

use common::{helvetica_with_widths, one_page_pdf};
use pretty_assertions::assert_eq;
use readpdf::{
    EditOptions, PdfDocument, RecordingSink, RenderOptions, SaveOptions,
};

fn extracted_text(doc: &PdfDocument) -> String {
    let mut sink = RecordingSink::new();
    readpdf::render_page(doc, 0, &mut sink, &RenderOptions::default()).unwrap();
    sink.text()
}

/// Replace a word, save incrementally, reopen: the text sticks and the
/// original bytes are still the file's prefix.
#[test]
fn replace_save_reopen_roundtrip() {
    let pdf = one_page_pdf(
        b"BT /F1 12 Tf 72 720 Td (The quick brown fox) Tj ET",
        vec![("F1", helvetica_with_widths())],
    );
    let original = pdf.clone();
    let mut doc = PdfDocument::open(pdf).unwrap();

    let count = readpdf::replace_text(&mut doc, 0, "quick", "slow", &EditOptions::default())
        .unwrap();
    assert_eq!(count, 1);
    assert!(doc.modified);
    assert_eq!(extracted_text(&doc), "The slow brown fox");

    let saved = doc.save(&SaveOptions { incremental: true }).unwrap();
    assert!(saved.len() > original.len());
    assert_eq!(&saved[..original.len()], &original[..]);

    let reopened = PdfDocument::open(saved).unwrap();
    assert_eq!(extracted_text(&reopened), "The slow brown fox");
    let body = reopened
        .page_content_bytes(reopened.page_id(0).unwrap())
        .unwrap();
    assert!(String::from_utf8_lossy(&body).contains("(The slow brown fox)"));
}

/// A full rewrite stays a valid single-revision file.
#[test]
fn replace_full_save() {
    let pdf = one_page_pdf(
        b"BT /F1 12 Tf (alpha beta alpha) Tj ET",
        vec![("F1", helvetica_with_widths())],
    );
    let mut doc = PdfDocument::open(pdf).unwrap();
    let count = readpdf::replace_text(&mut doc, 0, "alpha", "omega", &EditOptions::default())
        .unwrap();
    assert_eq!(count, 2);

    let saved = doc.save(&SaveOptions::default()).unwrap();
    let reopened = PdfDocument::open(saved).unwrap();
    assert_eq!(extracted_text(&reopened), "omega beta omega");
}

/// The replaced text keeps its on-page position: same Td, same run origin.
#[test]
fn replacement_preserves_position() {
    let pdf = one_page_pdf(
        b"BT /F1 12 Tf 101 202 Td (foofoo) Tj ET",
        vec![("F1", helvetica_with_widths())],
    );
    let mut doc = PdfDocument::open(pdf).unwrap();
    let count =
        readpdf::replace_text(&mut doc, 0, "foo", "bar", &EditOptions::default()).unwrap();
    assert_eq!(count, 2);

    let mut sink = RecordingSink::new();
    readpdf::render_page(&doc, 0, &mut sink, &RenderOptions::default()).unwrap();
    let run = sink.text_runs().next().unwrap();
    assert_eq!(run.text, "barbar");
    assert_eq!((run.transform.e, run.transform.f), (101.0, 202.0));
}

/// Deleting drops only the matching show instruction.
#[test]
fn delete_and_insert() {
    let pdf = one_page_pdf(
        b"BT /F1 12 Tf (stays) Tj (goes away) Tj ET",
        vec![("F1", helvetica_with_widths())],
    );
    let mut doc = PdfDocument::open(pdf).unwrap();
    let dropped =
        readpdf::delete_text(&mut doc, 0, "goes", &EditOptions::default()).unwrap();
    assert_eq!(dropped, 1);
    assert_eq!(extracted_text(&doc), "stays");

    readpdf::insert_text(&mut doc, 0, "added later", "F1", 10.0, 50.0, 60.0).unwrap();
    let text = extracted_text(&doc);
    assert!(text.contains("stays") && text.contains("added later"), "{text}");

    // survives a save cycle
    let saved = doc.save(&SaveOptions::default()).unwrap();
    let reopened = PdfDocument::open(saved).unwrap();
    let text = extracted_text(&reopened);
    assert!(text.contains("stays") && text.contains("added later"), "{text}");
}

/// No match, no modification.
#[test]
fn no_match_leaves_document_unmodified() {
    let pdf = one_page_pdf(
        b"BT /F1 12 Tf (nothing here) Tj ET",
        vec![("F1", helvetica_with_widths())],
    );
    let mut doc = PdfDocument::open(pdf).unwrap();
    let count = readpdf::replace_text(&mut doc, 0, "absent", "x", &EditOptions::default())
        .unwrap();
    assert_eq!(count, 0);
    assert!(!doc.modified);
}
