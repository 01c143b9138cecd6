// tests/parsing.rs: opening documents: header/trailer validation, classic
// and stream xref tables, object streams, incremental revisions.

mod common;

use common::{one_page_pdf, TestPdf};
use pretty_assertions::assert_eq;
use readpdf::writer::write_object;
use readpdf::{
    Dictionary, Error, Object, PdfDocument, RecordingSink, RenderOptions, Stream, StringFormat,
};

/// The minimal well-formed file: one empty page. Opening it yields one
/// page, the right MediaBox, and interpreting it produces no draw calls.
#[test]
fn minimal_document() {
    let pdf = one_page_pdf(b"", vec![]);
    let doc = PdfDocument::open(pdf).unwrap();
    assert_eq!(doc.page_count(), 1);
    let page_id = doc.page_id(0).unwrap();
    assert_eq!(doc.page_media_box(page_id), [0.0, 0.0, 612.0, 792.0]);

    let mut sink = RecordingSink::new();
    let warnings = readpdf::render_page(&doc, 0, &mut sink, &RenderOptions::default()).unwrap();
    assert_eq!(sink.draw_calls(), 0);
    assert_eq!(warnings, vec![]);
}

#[test]
fn missing_header_is_invalid_header() {
    let result = PdfDocument::open(b"not a pdf at all".to_vec());
    assert!(matches!(result, Err(Error::InvalidHeader)));
}

#[test]
fn missing_trailer_is_invalid_trailer() {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.extend_from_slice(&[b'x'; 64]);
    let result = PdfDocument::open_with(
        bytes,
        b"",
        &readpdf::ParseOptions {
            rebuild_xref: false,
        },
    );
    assert!(matches!(result, Err(Error::InvalidTrailer)));
}

/// get(num, gen) is memoised and order-independent.
#[test]
fn resolution_is_idempotent() {
    let pdf = one_page_pdf(b"BT ET", vec![]);
    let doc_a = PdfDocument::open(pdf.clone()).unwrap();
    let doc_b = PdfDocument::open(pdf).unwrap();

    // a: walk pages first, then fetch objects; b: fetch objects backwards
    let pages_a = doc_a.pages();
    let mut objs_a = Vec::new();
    for num in 1..=4u32 {
        objs_a.push(doc_a.get_object((num, 0)).unwrap());
    }
    let mut objs_b = Vec::new();
    for num in (1..=4u32).rev() {
        objs_b.push(doc_b.get_object((num, 0)).unwrap());
    }
    objs_b.reverse();
    let pages_b = doc_b.pages();

    assert_eq!(pages_a, pages_b);
    for (a, b) in objs_a.iter().zip(&objs_b) {
        assert_eq!(a, b);
    }
    // repeated access returns the same value
    assert_eq!(doc_a.get_object((3, 0)).unwrap(), doc_a.get_object((3, 0)).unwrap());
}

/// A file whose catalog and pages live in an object stream addressed by an
/// xref stream (the PDF 1.5+ layout).
#[test]
fn xref_stream_and_object_stream() {
    // objects 2 (catalog) and 3 (pages) compressed into object stream 1
    let mut catalog_bytes = Vec::new();
    write_object(
        &Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Catalog")),
            ("Pages", Object::Reference((3, 0))),
        ])),
        &mut catalog_bytes,
    );
    let mut pages_bytes = Vec::new();
    write_object(
        &Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Pages")),
            ("Count", Object::Integer(1)),
            ("Kids", Object::Array(vec![Object::Reference((4, 0))])),
        ])),
        &mut pages_bytes,
    );
    let header = format!("2 0 3 {} ", catalog_bytes.len());
    let first = header.len();
    let mut objstm_payload = header.into_bytes();
    objstm_payload.extend_from_slice(&catalog_bytes);
    objstm_payload.extend_from_slice(&pages_bytes);

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.5\n");

    let mut offsets = [0usize; 6];
    let mut emit = |out: &mut Vec<u8>, num: u32, obj: &Object, offsets: &mut [usize; 6]| {
        offsets[num as usize] = out.len();
        out.extend_from_slice(format!("{num} 0 obj\n").as_bytes());
        write_object(obj, out);
        out.extend_from_slice(b"\nendobj\n");
    };

    let objstm_dict = Dictionary::from_iter(vec![
        ("Type", Object::name("ObjStm")),
        ("N", Object::Integer(2)),
        ("First", Object::Integer(first as i64)),
    ]);
    emit(
        &mut out,
        1,
        &Object::Stream(Stream::new(objstm_dict, objstm_payload)),
        &mut offsets,
    );

    let page = Dictionary::from_iter(vec![
        ("Type", Object::name("Page")),
        ("Parent", Object::Reference((3, 0))),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(200),
                Object::Integer(100),
            ]),
        ),
        ("Resources", Object::Dictionary(Dictionary::new())),
        ("Contents", Object::Reference((5, 0))),
    ]);
    emit(&mut out, 4, &Object::Dictionary(page), &mut offsets);
    emit(
        &mut out,
        5,
        &Object::Stream(Stream::new(Dictionary::new(), b"q Q".to_vec())),
        &mut offsets,
    );

    // xref stream, W = [1 2 2]
    let xref_start = out.len();
    let mut entries: Vec<u8> = Vec::new();
    let mut push_entry = |entries: &mut Vec<u8>, kind: u8, f2: u16, f3: u16| {
        entries.push(kind);
        entries.extend_from_slice(&f2.to_be_bytes());
        entries.extend_from_slice(&f3.to_be_bytes());
    };
    push_entry(&mut entries, 0, 0, 0xFFFF); // 0: free
    push_entry(&mut entries, 1, offsets[1] as u16, 0); // 1: the ObjStm
    push_entry(&mut entries, 2, 1, 0); // 2: catalog, in stream 1 index 0
    push_entry(&mut entries, 2, 1, 1); // 3: pages, index 1
    push_entry(&mut entries, 1, offsets[4] as u16, 0);
    push_entry(&mut entries, 1, offsets[5] as u16, 0);
    push_entry(&mut entries, 1, xref_start as u16, 0); // 6: this stream

    let xref_dict = Dictionary::from_iter(vec![
        ("Type", Object::name("XRef")),
        ("Size", Object::Integer(7)),
        (
            "W",
            Object::Array(vec![
                Object::Integer(1),
                Object::Integer(2),
                Object::Integer(2),
            ]),
        ),
        ("Root", Object::Reference((2, 0))),
    ]);
    out.extend_from_slice(b"6 0 obj\n");
    write_object(&Object::Stream(Stream::new(xref_dict, entries)), &mut out);
    out.extend_from_slice(b"\nendobj\n");
    out.extend_from_slice(format!("startxref\n{xref_start}\n%%EOF\n").as_bytes());

    let doc = PdfDocument::open(out).unwrap();
    assert_eq!(doc.page_count(), 1);
    let page_id = doc.page_id(0).unwrap();
    assert_eq!(doc.page_media_box(page_id), [0.0, 0.0, 200.0, 100.0]);
    assert_eq!(doc.page_content_bytes(page_id).unwrap(), b"q Q");
}

/// Two revisions: the newer one re-points object 4; the older value must
/// lose. Mirrors an incremental update chain.
#[test]
fn incremental_revision_overrides_older_entry() {
    let base = one_page_pdf(b"(old) Tj", vec![]);
    let prev_startxref = base
        .windows(9)
        .rposition(|w| w == b"startxref")
        .unwrap();
    let prev_offset: usize = {
        let tail = &base[prev_startxref + 9..];
        let text = String::from_utf8_lossy(tail);
        text.split_whitespace().next().unwrap().parse().unwrap()
    };

    let mut out = base.clone();
    let new_stream_offset = out.len();
    out.extend_from_slice(b"4 0 obj\n");
    write_object(
        &Object::Stream(Stream::new(Dictionary::new(), b"(new) Tj".to_vec())),
        &mut out,
    );
    out.extend_from_slice(b"\nendobj\n");
    let xref_offset = out.len();
    out.extend_from_slice(
        format!(
            "xref\n4 1\n{new_stream_offset:010} 00000 n \ntrailer\n<< /Size 5 /Root 1 0 R /Prev {prev_offset} >>\nstartxref\n{xref_offset}\n%%EOF\n"
        )
        .as_bytes(),
    );

    let doc = PdfDocument::open(out).unwrap();
    let page_id = doc.page_id(0).unwrap();
    assert_eq!(doc.page_content_bytes(page_id).unwrap(), b"(new) Tj");
}

/// Broken xref offset: the opt-in scan rebuild still finds the objects.
#[test]
fn rebuild_recovers_from_broken_xref() {
    let mut pdf = one_page_pdf(b"BT ET", vec![]);
    // corrupt the startxref offset
    let pos = pdf.windows(9).rposition(|w| w == b"startxref").unwrap();
    pdf[pos + 10] = b'9';
    pdf[pos + 11] = b'9';

    let doc = PdfDocument::open(pdf).unwrap();
    assert_eq!(doc.page_count(), 1);
}

/// Inherited attributes come from the closest ancestor; rotation is
/// normalised.
#[test]
fn page_tree_inheritance() {
    let mut pdf = TestPdf::new();
    let catalog = pdf.reserve();
    let pages = pdf.reserve();
    let page = pdf.reserve();
    let contents = pdf.reserve();

    pdf.set(
        catalog,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Catalog")),
            ("Pages", Object::Reference(pages)),
        ])),
    );
    // MediaBox and Rotate live on the Pages node, not the leaf
    pdf.set(
        pages,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Pages")),
            ("Count", Object::Integer(1)),
            ("Kids", Object::Array(vec![Object::Reference(page)])),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(300),
                    Object::Integer(400),
                ]),
            ),
            ("Rotate", Object::Integer(450)),
        ])),
    );
    pdf.set(
        page,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Page")),
            ("Parent", Object::Reference(pages)),
            ("Contents", Object::Reference(contents)),
        ])),
    );
    pdf.set(
        contents,
        Object::Stream(Stream::new(Dictionary::new(), Vec::new())),
    );
    let doc = PdfDocument::open(pdf.build(catalog)).unwrap();
    let page_id = doc.page_id(0).unwrap();
    assert_eq!(doc.page_media_box(page_id), [0.0, 0.0, 300.0, 400.0]);
    assert_eq!(doc.page_rotation(page_id), 90);
}

/// The Info dictionary is reachable through the trailer.
#[test]
fn info_dictionary() {
    let mut pdf = TestPdf::new();
    let catalog = pdf.reserve();
    let pages = pdf.reserve();
    let info = pdf.reserve();
    pdf.set(
        catalog,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Catalog")),
            ("Pages", Object::Reference(pages)),
        ])),
    );
    pdf.set(
        pages,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Pages")),
            ("Count", Object::Integer(0)),
            ("Kids", Object::Array(vec![])),
        ])),
    );
    pdf.set(
        info,
        Object::Dictionary(Dictionary::from_iter(vec![(
            "Title",
            Object::String(b"A Test".to_vec(), StringFormat::Literal),
        )])),
    );
    pdf.trailer_entry("Info", Object::Reference(info));
    let doc = PdfDocument::open(pdf.build(catalog)).unwrap();
    let info = doc.info().unwrap();
    assert_eq!(
        info.as_dict().unwrap().get(b"Title").unwrap().as_string(),
        Some(&b"A Test"[..])
    );
}
