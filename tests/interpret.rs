// tests/interpret.rs: the content-stream interpreter end to end: text
// runs, advance arithmetic, state balance, composite fonts.

mod common;

use common::{helvetica_with_widths, one_page_pdf, TestPdf};
use pretty_assertions::assert_eq;
use readpdf::{
    Dictionary, Object, PdfDocument, RecordingSink, RenderOptions, SinkEvent, Stream,
    StringFormat,
};

fn render(pdf: Vec<u8>) -> RecordingSink {
    let doc = PdfDocument::open(pdf).unwrap();
    let mut sink = RecordingSink::new();
    readpdf::render_page(&doc, 0, &mut sink, &RenderOptions::default()).unwrap();
    sink
}

/// A simple Type1 font shows "Hello" at (72, 720).
#[test]
fn hello_world_text_run() {
    let sink = render(one_page_pdf(
        b"BT /F1 12 Tf 72 720 Td (Hello) Tj ET",
        vec![("F1", helvetica_with_widths())],
    ));
    let runs: Vec<_> = sink.text_runs().collect();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].text, "Hello");
    assert_eq!(runs[0].font_size, 12.0);
    assert_eq!(runs[0].transform.e, 72.0);
    assert_eq!(runs[0].transform.f, 720.0);
}

/// After a show operator the text matrix has advanced by the sum of glyph
/// advances (widths, Tc, Tw and Tz included), observable as the start of
/// the next run.
#[test]
fn text_advance_matches_width_arithmetic() {
    // A (500) and B (600) at size 10, Tc 2, Tw 1, Tz 50
    let sink = render(one_page_pdf(
        b"BT /F1 10 Tf 2 Tc 1 Tw 50 Tz 0 0 Td (A B) Tj (A) Tj ET",
        vec![("F1", helvetica_with_widths())],
    ));
    let runs: Vec<_> = sink.text_runs().collect();
    assert_eq!(runs.len(), 2);
    let advance_sum: f32 = runs[0].glyphs.iter().map(|g| g.advance).sum();
    // 'A': (0.5*10 + 2) * 0.5 = 3.5; space: (0.25*10 + 2 + 1) * 0.5 = 2.75;
    // 'B': (0.6*10 + 2) * 0.5 = 4.0
    assert!((advance_sum - 10.25).abs() < 1e-4, "sum = {advance_sum}");
    assert!((runs[1].transform.e - runs[0].transform.e - advance_sum).abs() < 1e-4);
    assert_eq!(runs[1].transform.f, runs[0].transform.f);
}

/// TJ kerning shifts the next fragment by -n/1000 · fs · Th.
#[test]
fn tj_kerning_offsets() {
    let sink = render(one_page_pdf(
        b"BT /F1 10 Tf 0 0 Td [(A) -200 (B)] TJ ET",
        vec![("F1", helvetica_with_widths())],
    ));
    let runs: Vec<_> = sink.text_runs().collect();
    assert_eq!(runs.len(), 2);
    // A advances 5.0, then the -200 offset adds 200/1000*10 = 2.0
    assert!((runs[1].transform.e - (5.0 + 2.0)).abs() < 1e-4);
}

/// Leading-driven operators: T* and ' move down by TL.
#[test]
fn line_advance_with_leading() {
    let sink = render(one_page_pdf(
        b"BT /F1 10 Tf 14 TL 0 100 Td (one) Tj T* (two) Tj 0 -28 Td (three) ' ET",
        vec![("F1", helvetica_with_widths())],
    ));
    // ' performs its own line advance before showing
    let ys: Vec<f32> = sink.text_runs().map(|r| r.transform.f).collect();
    assert_eq!(ys, vec![100.0, 86.0, 44.0]);
}

/// The q depth is restored even for unbalanced content, and cm composes
/// with text placement.
#[test]
fn state_stack_and_ctm() {
    let sink = render(one_page_pdf(
        b"q 2 0 0 2 10 10 cm BT /F1 10 Tf 5 5 Td (X) Tj ET Q",
        vec![("F1", helvetica_with_widths())],
    ));
    let run = sink.text_runs().next().unwrap();
    // (5,5) through the scaled CTM lands at (20, 20)
    assert_eq!((run.transform.e, run.transform.f), (20.0, 20.0));
    let pushes = sink
        .events
        .iter()
        .filter(|e| matches!(e, SinkEvent::PushState))
        .count();
    let pops = sink
        .events
        .iter()
        .filter(|e| matches!(e, SinkEvent::PopState))
        .count();
    assert_eq!(pushes, pops);
}

/// A Type0/Identity-H font with a partial ToUnicode: mapped codes go
/// through it, unmapped codes fall back to CID-as-code-point.
#[test]
fn composite_identity_h_text() {
    let to_unicode = b"/CIDInit /ProcSet findresource begin
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
1 beginbfchar
<0041> <0041>
endbfchar
endcmap
end";
    let mut pdf = TestPdf::new();
    let catalog = pdf.reserve();
    let pages = pdf.reserve();
    let page = pdf.reserve();
    let contents = pdf.reserve();
    let tounicode_id = pdf.add(Object::Stream(Stream::new(
        Dictionary::new(),
        to_unicode.to_vec(),
    )));
    let cid_font = pdf.add(Object::Dictionary(Dictionary::from_iter(vec![
        ("Type", Object::name("Font")),
        ("Subtype", Object::name("CIDFontType2")),
        ("BaseFont", Object::name("Test")),
        (
            "CIDSystemInfo",
            Object::Dictionary(Dictionary::from_iter(vec![
                (
                    "Registry",
                    Object::String(b"Adobe".to_vec(), StringFormat::Literal),
                ),
                (
                    "Ordering",
                    Object::String(b"Identity".to_vec(), StringFormat::Literal),
                ),
                ("Supplement", Object::Integer(0)),
            ])),
        ),
        ("DW", Object::Integer(1000)),
        ("CIDToGIDMap", Object::name("Identity")),
    ])));
    let font = Object::Dictionary(Dictionary::from_iter(vec![
        ("Type", Object::name("Font")),
        ("Subtype", Object::name("Type0")),
        ("BaseFont", Object::name("Test")),
        ("Encoding", Object::name("Identity-H")),
        (
            "DescendantFonts",
            Object::Array(vec![Object::Reference(cid_font)]),
        ),
        ("ToUnicode", Object::Reference(tounicode_id)),
    ]));

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
            ("Count", Object::Integer(1)),
            ("Kids", Object::Array(vec![Object::Reference(page)])),
        ])),
    );
    let mut fonts = Dictionary::new();
    fonts.set("F1", font);
    let mut resources = Dictionary::new();
    resources.set("Font", fonts);
    pdf.set(
        page,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Page")),
            ("Parent", Object::Reference(pages)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(contents)),
        ])),
    );
    pdf.set(
        contents,
        Object::Stream(Stream::new(
            Dictionary::new(),
            b"BT /F1 10 Tf 0 0 Td <00410042> Tj ET".to_vec(),
        )),
    );

    let sink = render(pdf.build(catalog));
    assert_eq!(sink.text(), "AB");
    let run = sink.text_runs().next().unwrap();
    assert_eq!(run.glyphs.len(), 2);
    assert_eq!(run.glyphs[0].cid, 0x41);
}

/// Inline images surface as one image event.
#[test]
fn inline_image() {
    let sink = render(one_page_pdf(
        b"q BI /W 2 /H 2 /BPC 8 /CS /G ID\n\x01\x02\x03\x04\nEI Q",
        vec![],
    ));
    let image = sink.events.iter().find_map(|e| match e {
        SinkEvent::Image { width, height, .. } => Some((*width, *height)),
        _ => None,
    });
    assert_eq!(image, Some((2, 2)));
}

/// Colour operators feed resolved device colours to the sink.
#[test]
fn color_operators() {
    let sink = render(one_page_pdf(
        b"0.5 g 1 0 0 rg 0 0 1 0 k 0 0 5 5 re f",
        vec![],
    ));
    let fills: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            SinkEvent::FillColor(c) => Some(c.to_rgb()),
            _ => None,
        })
        .collect();
    assert_eq!(fills.len(), 3);
    assert_eq!(fills[0], readpdf::Rgb::gray(0.5));
    assert_eq!(fills[1], readpdf::Rgb::new(1.0, 0.0, 0.0));
    assert_eq!(fills[2], readpdf::Rgb::new(1.0, 1.0, 0.0)); // CMYK yellow
}
