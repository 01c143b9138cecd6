//! Shared fixture builder: assembles small PDFs object by object with a
//! classic xref table, so each test controls the exact file layout.

use readpdf::writer::{write_dictionary, write_object};
use readpdf::{Dictionary, Object, ObjectId};

/// Routes `log` output into the test harness when `RUST_LOG` is set.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
pub struct TestPdf {
    objects: Vec<(u32, Object)>,
    trailer_extra: Vec<(Vec<u8>, Object)>,
    next: u32,
}

impl TestPdf {
    pub fn new() -> TestPdf {
        TestPdf {
            objects: Vec::new(),
            trailer_extra: Vec::new(),
            next: 1,
        }
    }

    pub fn add(&mut self, obj: Object) -> ObjectId {
        let num = self.next;
        self.next += 1;
        self.objects.push((num, obj));
        (num, 0)
    }

    /// Reserves an object number without content yet.
    pub fn reserve(&mut self) -> ObjectId {
        let num = self.next;
        self.next += 1;
        (num, 0)
    }

    pub fn set(&mut self, id: ObjectId, obj: Object) {
        self.objects.push((id.0, obj));
    }

    pub fn trailer_entry<K: Into<Vec<u8>>>(&mut self, key: K, value: Object) {
        self.trailer_extra.push((key.into(), value));
    }

    /// Serialises with a classic xref table; `root` is the catalog.
    pub fn build(mut self, root: ObjectId) -> Vec<u8> {
        self.objects.sort_by_key(|(num, _)| *num);
        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.7\n");
        let mut offsets = vec![0usize; self.next as usize];
        for (num, obj) in &self.objects {
            offsets[*num as usize] = out.len();
            out.extend_from_slice(format!("{num} 0 obj\n").as_bytes());
            write_object(obj, &mut out);
            out.extend_from_slice(b"\nendobj\n");
        }
        let xref_offset = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", self.next).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        let mut trailer = Dictionary::new();
        trailer.set("Size", self.next as i64);
        trailer.set("Root", Object::Reference(root));
        for (key, value) in self.trailer_extra {
            trailer.set(key, value);
        }
        out.extend_from_slice(b"trailer\n");
        write_dictionary(&trailer, &mut out);
        out.extend_from_slice(format!("\nstartxref\n{xref_offset}\n%%EOF\n").as_bytes());
        out
    }
}

/// A one-page document: returns the builder plus the page id so callers
/// can add resources before building.
pub fn one_page_pdf(content: &[u8], fonts: Vec<(&str, Object)>) -> Vec<u8> {
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
    pdf.set(
        pages,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Pages")),
            ("Count", Object::Integer(1)),
            ("Kids", Object::Array(vec![Object::Reference(page)])),
        ])),
    );

    let mut font_dict = Dictionary::new();
    for (name, font) in fonts {
        font_dict.set(name, font);
    }
    let mut resources = Dictionary::new();
    if !font_dict.is_empty() {
        resources.set("Font", font_dict);
    }
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
        Object::Stream(readpdf::Stream::new(Dictionary::new(), content.to_vec())),
    );
    pdf.build(catalog)
}

/// Type1 Helvetica with WinAnsi encoding and explicit widths so advance
/// arithmetic is deterministic (space 250, `A` 500, `B` 600, others 500).
pub fn helvetica_with_widths() -> Object {
    let mut widths = vec![Object::Integer(500); 67 - 32];
    widths[0] = Object::Integer(250); // space
    widths[(b'A' - 32) as usize] = Object::Integer(500);
    widths[(b'B' - 32) as usize] = Object::Integer(600);
    Object::Dictionary(Dictionary::from_iter(vec![
        ("Type", Object::name("Font")),
        ("Subtype", Object::name("Type1")),
        ("BaseFont", Object::name("Helvetica")),
        ("Encoding", Object::name("WinAnsiEncoding")),
        ("FirstChar", Object::Integer(32)),
        ("LastChar", Object::Integer(66)),
        ("Widths", Object::Array(widths)),
    ]))
}
