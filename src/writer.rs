//! writer.rs
//!
//! Serialises objects and whole documents back to bytes. Dictionaries keep
//! their insertion order, strings keep their literal/hex spelling, numbers
//! round-trip exactly, so untouched objects re-emit byte-stably. The
//! document writer produces either a full rewrite with a fresh classic
//! xref table or an incremental update appended to the original bytes.

use std::collections::BTreeMap;

use crate::document::PdfDocument;
use crate::error::Error;
use crate::lexer::is_delimiter;
use crate::object::{Dictionary, Object, ObjectId, StringFormat};
use crate::xref::XrefEntry;

#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Append changed objects to the original file instead of rewriting.
    pub incremental: bool,
}

/// A name, `#xx`-escaping delimiters, whitespace and non-printable bytes.
pub fn write_name(name: &[u8], out: &mut Vec<u8>) {
    out.push(b'/');
    for &b in name {
        if b.is_ascii_graphic() && !is_delimiter(b) && b != b'#' {
            out.push(b);
        } else {
            out.push(b'#');
            out.push(hex_digit(b >> 4));
            out.push(hex_digit(b & 0xF));
        }
    }
}

fn hex_digit(v: u8) -> u8 {
    match v {
        0..=9 => b'0' + v,
        _ => b'A' + v - 10,
    }
}

/// A real with no exponent, trailing zeros trimmed.
fn write_real(v: f32, out: &mut Vec<u8>) {
    if v == v.trunc() && v.abs() < 1e12 {
        out.extend_from_slice(format!("{}", v as i64).as_bytes());
        return;
    }
    let s = format!("{v:.6}");
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    out.extend_from_slice(trimmed.as_bytes());
}

fn write_string(bytes: &[u8], format: StringFormat, out: &mut Vec<u8>) {
    match format {
        StringFormat::Literal => {
            out.push(b'(');
            for &b in bytes {
                match b {
                    b'(' => out.extend_from_slice(b"\\("),
                    b')' => out.extend_from_slice(b"\\)"),
                    b'\\' => out.extend_from_slice(b"\\\\"),
                    // a raw CR would read back as LF
                    b'\r' => out.extend_from_slice(b"\\r"),
                    b => out.push(b),
                }
            }
            out.push(b')');
        }
        StringFormat::Hexadecimal => {
            out.push(b'<');
            for &b in bytes {
                out.push(hex_digit(b >> 4));
                out.push(hex_digit(b & 0xF));
            }
            out.push(b'>');
        }
    }
}

pub fn write_object(obj: &Object, out: &mut Vec<u8>) {
    match obj {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(true) => out.extend_from_slice(b"true"),
        Object::Boolean(false) => out.extend_from_slice(b"false"),
        Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Object::Real(r) => write_real(*r, out),
        Object::Name(n) => write_name(n, out),
        Object::String(s, format) => write_string(s, *format, out),
        Object::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                write_object(item, out);
            }
            out.push(b']');
        }
        Object::Dictionary(dict) => write_dictionary(dict, out),
        Object::Stream(stream) => {
            // Length always mirrors the payload
            let mut dict = stream.dict.clone();
            dict.set("Length", stream.content.len() as i64);
            write_dictionary(&dict, out);
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(&stream.content);
            out.extend_from_slice(b"\nendstream");
        }
        Object::Reference((num, gen)) => {
            out.extend_from_slice(format!("{num} {gen} R").as_bytes());
        }
    }
}

pub fn write_dictionary(dict: &Dictionary, out: &mut Vec<u8>) {
    out.extend_from_slice(b"<< ");
    for (key, value) in dict.iter() {
        write_name(key, out);
        out.push(b' ');
        write_object(value, out);
        out.push(b' ');
    }
    out.extend_from_slice(b">>");
}

/// Serialises the document. Encrypted documents are written decrypted,
/// which forces a full rewrite (the appended objects would otherwise mix
/// plaintext into an encrypted revision).
pub fn save_document(doc: &PdfDocument, opts: &SaveOptions) -> Result<Vec<u8>, Error> {
    if opts.incremental && !doc.is_encrypted() {
        save_incremental(doc)
    } else {
        if opts.incremental {
            log::warn!("incremental save of an encrypted document falls back to a full rewrite");
        }
        save_full(doc)
    }
}

fn writable_object(doc: &PdfDocument, id: ObjectId) -> Option<std::rc::Rc<Object>> {
    let obj = doc.get_object(id).ok()?;
    // xref and object streams are structure, not content; the rewrite
    // enumerates their members as regular objects instead
    if let Some(stream) = obj.as_stream() {
        match stream.dict.get(b"Type").and_then(|t| t.as_name()) {
            Some(b"XRef") | Some(b"ObjStm") => return None,
            _ => {}
        }
    }
    Some(obj)
}

fn save_full(doc: &PdfDocument) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("%PDF-{}\n", doc.version).as_bytes());
    // binary comment so transports treat the file as binary
    out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    let mut numbers: BTreeMap<u32, u16> = BTreeMap::new();
    for (num, entry) in doc.xref().in_use_entries() {
        let gen = match entry {
            XrefEntry::InUse { gen, .. } => *gen,
            _ => 0,
        };
        numbers.insert(num, gen);
    }
    for (id, _) in doc.overrides() {
        numbers.insert(id.0, id.1);
    }

    let mut offsets: BTreeMap<u32, (u64, u16)> = BTreeMap::new();
    for (&num, &gen) in &numbers {
        let obj = match writable_object(doc, (num, gen)) {
            Some(o) => o,
            None => continue,
        };
        offsets.insert(num, (out.len() as u64, gen));
        out.extend_from_slice(format!("{num} {gen} obj\n").as_bytes());
        write_object(&obj, &mut out);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    let size = offsets.keys().max().map(|n| n + 1).unwrap_or(1);
    out.extend_from_slice(b"xref\n");
    out.extend_from_slice(format!("0 {size}\n").as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for num in 1..size {
        match offsets.get(&num) {
            Some((offset, gen)) => {
                out.extend_from_slice(format!("{offset:010} {gen:05} n \n").as_bytes());
            }
            None => out.extend_from_slice(b"0000000000 65535 f \n"),
        }
    }

    let mut trailer = Dictionary::new();
    trailer.set("Size", size as i64);
    for key in [&b"Root"[..], b"Info", b"ID"] {
        if let Some(value) = doc.trailer.get(key) {
            trailer.set(key.to_vec(), value.clone());
        }
    }
    out.extend_from_slice(b"trailer\n");
    write_dictionary(&trailer, &mut out);
    out.extend_from_slice(format!("\nstartxref\n{xref_offset}\n%%EOF\n").as_bytes());
    Ok(out)
}

/// Original bytes plus the changed objects and one more xref section with
/// a `Prev` link, the append-only shape incremental updates require.
fn save_incremental(doc: &PdfDocument) -> Result<Vec<u8>, Error> {
    let overrides = doc.overrides();
    if overrides.is_empty() {
        return Ok(doc.original_bytes().to_vec());
    }
    let prev_startxref = crate::xref::find_startxref(doc.original_bytes())?;

    let mut out = doc.original_bytes().to_vec();
    if out.last() != Some(&b'\n') {
        out.push(b'\n');
    }

    let mut offsets: Vec<(u32, u16, u64)> = Vec::new();
    for (id, obj) in &overrides {
        offsets.push((id.0, id.1, out.len() as u64));
        out.extend_from_slice(format!("{} {} obj\n", id.0, id.1).as_bytes());
        write_object(obj, &mut out);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    out.extend_from_slice(b"xref\n");
    // one subsection per consecutive run of object numbers
    let mut i = 0usize;
    while i < offsets.len() {
        let mut j = i;
        while j + 1 < offsets.len() && offsets[j + 1].0 == offsets[j].0 + 1 {
            j += 1;
        }
        out.extend_from_slice(format!("{} {}\n", offsets[i].0, j - i + 1).as_bytes());
        for (_, gen, offset) in &offsets[i..=j] {
            out.extend_from_slice(format!("{offset:010} {gen:05} n \n").as_bytes());
        }
        i = j + 1;
    }

    let size = doc
        .trailer
        .get(b"Size")
        .and_then(|s| s.as_i64())
        .unwrap_or(0)
        .max(offsets.iter().map(|(n, _, _)| *n as i64 + 1).max().unwrap_or(0));
    let mut trailer = Dictionary::new();
    trailer.set("Size", size);
    for key in [&b"Root"[..], b"Info", b"ID"] {
        if let Some(value) = doc.trailer.get(key) {
            trailer.set(key.to_vec(), value.clone());
        }
    }
    trailer.set("Prev", prev_startxref as i64);
    out.extend_from_slice(b"trailer\n");
    write_dictionary(&trailer, &mut out);
    out.extend_from_slice(format!("\nstartxref\n{xref_offset}\n%%EOF\n").as_bytes());
    Ok(out)
}

/// Builds a one-page document for the unit tests: `content` becomes the
/// page's single content stream, `fonts` land in the page's font
/// resources.
#[cfg(test)]
pub(crate) fn build_test_pdf(content: &[u8], fonts: &[(&str, Object)]) -> Vec<u8> {
    use crate::object::Stream;

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.7\n");

    let mut offsets = Vec::new();
    let mut emit = |out: &mut Vec<u8>, num: u32, obj: &Object| {
        offsets.push(out.len());
        out.extend_from_slice(format!("{num} 0 obj\n").as_bytes());
        write_object(obj, out);
        out.extend_from_slice(b"\nendobj\n");
    };

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::name("Catalog")),
        ("Pages", Object::Reference((2, 0))),
    ]);
    emit(&mut out, 1, &Object::Dictionary(catalog));

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::name("Pages")),
        ("Count", Object::Integer(1)),
        ("Kids", Object::Array(vec![Object::Reference((3, 0))])),
    ]);
    emit(&mut out, 2, &Object::Dictionary(pages));

    let mut font_dict = Dictionary::new();
    for (name, font) in fonts {
        font_dict.set(*name, font.clone());
    }
    let mut resources = Dictionary::new();
    if !font_dict.is_empty() {
        resources.set("Font", font_dict);
    }
    let page = Dictionary::from_iter(vec![
        ("Type", Object::name("Page")),
        ("Parent", Object::Reference((2, 0))),
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
        ("Contents", Object::Reference((4, 0))),
    ]);
    emit(&mut out, 3, &Object::Dictionary(page));

    emit(
        &mut out,
        4,
        &Object::Stream(Stream::new(Dictionary::new(), content.to_vec())),
    );

    let xref_offset = out.len();
    out.extend_from_slice(b"xref\n0 5\n0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(b"trailer\n<< /Size 5 /Root 1 0 R >>\n");
    out.extend_from_slice(format!("startxref\n{xref_offset}\n%%EOF\n").as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn roundtrip(obj: &Object) -> Object {
        let mut bytes = Vec::new();
        write_object(obj, &mut bytes);
        Lexer::new(&bytes).next_object(None).unwrap()
    }

    #[test]
    fn names_roundtrip() {
        for name in [
            &b"Simple"[..],
            b"With Space",
            b"Weird#Chars",
            b"Paren(",
            b"",
            b"\x01\xFF",
        ] {
            let obj = Object::Name(name.to_vec());
            assert_eq!(roundtrip(&obj), obj, "name {name:?}");
        }
    }

    #[test]
    fn strings_roundtrip() {
        for bytes in [
            &b"hello"[..],
            b"par(en)s",
            b"back\\slash",
            b"line\nbreak\r!",
            b"\x00\x01\xFE\xFF",
        ] {
            let literal = Object::String(bytes.to_vec(), StringFormat::Literal);
            assert_eq!(roundtrip(&literal), literal, "literal {bytes:?}");
            let hex = Object::String(bytes.to_vec(), StringFormat::Hexadecimal);
            assert_eq!(roundtrip(&hex), hex, "hex {bytes:?}");
        }
    }

    #[test]
    fn numbers_roundtrip() {
        assert_eq!(roundtrip(&Object::Integer(-42)), Object::Integer(-42));
        assert_eq!(roundtrip(&Object::Real(3.25)), Object::Real(3.25));
        // whole reals write as integers, which parse as integers
        let mut bytes = Vec::new();
        write_object(&Object::Real(5.0), &mut bytes);
        assert_eq!(bytes, b"5");
    }

    #[test]
    fn dictionary_order_is_stable() {
        let dict = Dictionary::from_iter(vec![
            ("Zebra", Object::Integer(1)),
            ("Apple", Object::Integer(2)),
        ]);
        let mut bytes = Vec::new();
        write_dictionary(&dict, &mut bytes);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.find("/Zebra").unwrap() < text.find("/Apple").unwrap());
    }

    #[test]
    fn test_pdf_fixture_opens() {
        let pdf = build_test_pdf(b"BT ET", &[]);
        let doc = PdfDocument::open(pdf).unwrap();
        assert_eq!(doc.page_count(), 1);
        let page_id = doc.page_id(0).unwrap();
        assert_eq!(doc.page_media_box(page_id), [0.0, 0.0, 612.0, 792.0]);
    }

    #[test]
    fn full_save_reparses() {
        let pdf = build_test_pdf(b"0 0 10 10 re f", &[]);
        let doc = PdfDocument::open(pdf).unwrap();
        let saved = doc.save(&SaveOptions::default()).unwrap();
        let reopened = PdfDocument::open(saved).unwrap();
        assert_eq!(reopened.page_count(), 1);
        let page_id = reopened.page_id(0).unwrap();
        assert_eq!(
            reopened.page_content_bytes(page_id).unwrap(),
            b"0 0 10 10 re f"
        );
    }

    #[test]
    fn incremental_save_appends() {
        let pdf = build_test_pdf(b"BT ET", &[]);
        let original_len = pdf.len();
        let mut doc = PdfDocument::open(pdf).unwrap();
        let (stream_id, stream_obj) = doc.page_contents(doc.page_id(0).unwrap())[0].clone();
        let mut new_stream = stream_obj.as_stream().unwrap().clone();
        new_stream.set_plain_content(b"q Q".to_vec());
        doc.set_object(stream_id, Object::Stream(new_stream));

        let saved = doc
            .save(&SaveOptions { incremental: true })
            .unwrap();
        assert_eq!(&saved[..original_len], doc.original_bytes());
        let reopened = PdfDocument::open(saved).unwrap();
        assert_eq!(
            reopened.page_content_bytes(reopened.page_id(0).unwrap()).unwrap(),
            b"q Q"
        );
    }
}
