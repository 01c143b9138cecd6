//! edit.rs
//!
//! Instruction-level text editing: find/replace, delete and insert inside
//! a page's content streams. Matching happens on decoded Unicode, writing
//! happens through the font's encoder; an instruction whose replacement
//! cannot be encoded is left untouched and not counted. Mutated streams
//! are re-serialised without compression and swapped into the document as
//! object overrides.

use std::collections::HashMap;
use std::rc::Rc;

use crate::content::{serialize_instructions, ContentInstruction, ContentIter};
use crate::document::PdfDocument;
use crate::error::Error;
use crate::font::PdfFont;
use crate::object::{Dictionary, Object, ObjectId, StringFormat, Stream};

#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    pub case_insensitive: bool,
}

/// Replaces every occurrence of `needle` in the page's shown text.
/// Returns the number of occurrences replaced.
pub fn replace_text(
    doc: &mut PdfDocument,
    page_index: usize,
    needle: &str,
    replacement: &str,
    opts: &EditOptions,
) -> Result<usize, Error> {
    edit_page(doc, page_index, |fonts, instr| {
        rewrite_instruction(fonts, instr, needle, replacement, opts)
    })
}

/// Drops every text-showing instruction whose decoded payload contains
/// `needle`. Returns the number of dropped instructions.
pub fn delete_text(
    doc: &mut PdfDocument,
    page_index: usize,
    needle: &str,
    opts: &EditOptions,
) -> Result<usize, Error> {
    edit_page(doc, page_index, |fonts, instr| {
        let font = match fonts.current() {
            Some(f) => f,
            None => return EditOutcome::Keep,
        };
        let decoded = match decoded_payload(&font, instr) {
            Some(d) => d,
            None => return EditOutcome::Keep,
        };
        if find_matches(&decoded, needle, opts).is_empty() {
            EditOutcome::Keep
        } else {
            EditOutcome::Drop { count: 1 }
        }
    })
}

/// Appends a text-showing sequence to the page: to its last content stream
/// when one exists (appending operators, never rewriting the existing
/// ones), otherwise as a new stream registered in `/Contents`.
pub fn insert_text(
    doc: &mut PdfDocument,
    page_index: usize,
    text: &str,
    font_resource: &str,
    font_size: f32,
    x: f32,
    y: f32,
) -> Result<(), Error> {
    let page_id = doc.page_id(page_index)?;
    let resources = doc.page_resources(page_id);
    let mut fonts = FontTracker::new(doc, resources);
    let encoded = fonts
        .by_name(font_resource.as_bytes())
        .and_then(|font| font.encode_text(text))
        .unwrap_or_else(|| text.bytes().collect());

    let mut snippet = Vec::new();
    snippet.extend_from_slice(b"q\nBT\n");
    crate::writer::write_name(font_resource.as_bytes(), &mut snippet);
    snippet.extend_from_slice(format!(" {font_size} Tf\n{x} {y} Td\n").as_bytes());
    crate::writer::write_object(
        &Object::String(encoded, StringFormat::Literal),
        &mut snippet,
    );
    snippet.extend_from_slice(b" Tj\nET\nQ\n");

    let contents = doc.page_contents(page_id);
    match contents.last() {
        Some((stream_id, stream_obj)) => {
            let stream = stream_obj
                .as_stream()
                .expect("page_contents returns streams");
            let mut body = stream.decoded_content()?.to_vec();
            if !body.ends_with(b"\n") && !body.is_empty() {
                body.push(b'\n');
            }
            body.extend_from_slice(&snippet);
            let mut new_stream = stream.clone();
            new_stream.set_plain_content(body);
            doc.set_object(*stream_id, Object::Stream(new_stream));
        }
        None => {
            let new_id = doc.allocate_object_id();
            doc.set_object(
                new_id,
                Object::Stream(Stream::new(Dictionary::new(), snippet)),
            );
            let mut page = doc.page_dict(page_index)?;
            page.set("Contents", Object::Reference(new_id));
            doc.set_object(page_id, Object::Dictionary(page));
        }
    }
    Ok(())
}

enum EditOutcome {
    Keep,
    Replace {
        instruction: ContentInstruction,
        count: usize,
    },
    Drop {
        count: usize,
    },
}

/// Walks every content stream of the page, tracking `Tf`, applying `edit`
/// to each text-showing instruction, and re-serialising changed streams.
fn edit_page<F>(doc: &mut PdfDocument, page_index: usize, mut edit: F) -> Result<usize, Error>
where
    F: FnMut(&mut FontTracker, &ContentInstruction) -> EditOutcome,
{
    let page_id = doc.page_id(page_index)?;
    let resources = doc.page_resources(page_id);
    let mut total = 0usize;
    let mut replacements: Vec<(ObjectId, Vec<u8>)> = Vec::new();

    let mut fonts = FontTracker::new(doc, resources);
    for (stream_id, stream_obj) in doc.page_contents(page_id) {
        let stream = stream_obj
            .as_stream()
            .expect("page_contents returns streams");
        let decoded = match stream.decoded_content() {
            Ok(d) => d.to_vec(),
            Err(e) => {
                log::warn!("skipping undecodable content stream in editor: {e}");
                continue;
            }
        };
        let mut changed = false;
        let mut instructions = Vec::new();
        for instr in ContentIter::new(&decoded) {
            if instr.operator == "Tf" {
                fonts.track_tf(&instr);
                instructions.push(instr);
                continue;
            }
            if !matches!(instr.operator.as_str(), "Tj" | "'" | "\"" | "TJ") {
                instructions.push(instr);
                continue;
            }
            match edit(&mut fonts, &instr) {
                EditOutcome::Keep => instructions.push(instr),
                EditOutcome::Replace { instruction, count } => {
                    total += count;
                    changed = true;
                    instructions.push(instruction);
                }
                EditOutcome::Drop { count } => {
                    total += count;
                    changed = true;
                }
            }
        }
        if changed {
            replacements.push((stream_id, serialize_instructions(&instructions)));
        }
    }

    for (stream_id, body) in replacements {
        let stream_obj = doc.get_object(stream_id)?;
        let mut new_stream = match stream_obj.as_stream() {
            Some(s) => s.clone(),
            None => continue,
        };
        new_stream.set_plain_content(body);
        doc.set_object(stream_id, Object::Stream(new_stream));
    }
    Ok(total)
}

/// Tracks the active font across `Tf` instructions, loading and caching
/// fonts from the page's resources.
struct FontTracker<'a> {
    doc: &'a PdfDocument,
    resources: Dictionary,
    loaded: HashMap<Vec<u8>, Option<Rc<PdfFont>>>,
    current: Option<Rc<PdfFont>>,
}

impl<'a> FontTracker<'a> {
    fn new(doc: &'a PdfDocument, resources: Dictionary) -> FontTracker<'a> {
        FontTracker {
            doc,
            resources,
            loaded: HashMap::new(),
            current: None,
        }
    }

    fn track_tf(&mut self, instr: &ContentInstruction) {
        if let Some(name) = instr.operands.first().and_then(|o| o.as_name()) {
            let name = name.to_vec();
            self.current = self.by_name(&name);
        }
    }

    fn current(&self) -> Option<Rc<PdfFont>> {
        self.current.clone()
    }

    fn by_name(&mut self, name: &[u8]) -> Option<Rc<PdfFont>> {
        if let Some(cached) = self.loaded.get(name) {
            return cached.clone();
        }
        let entry = self
            .resources
            .get(b"Font")
            .and_then(|f| f.as_dict())
            .and_then(|fonts| fonts.get(name))
            .cloned();
        let font = entry.and_then(|e| {
            if let Some(id) = e.as_reference() {
                if let Some(cached) = self.doc.font_cache.borrow().get(&id) {
                    return Some(cached.clone());
                }
            }
            let dict = self.doc.resolve(&e).ok()?.as_dict().cloned()?;
            let font = PdfFont::from_dict(self.doc, &dict).ok().map(Rc::new)?;
            if let Some(id) = e.as_reference() {
                self.doc.font_cache.borrow_mut().insert(id, font.clone());
            }
            Some(font)
        });
        self.loaded.insert(name.to_vec(), font.clone());
        font
    }
}

/// The concatenated decoded text of a showing instruction.
fn decoded_payload(font: &PdfFont, instr: &ContentInstruction) -> Option<String> {
    match instr.operator.as_str() {
        "Tj" | "'" => instr
            .operands
            .first()
            .and_then(|o| o.as_string())
            .map(|b| font.decode_text(b)),
        "\"" => instr
            .operands
            .get(2)
            .and_then(|o| o.as_string())
            .map(|b| font.decode_text(b)),
        "TJ" => {
            let arr = instr.operands.first()?.as_array()?;
            let mut text = String::new();
            for item in arr {
                if let Some(bytes) = item.as_string() {
                    text.push_str(&font.decode_text(bytes));
                }
            }
            Some(text)
        }
        _ => None,
    }
}

/// Char-index ranges of every non-overlapping match.
fn find_matches(haystack: &str, needle: &str, opts: &EditOptions) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }
    let hay: Vec<char> = haystack.chars().collect();
    let pat: Vec<char> = needle.chars().collect();
    let eq = |a: char, b: char| {
        if opts.case_insensitive {
            a.to_lowercase().eq(b.to_lowercase())
        } else {
            a == b
        }
    };
    let mut out = Vec::new();
    let mut i = 0usize;
    while i + pat.len() <= hay.len() {
        if hay[i..i + pat.len()]
            .iter()
            .zip(&pat)
            .all(|(a, b)| eq(*a, *b))
        {
            out.push((i, i + pat.len()));
            i += pat.len();
        } else {
            i += 1;
        }
    }
    out
}

fn replace_ranges(haystack: &str, ranges: &[(usize, usize)], replacement: &str) -> String {
    let hay: Vec<char> = haystack.chars().collect();
    let mut out = String::new();
    let mut pos = 0usize;
    for (start, end) in ranges {
        out.extend(hay[pos..*start].iter());
        out.push_str(replacement);
        pos = *end;
    }
    out.extend(hay[pos..].iter());
    out
}

fn rewrite_instruction(
    fonts: &mut FontTracker,
    instr: &ContentInstruction,
    needle: &str,
    replacement: &str,
    opts: &EditOptions,
) -> EditOutcome {
    let font = match fonts.current() {
        Some(f) => f,
        None => return EditOutcome::Keep,
    };
    match instr.operator.as_str() {
        "Tj" | "'" => rewrite_string_operand(&font, instr, 0, needle, replacement, opts),
        "\"" => rewrite_string_operand(&font, instr, 2, needle, replacement, opts),
        "TJ" => rewrite_tj(&font, instr, needle, replacement, opts),
        _ => EditOutcome::Keep,
    }
}

fn rewrite_string_operand(
    font: &PdfFont,
    instr: &ContentInstruction,
    operand_idx: usize,
    needle: &str,
    replacement: &str,
    opts: &EditOptions,
) -> EditOutcome {
    let (bytes, format) = match instr.operands.get(operand_idx) {
        Some(Object::String(b, f)) => (b, *f),
        _ => return EditOutcome::Keep,
    };
    let decoded = font.decode_text(bytes);
    let matches = find_matches(&decoded, needle, opts);
    if matches.is_empty() {
        return EditOutcome::Keep;
    }
    let rewritten = replace_ranges(&decoded, &matches, replacement);
    match font.encode_text(&rewritten) {
        Some(encoded) => {
            let mut instruction = instr.clone();
            instruction.operands[operand_idx] = Object::String(encoded, format);
            EditOutcome::Replace {
                instruction,
                count: matches.len(),
            }
        }
        // cannot encode the replacement: leave the original in place
        None => EditOutcome::Keep,
    }
}

/// `TJ` editing. Matches confined to single fragments are replaced in
/// place, keeping all kerning. A match that crosses fragments collapses
/// the array to one string, preserving only the kerning before the first
/// and after the last string.
fn rewrite_tj(
    font: &PdfFont,
    instr: &ContentInstruction,
    needle: &str,
    replacement: &str,
    opts: &EditOptions,
) -> EditOutcome {
    let arr = match instr.operands.first().and_then(|o| o.as_array()) {
        Some(a) => a.clone(),
        None => return EditOutcome::Keep,
    };

    // decode fragments and record their char spans in the concatenation
    let mut fragments: Vec<(usize, String, (usize, usize))> = Vec::new(); // (array idx, text, span)
    let mut concat = String::new();
    let mut char_pos = 0usize;
    for (i, item) in arr.iter().enumerate() {
        if let Some(bytes) = item.as_string() {
            let text = font.decode_text(bytes);
            let len = text.chars().count();
            fragments.push((i, text, (char_pos, char_pos + len)));
            concat.push_str(&fragments.last().unwrap().1);
            char_pos += len;
        }
    }
    let matches = find_matches(&concat, needle, opts);
    if matches.is_empty() {
        return EditOutcome::Keep;
    }
    let crossing = matches.iter().any(|(start, end)| {
        !fragments
            .iter()
            .any(|(_, _, (fs, fe))| start >= fs && end <= fe)
    });

    if !crossing {
        // per-fragment replacement keeps every kerning adjustment
        let mut new_arr = arr.clone();
        let mut count = 0usize;
        for (i, text, (fs, fe)) in &fragments {
            let local: Vec<(usize, usize)> = matches
                .iter()
                .filter(|(s, e)| s >= fs && e <= fe)
                .map(|(s, e)| (s - fs, e - fs))
                .collect();
            if local.is_empty() {
                continue;
            }
            let rewritten = replace_ranges(text, &local, replacement);
            match font.encode_text(&rewritten) {
                Some(encoded) => {
                    let format = match &arr[*i] {
                        Object::String(_, f) => *f,
                        _ => StringFormat::Literal,
                    };
                    new_arr[*i] = Object::String(encoded, format);
                    count += local.len();
                }
                None => return EditOutcome::Keep,
            }
        }
        if count == 0 {
            return EditOutcome::Keep;
        }
        let mut instruction = instr.clone();
        instruction.operands[0] = Object::Array(new_arr);
        return EditOutcome::Replace {
            instruction,
            count,
        };
    }

    // collapse: whole text becomes one fragment, endpoint kerning kept
    let rewritten = replace_ranges(&concat, &matches, replacement);
    let encoded = match font.encode_text(&rewritten) {
        Some(e) => e,
        None => return EditOutcome::Keep,
    };
    let first_string = fragments.first().map(|(i, _, _)| *i).unwrap_or(0);
    let last_string = fragments.last().map(|(i, _, _)| *i).unwrap_or(0);
    let mut new_arr: Vec<Object> = Vec::new();
    new_arr.extend_from_slice(&arr[..first_string]);
    new_arr.push(Object::String(encoded, StringFormat::Literal));
    if last_string + 1 < arr.len() {
        new_arr.extend_from_slice(&arr[last_string + 1..]);
    }
    let mut instruction = instr.clone();
    instruction.operands[0] = Object::Array(new_arr);
    EditOutcome::Replace {
        instruction,
        count: matches.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::build_test_pdf;

    fn helvetica() -> Object {
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::name("Font")),
            ("Subtype", Object::name("Type1")),
            ("BaseFont", Object::name("Helvetica")),
            ("Encoding", Object::name("WinAnsiEncoding")),
        ]))
    }

    fn page_text(doc: &PdfDocument) -> String {
        let mut sink = crate::sink::RecordingSink::new();
        crate::interpreter::render_page(doc, 0, &mut sink, &Default::default()).unwrap();
        sink.text()
    }

    #[test]
    fn replace_in_tj() {
        let pdf = build_test_pdf(
            b"BT /F1 12 Tf 72 720 Td (The quick brown fox) Tj ET",
            &[("F1", helvetica())],
        );
        let mut doc = PdfDocument::open(pdf).unwrap();
        let count =
            replace_text(&mut doc, 0, "quick", "slow", &EditOptions::default()).unwrap();
        assert_eq!(count, 1);
        assert!(doc.modified);
        assert_eq!(page_text(&doc), "The slow brown fox");

        let body = doc
            .page_content_bytes(doc.page_id(0).unwrap())
            .unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("(The slow brown fox)"), "{text}");
    }

    #[test]
    fn double_occurrence_counts_twice() {
        let pdf = build_test_pdf(
            b"BT /F1 12 Tf (foofoo) Tj ET",
            &[("F1", helvetica())],
        );
        let mut doc = PdfDocument::open(pdf).unwrap();
        let count = replace_text(&mut doc, 0, "foo", "bar", &EditOptions::default()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(page_text(&doc), "barbar");
    }

    #[test]
    fn case_insensitive_matching() {
        let pdf = build_test_pdf(
            b"BT /F1 12 Tf (Hello HELLO hello) Tj ET",
            &[("F1", helvetica())],
        );
        let mut doc = PdfDocument::open(pdf).unwrap();
        let count = replace_text(
            &mut doc,
            0,
            "hello",
            "bye",
            &EditOptions {
                case_insensitive: true,
            },
        )
        .unwrap();
        assert_eq!(count, 3);
        assert_eq!(page_text(&doc), "bye bye bye");
    }

    #[test]
    fn unencodable_replacement_leaves_instruction_untouched() {
        let pdf = build_test_pdf(b"BT /F1 12 Tf (abc) Tj ET", &[("F1", helvetica())]);
        let mut doc = PdfDocument::open(pdf).unwrap();
        // WinAnsi cannot encode kanji
        let count = replace_text(&mut doc, 0, "abc", "日本", &EditOptions::default()).unwrap();
        assert_eq!(count, 0);
        assert!(!doc.modified);
        assert_eq!(page_text(&doc), "abc");
    }

    #[test]
    fn tj_match_within_fragment_keeps_kerning() {
        let pdf = build_test_pdf(
            b"BT /F1 12 Tf [(foo) -120 (bar)] TJ ET",
            &[("F1", helvetica())],
        );
        let mut doc = PdfDocument::open(pdf).unwrap();
        let count = replace_text(&mut doc, 0, "bar", "baz", &EditOptions::default()).unwrap();
        assert_eq!(count, 1);
        let body = doc.page_content_bytes(doc.page_id(0).unwrap()).unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("-120"), "kerning dropped: {text}");
        assert_eq!(page_text(&doc), "foobaz");
    }

    #[test]
    fn tj_match_across_fragments_collapses() {
        let pdf = build_test_pdf(
            b"BT /F1 12 Tf [(foo) -120 (bar)] TJ ET",
            &[("F1", helvetica())],
        );
        let mut doc = PdfDocument::open(pdf).unwrap();
        let count = replace_text(&mut doc, 0, "oba", "xyz", &EditOptions::default()).unwrap();
        assert_eq!(count, 1);
        assert_eq!(page_text(&doc), "foxyzr");
        let body = doc.page_content_bytes(doc.page_id(0).unwrap()).unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(!text.contains("-120"), "interior kerning should collapse: {text}");
    }

    #[test]
    fn delete_drops_instruction() {
        let pdf = build_test_pdf(
            b"BT /F1 12 Tf (keep me) Tj (drop me) Tj ET",
            &[("F1", helvetica())],
        );
        let mut doc = PdfDocument::open(pdf).unwrap();
        let count = delete_text(&mut doc, 0, "drop", &EditOptions::default()).unwrap();
        assert_eq!(count, 1);
        assert_eq!(page_text(&doc), "keep me");
    }

    #[test]
    fn insert_appends_to_content() {
        let pdf = build_test_pdf(b"BT /F1 12 Tf (first) Tj ET", &[("F1", helvetica())]);
        let mut doc = PdfDocument::open(pdf).unwrap();
        insert_text(&mut doc, 0, "second", "F1", 14.0, 100.0, 200.0).unwrap();
        assert!(doc.modified);
        let text = page_text(&doc);
        assert!(text.contains("first") && text.contains("second"), "{text}");
        let body = doc.page_content_bytes(doc.page_id(0).unwrap()).unwrap();
        let body = String::from_utf8_lossy(&body);
        // appended, never rewritten
        assert!(body.starts_with("BT /F1 12 Tf (first) Tj ET"), "{body}");
    }
}
