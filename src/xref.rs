//! xref.rs
//!
//! Cross-reference resolution: classic tables, xref streams, hybrid files,
//! `Prev` chains and the best-effort rebuild fallback that scans the file
//! for `N G obj` headers when the tables are broken.
//!
//! Revision precedence is "first seen wins": the chain is walked from the
//! last `startxref` backwards through `Prev`, so the entry from the latest
//! revision is always inserted first and shadows older ones.

use std::collections::{HashMap, HashSet};

use crate::error::Error;
use crate::lexer::{is_whitespace, Lexer, Token};
use crate::object::{Dictionary, Object, ObjectId};

/// How far from the end of the file `startxref` and the header are searched.
const TRAILER_SEARCH_WINDOW: usize = 1024;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum XrefEntry {
    /// Slot is free; `next_free` links the free list.
    Free { next_free: u32, gen: u16 },
    /// Object lives at `offset` in the file.
    InUse { offset: u64, gen: u16 },
    /// Object number `container` is an object stream holding this object at
    /// position `index` in its header.
    Compressed { container: u32, index: u16 },
}

#[derive(Debug, Default, Clone)]
pub struct XrefTable {
    entries: HashMap<u32, XrefEntry>,
    /// Highest object number + 1 seen in any `Size` field.
    pub size: u32,
}

impl XrefTable {
    pub fn new() -> XrefTable {
        XrefTable::default()
    }

    pub fn get(&self, num: u32) -> Option<&XrefEntry> {
        self.entries.get(&num)
    }

    /// Latest-revision-wins insertion (sections are visited newest first).
    fn insert_if_absent(&mut self, num: u32, entry: XrefEntry) {
        self.entries.entry(num).or_insert(entry);
    }

    /// Unconditional insertion, used by the rebuild scan where later file
    /// positions are the newer revision.
    fn insert(&mut self, num: u32, entry: XrefEntry) {
        self.entries.insert(num, entry);
    }

    pub fn in_use_entries(&self) -> impl Iterator<Item = (u32, &XrefEntry)> {
        self.entries
            .iter()
            .filter(|(_, e)| !matches!(e, XrefEntry::Free { .. }))
            .map(|(n, e)| (*n, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Finds the byte offset stored after the last `startxref` keyword in the
/// trailing window of the file.
pub fn find_startxref(data: &[u8]) -> Result<usize, Error> {
    let tail_start = data.len().saturating_sub(TRAILER_SEARCH_WINDOW);
    let tail = &data[tail_start..];
    let kw = b"startxref";
    let pos = tail
        .windows(kw.len())
        .rposition(|w| w == kw)
        .ok_or(Error::InvalidTrailer)?;
    let mut lexer = Lexer::at(data, tail_start + pos + kw.len());
    match lexer.next_token() {
        Ok(Some(Token::Integer(offset))) if offset >= 0 => Ok(offset as usize),
        _ => Err(Error::InvalidTrailer),
    }
}

/// Parses the whole cross-reference chain. Returns the merged table and the
/// merged trailer dictionary (first-writer-wins per key across revisions).
pub fn parse(data: &[u8]) -> Result<(XrefTable, Dictionary), Error> {
    let start = find_startxref(data)?;
    let mut table = XrefTable::new();
    let mut trailer = Dictionary::new();
    let mut visited = HashSet::new();
    parse_section(data, start, &mut table, &mut trailer, &mut visited)?;
    if trailer.is_empty() {
        return Err(Error::InvalidXref("no trailer dictionary found".into()));
    }
    Ok((table, trailer))
}

fn parse_section(
    data: &[u8],
    offset: usize,
    table: &mut XrefTable,
    trailer: &mut Dictionary,
    visited: &mut HashSet<usize>,
) -> Result<(), Error> {
    if offset >= data.len() {
        return Err(Error::InvalidXref(format!(
            "xref offset {offset} is past the end of the file"
        )));
    }
    if !visited.insert(offset) {
        log::warn!("cyclic Prev chain at offset {offset}, stopping");
        return Ok(());
    }

    let mut lexer = Lexer::at(data, offset);
    lexer.skip_whitespace();
    if lexer.remaining().starts_with(b"xref") {
        parse_classic_section(data, lexer, table, trailer, visited)
    } else {
        parse_stream_section(data, offset, table, trailer, visited)
    }
}

/// `xref` keyword, subsections of `first count` + `count` 20-byte entries,
/// then `trailer` and its dictionary.
fn parse_classic_section(
    data: &[u8],
    mut lexer: Lexer,
    table: &mut XrefTable,
    trailer: &mut Dictionary,
    visited: &mut HashSet<usize>,
) -> Result<(), Error> {
    match lexer.next_token() {
        Ok(Some(ref t)) if t.is_keyword(b"xref") => {}
        _ => return Err(Error::InvalidXref("expected xref keyword".into())),
    }

    let mut section = Vec::new();
    loop {
        let first = match lexer.next_token() {
            Ok(Some(Token::Integer(n))) if n >= 0 => n as u32,
            Ok(Some(ref t)) if t.is_keyword(b"trailer") => break,
            other => {
                return Err(Error::InvalidXref(format!(
                    "expected subsection start or trailer, found {other:?}"
                )))
            }
        };
        let count = match lexer.next_token() {
            Ok(Some(Token::Integer(n))) if n >= 0 => n as u32,
            other => {
                return Err(Error::InvalidXref(format!(
                    "expected subsection count, found {other:?}"
                )))
            }
        };
        for i in 0..count {
            let offset = match lexer.next_token() {
                Ok(Some(Token::Integer(n))) if n >= 0 => n as u64,
                other => {
                    return Err(Error::InvalidXref(format!(
                        "bad xref entry offset: {other:?}"
                    )))
                }
            };
            let gen = match lexer.next_token() {
                Ok(Some(Token::Integer(n))) if (0..=u16::MAX as i64).contains(&n) => n as u16,
                other => {
                    return Err(Error::InvalidXref(format!(
                        "bad xref entry generation: {other:?}"
                    )))
                }
            };
            let entry = match lexer.next_token() {
                Ok(Some(ref t)) if t.is_keyword(b"n") => XrefEntry::InUse { offset, gen },
                Ok(Some(ref t)) if t.is_keyword(b"f") => XrefEntry::Free {
                    next_free: offset as u32,
                    gen,
                },
                other => {
                    return Err(Error::InvalidXref(format!(
                        "bad xref entry type: {other:?}"
                    )))
                }
            };
            section.push((first + i, entry));
        }
    }

    let dict = match lexer.next_object(None) {
        Ok(Object::Dictionary(d)) => d,
        _ => return Err(Error::InvalidXref("trailer is not a dictionary".into())),
    };

    // Hybrid files: the XRefStm entries shadow this classic section, so
    // insert them first.
    if let Some(Object::Integer(stm)) = dict.get(b"XRefStm") {
        let stm = *stm;
        if stm >= 0 {
            if let Err(e) = parse_section(data, stm as usize, table, trailer, visited) {
                log::warn!("ignoring broken XRefStm: {e}");
            }
        }
    }
    for (num, entry) in section {
        table.insert_if_absent(num, entry);
    }
    merge_trailer(trailer, &dict, table);

    if let Some(Object::Integer(prev)) = dict.get(b"Prev") {
        if *prev >= 0 {
            parse_section(data, *prev as usize, table, trailer, visited)?;
        }
    }
    Ok(())
}

/// An xref stream: `/Type /XRef` with `W`, `Index`, `Size` and packed
/// big-endian entry fields.
fn parse_stream_section(
    data: &[u8],
    offset: usize,
    table: &mut XrefTable,
    trailer: &mut Dictionary,
    visited: &mut HashSet<usize>,
) -> Result<(), Error> {
    let (_, obj) = Lexer::parse_indirect_object_at(data, offset, None)
        .map_err(|e| Error::InvalidXref(format!("xref stream object: {e}")))?;
    let stream = obj
        .as_stream()
        .ok_or_else(|| Error::InvalidXref("object at startxref is not a stream".into()))?;
    let dict = &stream.dict;

    let widths: Vec<usize> = dict
        .get(b"W")
        .and_then(|w| w.as_array())
        .map(|a| a.iter().filter_map(|o| o.as_i64()).map(|n| n as usize).collect())
        .ok_or_else(|| Error::InvalidXref("xref stream without W array".into()))?;
    if widths.len() < 3 || widths.iter().sum::<usize>() == 0 {
        return Err(Error::InvalidXref(format!("bad W array {widths:?}")));
    }
    let entry_len: usize = widths.iter().sum();

    let size = dict
        .get(b"Size")
        .and_then(|s| s.as_i64())
        .ok_or_else(|| Error::InvalidXref("xref stream without Size".into()))? as u32;

    let index: Vec<(u32, u32)> = match dict.get(b"Index").and_then(|i| i.as_array()) {
        Some(arr) => arr
            .chunks(2)
            .filter_map(|c| match (c.first().and_then(|o| o.as_i64()), c.get(1).and_then(|o| o.as_i64())) {
                (Some(f), Some(n)) if f >= 0 && n >= 0 => Some((f as u32, n as u32)),
                _ => None,
            })
            .collect(),
        None => vec![(0, size)],
    };

    let decoded = stream
        .decoded_content()
        .map_err(|e| Error::InvalidXref(format!("xref stream decode: {e}")))?;

    let mut pos = 0usize;
    for (first, count) in index {
        for i in 0..count {
            if pos + entry_len > decoded.len() {
                log::warn!("xref stream data ends early");
                break;
            }
            let mut fields = [1u64, 0, 0];
            for (f, w) in widths.iter().enumerate().take(3) {
                if *w == 0 {
                    // a zero-width first field defaults to type 1
                    fields[f] = if f == 0 { 1 } else { 0 };
                    continue;
                }
                let mut v = 0u64;
                for _ in 0..*w {
                    v = v << 8 | decoded[pos] as u64;
                    pos += 1;
                }
                fields[f] = v;
            }
            let entry = match fields[0] {
                0 => XrefEntry::Free {
                    next_free: fields[1] as u32,
                    gen: fields[2] as u16,
                },
                1 => XrefEntry::InUse {
                    offset: fields[1],
                    gen: fields[2] as u16,
                },
                2 => XrefEntry::Compressed {
                    container: fields[1] as u32,
                    index: fields[2] as u16,
                },
                other => {
                    log::warn!("unknown xref entry type {other}, treating slot as free");
                    XrefEntry::Free {
                        next_free: 0,
                        gen: 0,
                    }
                }
            };
            table.insert_if_absent(first + i, entry);
        }
    }

    merge_trailer(trailer, dict, table);

    if let Some(Object::Integer(prev)) = dict.get(b"Prev") {
        if *prev >= 0 {
            parse_section(data, *prev as usize, table, trailer, visited)?;
        }
    }
    Ok(())
}

/// First-writer-wins merge of trailer keys; `Size` additionally raises the
/// table's high-water mark.
fn merge_trailer(acc: &mut Dictionary, dict: &Dictionary, table: &mut XrefTable) {
    for (key, value) in dict.iter() {
        match key.as_slice() {
            // chain bookkeeping, never merged
            b"Prev" | b"XRefStm" | b"Type" | b"W" | b"Index" | b"Length" | b"Filter"
            | b"DecodeParms" => {}
            _ => {
                if !acc.has(key) {
                    acc.set(key.clone(), value.clone());
                }
            }
        }
    }
    if let Some(size) = dict.get(b"Size").and_then(|s| s.as_i64()) {
        table.size = table.size.max(size as u32);
    }
}

/// Best-effort reconstruction: scans for `N G obj` headers and `trailer`
/// dictionaries. Later file positions override earlier ones, matching the
/// append-only structure of incremental updates.
pub fn rebuild(data: &[u8]) -> (XrefTable, Option<Dictionary>) {
    log::warn!("xref data was invalid, scanning the file to rebuild it");
    let mut table = XrefTable::new();
    let mut trailer: Option<Dictionary> = None;
    let mut catalog_ref: Option<ObjectId> = None;

    let kw = b"obj";
    let mut i = 0usize;
    while i + kw.len() <= data.len() {
        if &data[i..i + kw.len()] != kw {
            i += 1;
            continue;
        }
        let after = data.get(i + kw.len()).copied();
        let boundary_ok = after.map(|b| is_whitespace(b) || b == b'<' || b == b'[').unwrap_or(true);
        if !boundary_ok {
            i += 1;
            continue;
        }
        if let Some((start, num, gen)) = scan_header_backwards(data, i) {
            table.insert(num, XrefEntry::InUse { offset: start as u64, gen });
            table.size = table.size.max(num + 1);
            if catalog_ref.is_none() {
                if let Ok(((n, g), obj)) = Lexer::parse_indirect_object_at(data, start, None) {
                    if let Some(dict) = obj.as_dict() {
                        if dict.get(b"Type").and_then(|t| t.as_name()) == Some(b"Catalog") {
                            catalog_ref = Some((n, g));
                        }
                    }
                }
            }
        }
        i += kw.len();
    }

    let tkw = b"trailer";
    let mut t = 0usize;
    while t + tkw.len() <= data.len() {
        if &data[t..t + tkw.len()] == tkw {
            let mut lexer = Lexer::at(data, t + tkw.len());
            if let Ok(Object::Dictionary(dict)) = lexer.next_object(None) {
                if dict.has(b"Root") {
                    trailer = Some(dict);
                }
            }
            t += tkw.len();
        } else {
            t += 1;
        }
    }

    if trailer.is_none() {
        if let Some(root) = catalog_ref {
            let mut dict = Dictionary::new();
            dict.set("Size", table.size as i64);
            dict.set("Root", Object::Reference(root));
            log::warn!("no trailer found, synthesised one from the catalog object");
            trailer = Some(dict);
        }
    }

    (table, trailer)
}

/// Walks backwards from the `obj` keyword over `G` and `N`, returning the
/// offset of `N` plus both numbers.
fn scan_header_backwards(data: &[u8], obj_pos: usize) -> Option<(usize, u32, u16)> {
    let mut p = obj_pos;
    // whitespace before "obj"
    let ws_end = p;
    while p > 0 && is_whitespace(data[p - 1]) {
        p -= 1;
    }
    if p == ws_end {
        return None;
    }
    // generation digits
    let gen_end = p;
    while p > 0 && data[p - 1].is_ascii_digit() {
        p -= 1;
    }
    if p == gen_end {
        return None;
    }
    let gen: u16 = std::str::from_utf8(&data[p..gen_end]).ok()?.parse().ok()?;
    // whitespace between N and G
    let ws2_end = p;
    while p > 0 && is_whitespace(data[p - 1]) {
        p -= 1;
    }
    if p == ws2_end {
        return None;
    }
    // object number digits
    let num_end = p;
    while p > 0 && data[p - 1].is_ascii_digit() {
        p -= 1;
    }
    if p == num_end {
        return None;
    }
    let num: u32 = std::str::from_utf8(&data[p..num_end]).ok()?.parse().ok()?;
    // the header must start the line (or the file)
    if p > 0 && !is_whitespace(data[p - 1]) {
        return None;
    }
    Some((p, num, gen))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSIC: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\nxref\n0 2\n0000000000 65535 f \n0000000009 00000 n \ntrailer\n<< /Size 2 /Root 1 0 R >>\nstartxref\n45\n%%EOF";

    #[test]
    fn classic_table() {
        let (table, trailer) = parse(CLASSIC).unwrap();
        assert_eq!(
            table.get(1),
            Some(&XrefEntry::InUse { offset: 9, gen: 0 })
        );
        assert!(matches!(table.get(0), Some(XrefEntry::Free { .. })));
        assert_eq!(trailer.get(b"Size").and_then(|s| s.as_i64()), Some(2));
    }

    #[test]
    fn startxref_missing_is_invalid_trailer() {
        assert!(matches!(
            find_startxref(b"%PDF-1.4 no trailer here"),
            Err(Error::InvalidTrailer)
        ));
    }

    #[test]
    fn prev_chain_first_seen_wins() {
        // Revision B (older): object 5 free. Revision A (newer): object 5 in use.
        // Chain A -> B; the InUse entry from A must win.
        let older = b"xref\n0 1\n0000000000 65535 f \n5 1\n0000000000 00001 f \ntrailer\n<< /Size 6 /Root 1 0 R >>\n";
        let mut file = Vec::new();
        file.extend_from_slice(b"%PDF-1.4\n");
        let older_offset = file.len();
        file.extend_from_slice(older);
        let newer_offset = file.len();
        file.extend_from_slice(
            format!(
                "xref\n5 1\n0000000123 00000 n \ntrailer\n<< /Size 6 /Prev {older_offset} >>\nstartxref\n{newer_offset}\n%%EOF"
            )
            .as_bytes(),
        );
        let (table, trailer) = parse(&file).unwrap();
        assert_eq!(
            table.get(5),
            Some(&XrefEntry::InUse { offset: 123, gen: 0 })
        );
        // Root comes from the older revision, Size from the newer one.
        assert_eq!(trailer.get(b"Root"), Some(&Object::Reference((1, 0))));
        assert_eq!(trailer.get(b"Size").and_then(|s| s.as_i64()), Some(6));
    }

    #[test]
    fn rebuild_finds_objects_and_trailer() {
        let data: &[u8] = b"%PDF-1.4\n3 0 obj\n<< /Type /Catalog /Pages 4 0 R >>\nendobj\n4 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\ntrailer\n<< /Size 5 /Root 3 0 R >>\n";
        let (table, trailer) = rebuild(data);
        assert_eq!(table.get(3), Some(&XrefEntry::InUse { offset: 9, gen: 0 }));
        assert!(table.get(4).is_some());
        assert_eq!(
            trailer.unwrap().get(b"Root"),
            Some(&Object::Reference((3, 0)))
        );
    }
}
