//! CMap parsing: ToUnicode CMaps, embedded encoding CMaps and the built-in
//! Identity CMaps. One parser covers all three, since a ToUnicode CMap is just a
//! CMap whose destinations are Unicode strings.
//!
//! Decoding consumes the longest codespace-valid prefix, so 1-byte and
//! 2-byte codes can share a CMap.

use std::collections::HashMap;

use crate::error::Error;
use crate::lexer::{Lexer, Token};
use crate::object::Object;

/// Destination of a `bfrange` entry.
#[derive(Debug, Clone, PartialEq)]
enum BfDestination {
    /// UTF-16BE units of the start string; the last unit increments across
    /// the range.
    Increment(Vec<u16>),
    /// One destination string per code.
    Array(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Codespace {
    n_bytes: u8,
    low: u32,
    high: u32,
}

#[derive(Debug, Clone, Default)]
pub struct CMap {
    pub name: Option<String>,
    pub wmode: u8,
    pub registry: Option<String>,
    pub ordering: Option<String>,
    pub supplement: i64,
    codespaces: Vec<Codespace>,
    cid_singles: HashMap<(u8, u32), u32>,
    cid_ranges: Vec<(u8, u32, u32, u32)>,
    bf_singles: HashMap<(u8, u32), String>,
    bf_ranges: Vec<(u8, u32, u32, BfDestination)>,
    notdef_singles: HashMap<(u8, u32), u32>,
    notdef_ranges: Vec<(u8, u32, u32, u32)>,
    base: Option<Box<CMap>>,
}

impl CMap {
    /// Identity-H / Identity-V: two-byte codes, CID == code.
    pub fn identity(wmode: u8) -> CMap {
        CMap {
            name: Some(if wmode == 0 { "Identity-H" } else { "Identity-V" }.to_string()),
            wmode,
            registry: Some("Adobe".into()),
            ordering: Some("Identity".into()),
            codespaces: vec![Codespace {
                n_bytes: 2,
                low: 0,
                high: 0xFFFF,
            }],
            cid_ranges: vec![(2, 0, 0xFFFF, 0)],
            ..CMap::default()
        }
    }

    /// A CID → Unicode identity over the BMP, the "UCS-2 chain" fallback
    /// for the predefined CJK CMaps.
    pub fn ucs2_chain() -> CMap {
        CMap {
            name: Some("UCS2".into()),
            codespaces: vec![Codespace {
                n_bytes: 2,
                low: 0,
                high: 0xFFFF,
            }],
            bf_ranges: vec![(2, 0, 0xFFFF, BfDestination::Increment(vec![0]))],
            ..CMap::default()
        }
    }

    /// A built-in CMap by name. `Identity-H`/`Identity-V` are exact; the
    /// predefined CJK CMaps are approximated by a two-byte identity with
    /// the correct writing mode, which pairs with [`CMap::ucs2_chain`] for
    /// the `Uni*-UCS2` family.
    pub fn predefined(name: &str) -> Option<CMap> {
        let wmode = if name.ends_with("-V") { 1 } else { 0 };
        match name {
            "Identity-H" => return Some(CMap::identity(0)),
            "Identity-V" => return Some(CMap::identity(1)),
            _ => {}
        }
        const KNOWN_PREFIXES: [&str; 14] = [
            "UniCNS-UCS2", "UniGB-UCS2", "UniJIS-UCS2", "UniKS-UCS2", "UniCNS-UTF16",
            "UniGB-UTF16", "UniJIS-UTF16", "UniKS-UTF16", "GB-EUC", "GBK-EUC", "ETen-B5",
            "B5pc", "90ms-RKSJ", "KSC-EUC",
        ];
        if KNOWN_PREFIXES.iter().any(|p| name.starts_with(p))
            || (name.ends_with("-H") || name.ends_with("-V"))
        {
            log::warn!("approximating predefined CMap {name} as two-byte identity");
            let mut cmap = CMap::identity(wmode);
            cmap.name = Some(name.to_string());
            return Some(cmap);
        }
        None
    }

    /// Parses CMap syntax (both embedded ToUnicode streams and full CMap
    /// programs). Unknown PostScript machinery between sections is skipped.
    pub fn parse(data: &[u8]) -> Result<CMap, Error> {
        let mut cmap = CMap::default();
        let mut lexer = Lexer::new(data);
        // operand stack for `/Key value def` and `usecmap`
        let mut stack: Vec<Object> = Vec::new();

        loop {
            let token = match lexer.next_token() {
                Ok(Some(t)) => t,
                Ok(None) => break,
                Err(e) => {
                    log::warn!("CMap data ends mid-construct: {e}");
                    break;
                }
            };
            match token {
                Token::Name(n) => stack.push(Object::Name(n)),
                Token::Integer(i) => stack.push(Object::Integer(i)),
                Token::Real(r) => stack.push(Object::Real(r)),
                Token::LiteralString(s) => {
                    stack.push(Object::String(s, crate::object::StringFormat::Literal))
                }
                Token::HexString(s) => {
                    stack.push(Object::String(s, crate::object::StringFormat::Hexadecimal))
                }
                Token::ArrayOpen => {
                    if let Ok(arr) = lexer.parse_array(None) {
                        stack.push(arr);
                    }
                }
                Token::DictOpen => {
                    if let Ok(dict) = lexer.parse_dictionary(None) {
                        stack.push(Object::Dictionary(dict));
                    }
                }
                Token::Keyword(kw) => match kw.as_slice() {
                    b"begincodespacerange" => {
                        cmap.parse_codespaces(&mut lexer);
                        stack.clear();
                    }
                    b"begincidchar" => {
                        cmap.parse_cid_singles(&mut lexer);
                        stack.clear();
                    }
                    b"begincidrange" => {
                        cmap.parse_cid_ranges(&mut lexer);
                        stack.clear();
                    }
                    b"beginbfchar" => {
                        cmap.parse_bf_singles(&mut lexer);
                        stack.clear();
                    }
                    b"beginbfrange" => {
                        cmap.parse_bf_ranges(&mut lexer);
                        stack.clear();
                    }
                    b"beginnotdefchar" => {
                        cmap.parse_notdef_singles(&mut lexer);
                        stack.clear();
                    }
                    b"beginnotdefrange" => {
                        cmap.parse_notdef_ranges(&mut lexer);
                        stack.clear();
                    }
                    b"usecmap" => {
                        if let Some(Object::Name(base)) = stack.pop() {
                            let base_name = String::from_utf8_lossy(&base).into_owned();
                            match CMap::predefined(&base_name) {
                                Some(base) => cmap.base = Some(Box::new(base)),
                                None => log::warn!("usecmap references unknown CMap {base_name}"),
                            }
                        }
                        stack.clear();
                    }
                    b"def" => {
                        cmap.record_definition(&stack);
                        stack.clear();
                    }
                    b"endcmap" => break,
                    _ => stack.clear(),
                },
                _ => stack.clear(),
            }
        }
        Ok(cmap)
    }

    fn record_definition(&mut self, stack: &[Object]) {
        let (key, value) = match stack.len() {
            n if n >= 2 => (&stack[n - 2], &stack[n - 1]),
            _ => return,
        };
        let key = match key.as_name() {
            Some(k) => k,
            None => return,
        };
        match key {
            b"CMapName" => {
                if let Some(name) = value.as_name_str() {
                    self.name = Some(name.to_string());
                }
            }
            b"WMode" => {
                if let Some(w) = value.as_i64() {
                    self.wmode = w as u8;
                }
            }
            b"CIDSystemInfo" => {
                if let Some(dict) = value.as_dict() {
                    self.registry = dict
                        .get(b"Registry")
                        .and_then(|r| r.as_string())
                        .map(|r| String::from_utf8_lossy(r).into_owned());
                    self.ordering = dict
                        .get(b"Ordering")
                        .and_then(|o| o.as_string())
                        .map(|o| String::from_utf8_lossy(o).into_owned());
                    self.supplement = dict
                        .get(b"Supplement")
                        .and_then(|s| s.as_i64())
                        .unwrap_or(0);
                }
            }
            b"Registry" => {
                if let Some(r) = value.as_string() {
                    self.registry = Some(String::from_utf8_lossy(r).into_owned());
                }
            }
            b"Ordering" => {
                if let Some(o) = value.as_string() {
                    self.ordering = Some(String::from_utf8_lossy(o).into_owned());
                }
            }
            _ => {}
        }
    }

    fn next_section_item(lexer: &mut Lexer, end: &[u8]) -> Option<Object> {
        match lexer.next_token() {
            Ok(Some(ref t)) if t.is_keyword(end) => None,
            Ok(Some(Token::HexString(s))) => {
                Some(Object::String(s, crate::object::StringFormat::Hexadecimal))
            }
            Ok(Some(Token::Integer(i))) => Some(Object::Integer(i)),
            Ok(Some(Token::Name(n))) => Some(Object::Name(n)),
            Ok(Some(Token::ArrayOpen)) => lexer.parse_array(None).ok(),
            Ok(Some(_)) => Some(Object::Null),
            _ => None,
        }
    }

    fn parse_codespaces(&mut self, lexer: &mut Lexer) {
        loop {
            let lo = match Self::next_section_item(lexer, b"endcodespacerange") {
                Some(o) => o,
                None => break,
            };
            let hi = match Self::next_section_item(lexer, b"endcodespacerange") {
                Some(o) => o,
                None => break,
            };
            if let (Some(lo), Some(hi)) = (lo.as_string(), hi.as_string()) {
                if !lo.is_empty() && lo.len() == hi.len() && lo.len() <= 4 {
                    self.codespaces.push(Codespace {
                        n_bytes: lo.len() as u8,
                        low: be_value(lo),
                        high: be_value(hi),
                    });
                }
            }
        }
    }

    fn parse_cid_singles(&mut self, lexer: &mut Lexer) {
        loop {
            let code = match Self::next_section_item(lexer, b"endcidchar") {
                Some(o) => o,
                None => break,
            };
            let cid = match Self::next_section_item(lexer, b"endcidchar") {
                Some(o) => o,
                None => break,
            };
            if let (Some(code), Some(cid)) = (code.as_string(), cid.as_i64()) {
                self.cid_singles
                    .insert((code.len() as u8, be_value(code)), cid as u32);
            }
        }
    }

    fn parse_cid_ranges(&mut self, lexer: &mut Lexer) {
        loop {
            let lo = match Self::next_section_item(lexer, b"endcidrange") {
                Some(o) => o,
                None => break,
            };
            let hi = match Self::next_section_item(lexer, b"endcidrange") {
                Some(o) => o,
                None => break,
            };
            let cid = match Self::next_section_item(lexer, b"endcidrange") {
                Some(o) => o,
                None => break,
            };
            if let (Some(lo), Some(hi), Some(cid)) = (lo.as_string(), hi.as_string(), cid.as_i64())
            {
                if !lo.is_empty() && lo.len() == hi.len() {
                    self.cid_ranges
                        .push((lo.len() as u8, be_value(lo), be_value(hi), cid as u32));
                }
            }
        }
    }

    fn parse_bf_singles(&mut self, lexer: &mut Lexer) {
        loop {
            let code = match Self::next_section_item(lexer, b"endbfchar") {
                Some(o) => o,
                None => break,
            };
            let dst = match Self::next_section_item(lexer, b"endbfchar") {
                Some(o) => o,
                None => break,
            };
            let code_bytes = match code.as_string() {
                Some(c) if !c.is_empty() => c,
                _ => continue,
            };
            let text = match &dst {
                Object::String(bytes, _) => utf16_be_to_string(bytes),
                // a bfchar destination may be a glyph name
                Object::Name(name) => std::str::from_utf8(name)
                    .ok()
                    .and_then(crate::encoding::glyph_to_unicode),
                _ => None,
            };
            if let Some(text) = text {
                self.bf_singles
                    .insert((code_bytes.len() as u8, be_value(code_bytes)), text);
            }
        }
    }

    fn parse_bf_ranges(&mut self, lexer: &mut Lexer) {
        loop {
            let lo = match Self::next_section_item(lexer, b"endbfrange") {
                Some(o) => o,
                None => break,
            };
            let hi = match Self::next_section_item(lexer, b"endbfrange") {
                Some(o) => o,
                None => break,
            };
            let dst = match Self::next_section_item(lexer, b"endbfrange") {
                Some(o) => o,
                None => break,
            };
            let (lo, hi) = match (lo.as_string(), hi.as_string()) {
                (Some(l), Some(h)) if !l.is_empty() && l.len() == h.len() => (l, h),
                _ => continue,
            };
            let destination = match &dst {
                Object::String(bytes, _) => BfDestination::Increment(utf16_units(bytes)),
                Object::Array(items) => BfDestination::Array(
                    items
                        .iter()
                        .map(|item| {
                            item.as_string()
                                .and_then(utf16_be_to_string)
                                .unwrap_or_default()
                        })
                        .collect(),
                ),
                _ => continue,
            };
            self.bf_ranges
                .push((lo.len() as u8, be_value(lo), be_value(hi), destination));
        }
    }

    fn parse_notdef_singles(&mut self, lexer: &mut Lexer) {
        loop {
            let code = match Self::next_section_item(lexer, b"endnotdefchar") {
                Some(o) => o,
                None => break,
            };
            let cid = match Self::next_section_item(lexer, b"endnotdefchar") {
                Some(o) => o,
                None => break,
            };
            if let (Some(code), Some(cid)) = (code.as_string(), cid.as_i64()) {
                self.notdef_singles
                    .insert((code.len() as u8, be_value(code)), cid as u32);
            }
        }
    }

    fn parse_notdef_ranges(&mut self, lexer: &mut Lexer) {
        loop {
            let lo = match Self::next_section_item(lexer, b"endnotdefrange") {
                Some(o) => o,
                None => break,
            };
            let hi = match Self::next_section_item(lexer, b"endnotdefrange") {
                Some(o) => o,
                None => break,
            };
            let cid = match Self::next_section_item(lexer, b"endnotdefrange") {
                Some(o) => o,
                None => break,
            };
            if let (Some(lo), Some(hi), Some(cid)) = (lo.as_string(), hi.as_string(), cid.as_i64())
            {
                if !lo.is_empty() && lo.len() == hi.len() {
                    self.notdef_ranges
                        .push((lo.len() as u8, be_value(lo), be_value(hi), cid as u32));
                }
            }
        }
    }

    fn codespace_contains(&self, n_bytes: u8, code: u32) -> bool {
        self.codespaces
            .iter()
            .any(|cs| cs.n_bytes == n_bytes && (cs.low..=cs.high).contains(&code))
            || self
                .base
                .as_ref()
                .map(|b| b.codespace_contains(n_bytes, code))
                .unwrap_or(false)
    }

    fn has_codespaces(&self) -> bool {
        !self.codespaces.is_empty()
            || self.base.as_ref().map(|b| b.has_codespaces()).unwrap_or(false)
    }

    /// True when this CMap carries any code → Unicode mappings.
    pub fn has_unicode_mappings(&self) -> bool {
        !self.bf_singles.is_empty()
            || !self.bf_ranges.is_empty()
            || self
                .base
                .as_ref()
                .map(|b| b.has_unicode_mappings())
                .unwrap_or(false)
    }

    /// Longest codespace-valid prefix of `bytes`: `(code, bytes consumed)`.
    /// Falls back to single bytes (or the mapping tables when there are no
    /// codespaces, as in many ToUnicode CMaps in the wild).
    pub fn next_code(&self, bytes: &[u8]) -> (u32, u8) {
        debug_assert!(!bytes.is_empty());
        let max = bytes.len().min(4) as u8;
        let mut best: Option<(u32, u8)> = None;
        for n in 1..=max {
            let code = be_value(&bytes[..n as usize]);
            if self.codespace_contains(n, code) {
                best = Some((code, n));
            }
        }
        if let Some(hit) = best {
            return hit;
        }
        if !self.has_codespaces() {
            // no codespaces declared: prefer the longest prefix that has a
            // mapping, defaulting to 2-byte codes (the dominant case)
            for n in (1..=max).rev() {
                let code = be_value(&bytes[..n as usize]);
                if self.lookup_unicode(n, code).is_some() || self.lookup_cid(n, code).is_some() {
                    return (code, n);
                }
            }
            if max >= 2 {
                return (be_value(&bytes[..2]), 2);
            }
        }
        (bytes[0] as u32, 1)
    }

    /// Splits a whole string into `(code, length)` pairs.
    pub fn decode_codes(&self, bytes: &[u8]) -> Vec<(u32, u8)> {
        let mut out = Vec::new();
        let mut i = 0usize;
        while i < bytes.len() {
            let (code, n) = self.next_code(&bytes[i..]);
            out.push((code, n));
            i += n as usize;
        }
        out
    }

    pub fn lookup_cid(&self, n_bytes: u8, code: u32) -> Option<u32> {
        if let Some(cid) = self.cid_singles.get(&(n_bytes, code)) {
            return Some(*cid);
        }
        for (n, lo, hi, first) in &self.cid_ranges {
            if *n == n_bytes && (*lo..=*hi).contains(&code) {
                return Some(first + (code - lo));
            }
        }
        if let Some(base) = &self.base {
            return base.lookup_cid(n_bytes, code);
        }
        None
    }

    /// CID for unmapped codes, from the notdef sections.
    pub fn lookup_notdef(&self, n_bytes: u8, code: u32) -> Option<u32> {
        if let Some(cid) = self.notdef_singles.get(&(n_bytes, code)) {
            return Some(*cid);
        }
        for (n, lo, hi, cid) in &self.notdef_ranges {
            if *n == n_bytes && (*lo..=*hi).contains(&code) {
                return Some(*cid);
            }
        }
        self.base
            .as_ref()
            .and_then(|b| b.lookup_notdef(n_bytes, code))
    }

    pub fn lookup_unicode(&self, n_bytes: u8, code: u32) -> Option<String> {
        if let Some(text) = self.bf_singles.get(&(n_bytes, code)) {
            return Some(text.clone());
        }
        for (n, lo, hi, dst) in &self.bf_ranges {
            if *n != n_bytes || !(*lo..=*hi).contains(&code) {
                continue;
            }
            let offset = code - lo;
            match dst {
                BfDestination::Increment(units) => {
                    let mut units = units.clone();
                    if let Some(last) = units.last_mut() {
                        *last = last.wrapping_add(offset as u16);
                    }
                    return String::from_utf16(&units).ok();
                }
                BfDestination::Array(strings) => {
                    return strings.get(offset as usize).cloned();
                }
            }
        }
        self.base
            .as_ref()
            .and_then(|b| b.lookup_unicode(n_bytes, code))
    }

    /// Inverts the Unicode mappings for the editor's re-encode path:
    /// Unicode string → code bytes. Returns `None` when `text` starts with
    /// a character this CMap cannot produce.
    pub fn encode_unicode(&self, text: &str) -> Option<Vec<(u32, u8)>> {
        let mut remaining = text;
        let mut out = Vec::new();
        while !remaining.is_empty() {
            let (code, len, consumed) = self.find_code_for_prefix(remaining)?;
            out.push((code, len));
            remaining = &remaining[consumed..];
        }
        Some(out)
    }

    fn find_code_for_prefix(&self, text: &str) -> Option<(u32, u8, usize)> {
        // singles first (exact string match, longest destination wins)
        let mut best: Option<(u32, u8, usize)> = None;
        for ((n, code), dst) in &self.bf_singles {
            if !dst.is_empty() && text.starts_with(dst.as_str()) {
                let consumed = dst.len();
                if best.map(|(_, _, c)| consumed > c).unwrap_or(true) {
                    best = Some((*code, *n, consumed));
                }
            }
        }
        if best.is_some() {
            return best;
        }
        let first = text.chars().next()?;
        let mut units = [0u16; 2];
        let encoded = first.encode_utf16(&mut units);
        for (n, lo, hi, dst) in &self.bf_ranges {
            match dst {
                BfDestination::Increment(base_units) => {
                    // only single-unit bases invert cleanly
                    if base_units.len() == 1 && encoded.len() == 1 {
                        let base = base_units[0];
                        let unit = encoded[0];
                        if unit >= base {
                            let code = lo + (unit - base) as u32;
                            if code <= *hi {
                                return Some((code, *n, first.len_utf8()));
                            }
                        }
                    }
                }
                BfDestination::Array(strings) => {
                    for (i, s) in strings.iter().enumerate() {
                        if !s.is_empty() && text.starts_with(s.as_str()) {
                            return Some((lo + i as u32, *n, s.len()));
                        }
                    }
                }
            }
        }
        self.base.as_ref().and_then(|b| b.find_code_for_prefix(text))
    }

    /// Writes a code back into bytes (big-endian, `len` bytes).
    pub fn code_to_bytes(code: u32, len: u8) -> Vec<u8> {
        let be = code.to_be_bytes();
        be[4 - len as usize..].to_vec()
    }
}

fn be_value(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| acc << 8 | *b as u32)
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|c| {
            if c.len() == 2 {
                u16::from_be_bytes([c[0], c[1]])
            } else {
                c[0] as u16
            }
        })
        .collect()
}

fn utf16_be_to_string(bytes: &[u8]) -> Option<String> {
    String::from_utf16(&utf16_units(bytes)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TO_UNICODE: &[u8] = br#"
/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0041> <0041>
<0042> <00480069>
endbfchar
1 beginbfrange
<0100> <0102> [<0058> <0059> <005A>]
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end
"#;

    #[test]
    fn to_unicode_parsing() {
        let cmap = CMap::parse(TO_UNICODE).unwrap();
        assert_eq!(cmap.name.as_deref(), Some("Adobe-Identity-UCS"));
        assert_eq!(cmap.registry.as_deref(), Some("Adobe"));
        assert_eq!(cmap.lookup_unicode(2, 0x41).as_deref(), Some("A"));
        assert_eq!(cmap.lookup_unicode(2, 0x42).as_deref(), Some("Hi"));
        assert_eq!(cmap.lookup_unicode(2, 0x101).as_deref(), Some("Y"));
        assert_eq!(cmap.lookup_unicode(2, 0x103), None);
    }

    #[test]
    fn longest_codespace_match() {
        let data = br#"
begincmap
2 begincodespacerange
<41> <41>
<4100> <42FF>
endcodespacerange
2 beginbfchar
<41> <0061>
<4142> <0062>
endbfchar
endcmap
"#;
        let cmap = CMap::parse(data).unwrap();
        // 0x41 0x42 0x41: the 2-byte prefix 0x4142 is codespace-valid and
        // wins; the trailing 0x41 decodes as the 1-byte code.
        let codes = cmap.decode_codes(&[0x41, 0x42, 0x41]);
        assert_eq!(codes, vec![(0x4142, 2), (0x41, 1)]);
        assert_eq!(cmap.lookup_unicode(2, 0x4142).as_deref(), Some("b"));
        assert_eq!(cmap.lookup_unicode(1, 0x41).as_deref(), Some("a"));
    }

    #[test]
    fn surrogate_pair_destination() {
        let data = br#"
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
1 beginbfchar
<0001> <D83DDE00>
endbfchar
endcmap
"#;
        let cmap = CMap::parse(data).unwrap();
        let text = cmap.lookup_unicode(2, 1).unwrap();
        assert_eq!(text, "\u{1F600}");
        assert_eq!(text.len(), 4); // one four-byte UTF-8 sequence
    }

    #[test]
    fn identity_cmap() {
        let cmap = CMap::identity(0);
        assert_eq!(cmap.decode_codes(&[0x00, 0x41, 0x00, 0x42]), vec![(0x41, 2), (0x42, 2)]);
        assert_eq!(cmap.lookup_cid(2, 0x1234), Some(0x1234));
        assert_eq!(cmap.wmode, 0);
        assert_eq!(CMap::identity(1).wmode, 1);
    }

    #[test]
    fn cid_ranges_and_notdef() {
        let data = br#"
begincmap
1 begincodespacerange
<00> <FF>
endcodespacerange
1 begincidrange
<20> <7E> 1
endcidrange
1 beginnotdefrange
<00> <1F> 0
endnotdefrange
endcmap
"#;
        let cmap = CMap::parse(data).unwrap();
        assert_eq!(cmap.lookup_cid(1, 0x20), Some(1));
        assert_eq!(cmap.lookup_cid(1, 0x41), Some(0x22));
        assert_eq!(cmap.lookup_cid(1, 0x10), None);
        assert_eq!(cmap.lookup_notdef(1, 0x10), Some(0));
    }

    #[test]
    fn encode_inverts_decode() {
        let cmap = CMap::parse(TO_UNICODE).unwrap();
        let encoded = cmap.encode_unicode("A").unwrap();
        assert_eq!(encoded, vec![(0x41, 2)]);
        assert_eq!(CMap::code_to_bytes(0x41, 2), vec![0x00, 0x41]);
        assert!(cmap.encode_unicode("ξ").is_none());
    }

    #[test]
    fn wmode_definition() {
        let cmap = CMap::parse(b"/WMode 1 def begincmap endcmap").unwrap();
        assert_eq!(cmap.wmode, 1);
    }
}
