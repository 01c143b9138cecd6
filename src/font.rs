//! font.rs
//!
//! Font construction from `/Font` resource dictionaries and the text
//! decode/encode contract. Two shapes exist: simple fonts (one byte per
//! glyph, decoded through an encoding table) and composite Type0 fonts
//! (multi-byte codes through a CMap into a CIDFont). Glyph outlines are
//! the sink's business; the core only extracts the embedded font program
//! and the metrics it needs for text advance.

use std::collections::HashMap;

use crate::cmap::CMap;
use crate::document::PdfDocument;
use crate::encoding::{self, BaseEncoding};
use crate::error::Error;
use crate::matrix::Matrix;
use crate::object::{Dictionary, Object};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SimpleFontType {
    Type1,
    MMType1,
    TrueType,
    Type3,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CidFontType {
    CidFontType0,
    CidFontType2,
}

/// Single-byte encoding: a base table overlaid with a `Differences` array.
#[derive(Debug, Clone)]
pub struct SimpleEncoding {
    pub base: BaseEncoding,
    pub differences: HashMap<u8, String>,
}

impl SimpleEncoding {
    pub fn decode(&self, code: u8) -> Option<String> {
        if let Some(name) = self.differences.get(&code) {
            return encoding::glyph_to_unicode(name);
        }
        encoding::decode_byte(self.base, code)
            .map(encoding::fold_symbol_pua)
            .map(String::from)
    }

    pub fn encode(&self, c: char) -> Option<u8> {
        for (code, name) in &self.differences {
            if encoding::glyph_to_unicode(name).as_deref() == Some(c.to_string().as_str()) {
                return Some(*code);
            }
        }
        encoding::encode_char(self.base, c)
    }
}

/// `/CIDToGIDMap`: either the identity or a two-byte-per-CID lookup stream.
#[derive(Debug, Clone)]
pub enum CidToGid {
    Identity,
    Map(Vec<u8>),
}

impl CidToGid {
    pub fn gid(&self, cid: u32) -> u32 {
        match self {
            CidToGid::Identity => cid,
            CidToGid::Map(bytes) => {
                let i = cid as usize * 2;
                if i + 1 < bytes.len() {
                    u16::from_be_bytes([bytes[i], bytes[i + 1]]) as u32
                } else {
                    0
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CidFont {
    pub subtype: CidFontType,
    pub base_font: String,
    pub registry: String,
    pub ordering: String,
    pub supplement: i64,
    /// `/DW`, glyph-space units.
    pub default_width: f32,
    widths: HashMap<u32, f32>,
    /// `/DW2`: (vertical origin y, displacement y).
    pub default_vertical: (f32, f32),
    vertical: HashMap<u32, (f32, f32, f32)>,
    pub cid_to_gid: CidToGid,
}

impl CidFont {
    pub fn width(&self, cid: u32) -> f32 {
        self.widths.get(&cid).copied().unwrap_or(self.default_width)
    }

    /// `(w1y, vx, vy)` for vertical writing.
    pub fn vertical_metrics(&self, cid: u32) -> (f32, f32, f32) {
        if let Some(m) = self.vertical.get(&cid) {
            return *m;
        }
        let (origin_y, disp_y) = self.default_vertical;
        (disp_y, self.width(cid) / 2.0, origin_y)
    }
}

/// An embedded font program, segmented but not parsed.
#[derive(Debug, Clone)]
pub enum EmbeddedFontData {
    /// PFB segments: cleartext, encrypted, fixed trailer.
    Type1 {
        data: Vec<u8>,
        length1: usize,
        length2: usize,
        length3: usize,
    },
    TrueType { data: Vec<u8>, length1: usize },
    Type1C(Vec<u8>),
    CidType0C(Vec<u8>),
    OpenType(Vec<u8>),
}

impl EmbeddedFontData {
    pub fn bytes(&self) -> &[u8] {
        match self {
            EmbeddedFontData::Type1 { data, .. } => data,
            EmbeddedFontData::TrueType { data, .. } => data,
            EmbeddedFontData::Type1C(d) | EmbeddedFontData::CidType0C(d)
            | EmbeddedFontData::OpenType(d) => d,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FontKind {
    Simple {
        subtype: SimpleFontType,
        encoding: SimpleEncoding,
        first_char: u32,
        /// Glyph-space units (per mille of text space for non-Type3 fonts).
        widths: Vec<f32>,
    },
    Composite {
        encoding: CMap,
        cid_font: CidFont,
        /// CID → Unicode, from the CIDSystemInfo's UCS-2 chain.
        cid_to_unicode: Option<CMap>,
    },
}

/// One decoded glyph of a shown string.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGlyph {
    /// The character code as it appeared in the string.
    pub code: u32,
    pub code_len: u8,
    /// CID for composite fonts, the code itself for simple fonts.
    pub cid: u32,
    pub unicode: String,
    /// Advance in text space for a font size of 1.0.
    pub width: f32,
    /// True when word spacing applies (single-byte code 32).
    pub is_space: bool,
}

#[derive(Debug, Clone)]
pub struct PdfFont {
    pub base_font: String,
    pub kind: FontKind,
    pub to_unicode: Option<CMap>,
    pub embedded: Option<EmbeddedFontData>,
    pub missing_width: f32,
    /// Type3 only; scales glyph space to text space instead of /1000.
    pub font_matrix: Option<Matrix>,
}

impl PdfFont {
    pub fn is_vertical(&self) -> bool {
        match &self.kind {
            FontKind::Composite { encoding, .. } => encoding.wmode == 1,
            _ => false,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, FontKind::Composite { .. })
    }

    /// Glyph-space units → text space (per font size 1.0).
    fn scale_width(&self, w: f32) -> f32 {
        match self.font_matrix {
            Some(m) => w * m.a,
            None => w / 1000.0,
        }
    }

    fn simple_width_units(&self, code: u8) -> f32 {
        if let FontKind::Simple {
            first_char, widths, ..
        } = &self.kind
        {
            let idx = (code as u32).wrapping_sub(*first_char) as usize;
            if let Some(w) = widths.get(idx) {
                if *w > 0.0 {
                    return *w;
                }
            }
        }
        self.missing_width
    }

    /// Splits a shown string into glyphs with unicode and advance.
    pub fn decode_runs(&self, bytes: &[u8]) -> Vec<DecodedGlyph> {
        match &self.kind {
            FontKind::Simple { encoding, .. } => bytes
                .iter()
                .map(|&code| {
                    let unicode = self.simple_unicode(encoding, code);
                    DecodedGlyph {
                        code: code as u32,
                        code_len: 1,
                        cid: code as u32,
                        unicode,
                        width: self.scale_width(self.simple_width_units(code)),
                        is_space: code == b' ',
                    }
                })
                .collect(),
            FontKind::Composite {
                encoding,
                cid_font,
                cid_to_unicode,
            } => encoding
                .decode_codes(bytes)
                .into_iter()
                .map(|(code, len)| {
                    let cid = encoding
                        .lookup_cid(len, code)
                        .or_else(|| encoding.lookup_notdef(len, code))
                        .unwrap_or(0);
                    let unicode = self.composite_unicode(code, len, cid, cid_to_unicode.as_ref());
                    DecodedGlyph {
                        code,
                        code_len: len,
                        cid,
                        unicode,
                        width: self.scale_width(cid_font.width(cid)),
                        is_space: len == 1 && code == 32,
                    }
                })
                .collect(),
        }
    }

    fn simple_unicode(&self, encoding: &SimpleEncoding, code: u8) -> String {
        if let Some(tu) = &self.to_unicode {
            if let Some(text) = tu.lookup_unicode(1, code as u32) {
                return text;
            }
        }
        encoding.decode(code).unwrap_or_default()
    }

    fn composite_unicode(
        &self,
        code: u32,
        len: u8,
        cid: u32,
        cid_to_unicode: Option<&CMap>,
    ) -> String {
        if let Some(tu) = &self.to_unicode {
            if let Some(text) = tu.lookup_unicode(len, code) {
                return text;
            }
        }
        if let Some(c2u) = cid_to_unicode {
            if let Some(text) = c2u.lookup_unicode(2, cid) {
                return text;
            }
        }
        // Identity orderings: read the CID as a code point
        char::from_u32(cid).map(String::from).unwrap_or_default()
    }

    /// The whole string as Unicode, honouring ToUnicode's longest-prefix
    /// rule across 1- and 2-byte codes.
    pub fn decode_text(&self, bytes: &[u8]) -> String {
        match &self.kind {
            FontKind::Simple { encoding, .. } => {
                if let Some(tu) = &self.to_unicode {
                    let mut out = String::new();
                    for (code, len) in tu.decode_codes(bytes) {
                        match tu.lookup_unicode(len, code) {
                            Some(text) => out.push_str(&text),
                            None if len == 1 => {
                                out.push_str(&encoding.decode(code as u8).unwrap_or_default())
                            }
                            None => {
                                // unmapped multi-byte code: fall back per byte
                                for b in CMap::code_to_bytes(code, len) {
                                    out.push_str(&encoding.decode(b).unwrap_or_default());
                                }
                            }
                        }
                    }
                    out
                } else {
                    bytes
                        .iter()
                        .map(|&b| encoding.decode(b).unwrap_or_default())
                        .collect()
                }
            }
            FontKind::Composite { .. } => self
                .decode_runs(bytes)
                .into_iter()
                .map(|g| g.unicode)
                .collect(),
        }
    }

    /// Inverts the decode contract. `None` means some character cannot be
    /// produced by this font's encoding; the editor then leaves the
    /// original bytes in place.
    pub fn encode_text(&self, text: &str) -> Option<Vec<u8>> {
        if let Some(tu) = &self.to_unicode {
            if let Some(codes) = tu.encode_unicode(text) {
                let mut out = Vec::new();
                for (code, len) in codes {
                    out.extend_from_slice(&CMap::code_to_bytes(code, len));
                }
                return Some(out);
            }
        }
        match &self.kind {
            FontKind::Simple { encoding, .. } => {
                let mut out = Vec::with_capacity(text.len());
                for c in text.chars() {
                    out.push(encoding.encode(c)?);
                }
                Some(out)
            }
            FontKind::Composite { encoding, .. } => {
                // Only identity-style encodings invert without a ToUnicode.
                if encoding.ordering.as_deref() == Some("Identity")
                    || encoding.name.as_deref().map(|n| n.starts_with("Identity")) == Some(true)
                {
                    let mut out = Vec::new();
                    for c in text.chars() {
                        let v = u32::from(c);
                        if v > 0xFFFF {
                            return None;
                        }
                        out.extend_from_slice(&(v as u16).to_be_bytes());
                    }
                    Some(out)
                } else {
                    None
                }
            }
        }
    }

    /// Builds a font from its resource dictionary.
    pub fn from_dict(doc: &PdfDocument, dict: &Dictionary) -> Result<PdfFont, Error> {
        let subtype = doc
            .resolve_dict_value(dict, b"Subtype")
            .and_then(|s| s.as_name().map(|n| n.to_vec()))
            .unwrap_or_default();
        let base_font = doc
            .resolve_dict_value(dict, b"BaseFont")
            .and_then(|b| b.as_name_str().map(String::from))
            .unwrap_or_default();

        let to_unicode = doc
            .resolve_dict_value(dict, b"ToUnicode")
            .and_then(|o| o.as_stream().and_then(|s| s.decoded_content().ok().map(<[u8]>::to_vec)))
            .and_then(|data| CMap::parse(&data).ok())
            .filter(|c| c.has_unicode_mappings());

        match subtype.as_slice() {
            b"Type0" => Self::composite_from_dict(doc, dict, base_font, to_unicode),
            _ => Self::simple_from_dict(doc, dict, subtype, base_font, to_unicode),
        }
    }

    fn simple_from_dict(
        doc: &PdfDocument,
        dict: &Dictionary,
        subtype: Vec<u8>,
        base_font: String,
        to_unicode: Option<CMap>,
    ) -> Result<PdfFont, Error> {
        let subtype = match subtype.as_slice() {
            b"MMType1" => SimpleFontType::MMType1,
            b"TrueType" => SimpleFontType::TrueType,
            b"Type3" => SimpleFontType::Type3,
            _ => SimpleFontType::Type1,
        };

        let encoding = Self::parse_simple_encoding(doc, dict, &base_font);

        let first_char = doc
            .resolve_dict_value(dict, b"FirstChar")
            .and_then(|f| f.as_i64())
            .unwrap_or(0) as u32;
        let widths: Vec<f32> = doc
            .resolve_dict_value(dict, b"Widths")
            .and_then(|w| w.as_array().cloned())
            .map(|arr| {
                arr.iter()
                    .map(|w| {
                        doc.resolve(w)
                            .ok()
                            .and_then(|w| w.as_f32())
                            .unwrap_or(0.0)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let descriptor = doc
            .resolve_dict_value(dict, b"FontDescriptor")
            .and_then(|d| d.as_dict().cloned());
        let missing_width = descriptor
            .as_ref()
            .and_then(|d| doc.resolve_dict_value(d, b"MissingWidth"))
            .and_then(|m| m.as_f32())
            .unwrap_or(0.0);
        let embedded = descriptor
            .as_ref()
            .and_then(|d| Self::embedded_from_descriptor(doc, d));

        let font_matrix = (subtype == SimpleFontType::Type3)
            .then(|| {
                doc.resolve_dict_value(dict, b"FontMatrix")
                    .as_deref()
                    .and_then(matrix_from_object)
            })
            .flatten()
            .or(if subtype == SimpleFontType::Type3 {
                Some(Matrix::new(0.001, 0.0, 0.0, 0.001, 0.0, 0.0))
            } else {
                None
            });

        Ok(PdfFont {
            base_font,
            kind: FontKind::Simple {
                subtype,
                encoding,
                first_char,
                widths,
            },
            to_unicode,
            embedded,
            missing_width,
            font_matrix,
        })
    }

    fn parse_simple_encoding(
        doc: &PdfDocument,
        dict: &Dictionary,
        base_font: &str,
    ) -> SimpleEncoding {
        let default_base = default_base_encoding(base_font);
        let encoding_obj = doc.resolve_dict_value(dict, b"Encoding");
        let mut base = default_base;
        let mut differences = HashMap::new();
        match encoding_obj.as_deref() {
            Some(Object::Name(name)) => {
                if let Some(b) = BaseEncoding::from_name(name) {
                    base = b;
                }
            }
            Some(Object::Dictionary(enc)) => {
                if let Some(b) = enc
                    .get(b"BaseEncoding")
                    .and_then(|b| b.as_name())
                    .and_then(BaseEncoding::from_name)
                {
                    base = b;
                }
                if let Some(diffs) = doc
                    .resolve_dict_value(enc, b"Differences")
                    .and_then(|d| d.as_array().cloned())
                {
                    let mut code = 0u32;
                    for item in &diffs {
                        match item {
                            Object::Integer(i) => code = *i as u32,
                            Object::Name(n) => {
                                if code <= 0xFF {
                                    differences.insert(
                                        code as u8,
                                        String::from_utf8_lossy(n).into_owned(),
                                    );
                                }
                                code = code.wrapping_add(1);
                            }
                            _ => {}
                        }
                    }
                }
            }
            _ => {}
        }
        SimpleEncoding { base, differences }
    }

    fn composite_from_dict(
        doc: &PdfDocument,
        dict: &Dictionary,
        base_font: String,
        to_unicode: Option<CMap>,
    ) -> Result<PdfFont, Error> {
        let encoding = match doc.resolve_dict_value(dict, b"Encoding").as_deref() {
            Some(Object::Name(name)) => {
                let name = String::from_utf8_lossy(name).into_owned();
                CMap::predefined(&name).unwrap_or_else(|| {
                    log::warn!("unknown Type0 encoding {name}, using Identity-H");
                    CMap::identity(0)
                })
            }
            Some(Object::Stream(stream)) => stream
                .decoded_content()
                .ok()
                .and_then(|data| CMap::parse(data).ok())
                .unwrap_or_else(|| {
                    log::warn!("unreadable embedded encoding CMap, using Identity-H");
                    CMap::identity(0)
                }),
            _ => CMap::identity(0),
        };

        let descendant = doc
            .resolve_dict_value(dict, b"DescendantFonts")
            .and_then(|d| d.as_array().cloned())
            .and_then(|arr| arr.first().and_then(|f| doc.resolve(f).ok()))
            .and_then(|f| f.as_dict().cloned())
            .ok_or_else(|| {
                Error::MalformedSyntax("Type0 font without a descendant CIDFont".into())
            })?;

        let cid_font = Self::parse_cid_font(doc, &descendant)?;

        // text extraction chain for non-Identity orderings
        let cid_to_unicode = if cid_font.ordering != "Identity" {
            Some(CMap::ucs2_chain())
        } else {
            None
        };

        let descriptor = doc
            .resolve_dict_value(&descendant, b"FontDescriptor")
            .and_then(|d| d.as_dict().cloned());
        let embedded = descriptor
            .as_ref()
            .and_then(|d| Self::embedded_from_descriptor(doc, d));
        let missing_width = descriptor
            .as_ref()
            .and_then(|d| doc.resolve_dict_value(d, b"MissingWidth"))
            .and_then(|m| m.as_f32())
            .unwrap_or(0.0);

        Ok(PdfFont {
            base_font,
            kind: FontKind::Composite {
                encoding,
                cid_font,
                cid_to_unicode,
            },
            to_unicode,
            embedded,
            missing_width,
            font_matrix: None,
        })
    }

    fn parse_cid_font(doc: &PdfDocument, dict: &Dictionary) -> Result<CidFont, Error> {
        let subtype = match doc
            .resolve_dict_value(dict, b"Subtype")
            .and_then(|s| s.as_name().map(|n| n.to_vec()))
            .as_deref()
        {
            Some(b"CIDFontType2") => CidFontType::CidFontType2,
            _ => CidFontType::CidFontType0,
        };
        let base_font = doc
            .resolve_dict_value(dict, b"BaseFont")
            .and_then(|b| b.as_name_str().map(String::from))
            .unwrap_or_default();

        let (registry, ordering, supplement) = doc
            .resolve_dict_value(dict, b"CIDSystemInfo")
            .and_then(|i| i.as_dict().cloned())
            .map(|info| {
                let registry = doc
                    .resolve_dict_value(&info, b"Registry")
                    .and_then(|r| r.as_string().map(|r| String::from_utf8_lossy(r).into_owned()))
                    .unwrap_or_else(|| "Adobe".into());
                let ordering = doc
                    .resolve_dict_value(&info, b"Ordering")
                    .and_then(|o| o.as_string().map(|o| String::from_utf8_lossy(o).into_owned()))
                    .unwrap_or_else(|| "Identity".into());
                let supplement = doc
                    .resolve_dict_value(&info, b"Supplement")
                    .and_then(|s| s.as_i64())
                    .unwrap_or(0);
                (registry, ordering, supplement)
            })
            .unwrap_or_else(|| ("Adobe".into(), "Identity".into(), 0));

        let default_width = doc
            .resolve_dict_value(dict, b"DW")
            .and_then(|w| w.as_f32())
            .unwrap_or(1000.0);
        let widths = Self::parse_w_array(doc, dict, b"W");

        let default_vertical = doc
            .resolve_dict_value(dict, b"DW2")
            .and_then(|w| w.as_array().cloned())
            .and_then(|arr| {
                Some((
                    arr.first().and_then(|v| v.as_f32())?,
                    arr.get(1).and_then(|v| v.as_f32())?,
                ))
            })
            .unwrap_or((880.0, -1000.0));
        let vertical = Self::parse_w2_array(doc, dict);

        let cid_to_gid = match doc.resolve_dict_value(dict, b"CIDToGIDMap").as_deref() {
            Some(Object::Name(n)) if n == b"Identity" => CidToGid::Identity,
            Some(Object::Stream(stream)) => match stream.decoded_content() {
                Ok(bytes) => CidToGid::Map(bytes.to_vec()),
                Err(e) => {
                    log::warn!("unreadable CIDToGIDMap stream ({e}), treating as Identity");
                    CidToGid::Identity
                }
            },
            Some(_) => {
                log::warn!("CIDToGIDMap reference is unreadable, treating as Identity");
                CidToGid::Identity
            }
            None => CidToGid::Identity,
        };

        Ok(CidFont {
            subtype,
            base_font,
            registry,
            ordering,
            supplement,
            default_width,
            widths,
            default_vertical,
            vertical,
            cid_to_gid,
        })
    }

    /// `/W`: both `c [w1 w2 …]` and `cFirst cLast w` forms.
    fn parse_w_array(doc: &PdfDocument, dict: &Dictionary, key: &[u8]) -> HashMap<u32, f32> {
        let mut widths = HashMap::new();
        let arr = match doc
            .resolve_dict_value(dict, key)
            .and_then(|w| w.as_array().cloned())
        {
            Some(a) => a,
            None => return widths,
        };
        let mut i = 0usize;
        while i < arr.len() {
            let first = match doc.resolve(&arr[i]).ok().and_then(|v| v.as_i64()) {
                Some(v) if v >= 0 => v as u32,
                _ => break,
            };
            match arr.get(i + 1).and_then(|v| doc.resolve(v).ok()) {
                Some(next) => {
                    if let Some(list) = next.as_array() {
                        for (k, w) in list.iter().enumerate() {
                            if let Some(w) = doc.resolve(w).ok().and_then(|w| w.as_f32()) {
                                widths.insert(first + k as u32, w);
                            }
                        }
                        i += 2;
                    } else if let Some(last) = next.as_i64() {
                        let w = arr
                            .get(i + 2)
                            .and_then(|w| doc.resolve(w).ok())
                            .and_then(|w| w.as_f32())
                            .unwrap_or(0.0);
                        for cid in first..=(last.max(0) as u32) {
                            widths.insert(cid, w);
                        }
                        i += 3;
                    } else {
                        break;
                    }
                }
                None => break,
            }
        }
        widths
    }

    /// `/W2`: `c [w1y vx vy …]` and `cFirst cLast w1y vx vy` forms.
    fn parse_w2_array(doc: &PdfDocument, dict: &Dictionary) -> HashMap<u32, (f32, f32, f32)> {
        let mut metrics = HashMap::new();
        let arr = match doc
            .resolve_dict_value(dict, b"W2")
            .and_then(|w| w.as_array().cloned())
        {
            Some(a) => a,
            None => return metrics,
        };
        let mut i = 0usize;
        while i < arr.len() {
            let first = match doc.resolve(&arr[i]).ok().and_then(|v| v.as_i64()) {
                Some(v) if v >= 0 => v as u32,
                _ => break,
            };
            match arr.get(i + 1).and_then(|v| doc.resolve(v).ok()) {
                Some(next) => {
                    if let Some(list) = next.as_array() {
                        for (k, chunk) in list.chunks(3).enumerate() {
                            if let (Some(w1y), Some(vx), Some(vy)) = (
                                chunk.first().and_then(|v| v.as_f32()),
                                chunk.get(1).and_then(|v| v.as_f32()),
                                chunk.get(2).and_then(|v| v.as_f32()),
                            ) {
                                metrics.insert(first + k as u32, (w1y, vx, vy));
                            }
                        }
                        i += 2;
                    } else if let Some(last) = next.as_i64() {
                        let w1y = arr.get(i + 2).and_then(|v| v.as_f32()).unwrap_or(0.0);
                        let vx = arr.get(i + 3).and_then(|v| v.as_f32()).unwrap_or(0.0);
                        let vy = arr.get(i + 4).and_then(|v| v.as_f32()).unwrap_or(0.0);
                        for cid in first..=(last.max(0) as u32) {
                            metrics.insert(cid, (w1y, vx, vy));
                        }
                        i += 5;
                    } else {
                        break;
                    }
                }
                None => break,
            }
        }
        metrics
    }

    fn embedded_from_descriptor(
        doc: &PdfDocument,
        descriptor: &Dictionary,
    ) -> Option<EmbeddedFontData> {
        if let Some(obj) = doc.resolve_dict_value(descriptor, b"FontFile") {
            let stream = obj.as_stream()?;
            let data = stream.decoded_content().ok()?.to_vec();
            let get = |key: &[u8]| -> usize {
                stream
                    .dict
                    .get(key)
                    .and_then(|v| doc.resolve(v).ok())
                    .and_then(|v| v.as_i64())
                    .unwrap_or(0) as usize
            };
            return Some(EmbeddedFontData::Type1 {
                length1: get(b"Length1"),
                length2: get(b"Length2"),
                length3: get(b"Length3"),
                data,
            });
        }
        if let Some(obj) = doc.resolve_dict_value(descriptor, b"FontFile2") {
            let stream = obj.as_stream()?;
            let data = stream.decoded_content().ok()?.to_vec();
            let length1 = stream
                .dict
                .get(b"Length1")
                .and_then(|v| doc.resolve(v).ok())
                .and_then(|v| v.as_i64())
                .unwrap_or(data.len() as i64) as usize;
            return Some(EmbeddedFontData::TrueType { data, length1 });
        }
        if let Some(obj) = doc.resolve_dict_value(descriptor, b"FontFile3") {
            let stream = obj.as_stream()?;
            let data = stream.decoded_content().ok()?.to_vec();
            return Some(
                match stream.dict.get(b"Subtype").and_then(|s| s.as_name()) {
                    Some(b"CIDFontType0C") => EmbeddedFontData::CidType0C(data),
                    Some(b"OpenType") => EmbeddedFontData::OpenType(data),
                    _ => EmbeddedFontData::Type1C(data),
                },
            );
        }
        None
    }
}

/// Fonts that imply an encoding when `/Encoding` is absent.
fn default_base_encoding(base_font: &str) -> BaseEncoding {
    // strip an ABCDEF+ subset prefix
    let name = base_font
        .split_once('+')
        .map(|(prefix, rest)| if prefix.len() == 6 { rest } else { base_font })
        .unwrap_or(base_font);
    if name.starts_with("Symbol") {
        return BaseEncoding::Symbol;
    }
    if name.starts_with("ZapfDingbats") || name.starts_with("Dingbats") {
        return BaseEncoding::ZapfDingbats;
    }
    // TeX Computer Modern math faces carry symbol-like layouts
    if name.starts_with("CMMI") || name.starts_with("CMSY") || name.starts_with("CMEX") {
        return BaseEncoding::Symbol;
    }
    if name.starts_with("CMR") {
        return BaseEncoding::Standard;
    }
    BaseEncoding::Standard
}

fn matrix_from_object(obj: &Object) -> Option<Matrix> {
    let arr = obj.as_array()?;
    if arr.len() != 6 {
        return None;
    }
    let mut m = [0f32; 6];
    for (slot, item) in m.iter_mut().zip(arr) {
        *slot = item.as_f32()?;
    }
    Some(Matrix::from_array(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winansi_font(widths: Vec<f32>, first_char: u32) -> PdfFont {
        PdfFont {
            base_font: "Helvetica".into(),
            kind: FontKind::Simple {
                subtype: SimpleFontType::Type1,
                encoding: SimpleEncoding {
                    base: BaseEncoding::WinAnsi,
                    differences: HashMap::new(),
                },
                first_char,
                widths,
            },
            to_unicode: None,
            embedded: None,
            missing_width: 500.0,
            font_matrix: None,
        }
    }

    #[test]
    fn simple_decode_encode_roundtrip() {
        let font = winansi_font(vec![], 0);
        assert_eq!(font.decode_text(b"Hello"), "Hello");
        assert_eq!(font.encode_text("Hello").unwrap(), b"Hello");
        assert_eq!(font.decode_text(&[0x80]), "\u{20AC}");
        assert_eq!(font.encode_text("€").unwrap(), vec![0x80]);
        // WinAnsi cannot express kanji
        assert!(font.encode_text("日").is_none());
    }

    #[test]
    fn simple_widths() {
        let font = winansi_font(vec![100.0, 200.0, 300.0], 65);
        let runs = font.decode_runs(b"ABCD");
        let widths: Vec<f32> = runs.iter().map(|g| g.width).collect();
        assert_eq!(widths, vec![0.1, 0.2, 0.3, 0.5]); // D falls back to MissingWidth
    }

    #[test]
    fn composite_identity_decoding() {
        let font = PdfFont {
            base_font: "Test".into(),
            kind: FontKind::Composite {
                encoding: CMap::identity(0),
                cid_font: CidFont {
                    subtype: CidFontType::CidFontType2,
                    base_font: "Test".into(),
                    registry: "Adobe".into(),
                    ordering: "Identity".into(),
                    supplement: 0,
                    default_width: 1000.0,
                    widths: HashMap::from([(0x41, 600.0)]),
                    default_vertical: (880.0, -1000.0),
                    vertical: HashMap::new(),
                    cid_to_gid: CidToGid::Identity,
                },
                cid_to_unicode: None,
            },
            to_unicode: None,
            embedded: None,
            missing_width: 0.0,
            font_matrix: None,
        };
        let runs = font.decode_runs(&[0x00, 0x41, 0x00, 0x42]);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].unicode, "A");
        assert_eq!(runs[0].width, 0.6);
        assert_eq!(runs[1].width, 1.0);
        assert_eq!(font.encode_text("AB").unwrap(), vec![0, 0x41, 0, 0x42]);
    }

    #[test]
    fn differences_override_base() {
        let mut differences = HashMap::new();
        differences.insert(65u8, "pi".to_string());
        let font = PdfFont {
            base_font: "Custom".into(),
            kind: FontKind::Simple {
                subtype: SimpleFontType::Type1,
                encoding: SimpleEncoding {
                    base: BaseEncoding::WinAnsi,
                    differences,
                },
                first_char: 0,
                widths: vec![],
            },
            to_unicode: None,
            embedded: None,
            missing_width: 0.0,
            font_matrix: None,
        };
        assert_eq!(font.decode_text(b"A"), "\u{03C0}");
    }

    #[test]
    fn cid_to_gid_map() {
        let map = CidToGid::Map(vec![0x00, 0x05, 0x00, 0x09]);
        assert_eq!(map.gid(0), 5);
        assert_eq!(map.gid(1), 9);
        assert_eq!(map.gid(2), 0);
        assert_eq!(CidToGid::Identity.gid(42), 42);
    }

    #[test]
    fn default_encodings_by_base_font() {
        assert_eq!(default_base_encoding("Symbol"), BaseEncoding::Symbol);
        assert_eq!(default_base_encoding("ABCDEF+Symbol"), BaseEncoding::Symbol);
        assert_eq!(
            default_base_encoding("ZapfDingbats"),
            BaseEncoding::ZapfDingbats
        );
        assert_eq!(default_base_encoding("CMMI10"), BaseEncoding::Symbol);
        assert_eq!(default_base_encoding("Helvetica"), BaseEncoding::Standard);
    }
}
