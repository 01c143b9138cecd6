//! encoding.rs
//!
//! Single-byte encodings (PDF 32000-1:2008 Annex D), the glyph-name to
//! Unicode list, and the Symbol private-use-area fold. Simple fonts decode
//! through these tables; composite fonts go through `cmap` instead.
//!
//! Table layout: the Latin encodings share ASCII for `0x20..=0x7E` and list
//! only their deviations; Symbol, ZapfDingbats and MacExpert are fully
//! custom and listed in full. All pair lists are sorted by code for binary
//! search.

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BaseEncoding {
    Standard,
    WinAnsi,
    MacRoman,
    MacExpert,
    PdfDoc,
    Symbol,
    ZapfDingbats,
}

impl BaseEncoding {
    pub fn from_name(name: &[u8]) -> Option<BaseEncoding> {
        match name {
            b"StandardEncoding" => Some(BaseEncoding::Standard),
            b"WinAnsiEncoding" => Some(BaseEncoding::WinAnsi),
            b"MacRomanEncoding" => Some(BaseEncoding::MacRoman),
            b"MacExpertEncoding" => Some(BaseEncoding::MacExpert),
            b"PDFDocEncoding" => Some(BaseEncoding::PdfDoc),
            b"Symbol" => Some(BaseEncoding::Symbol),
            b"ZapfDingbats" => Some(BaseEncoding::ZapfDingbats),
            _ => None,
        }
    }
}

/// Decodes a single code through an encoding table.
pub fn decode_byte(encoding: BaseEncoding, code: u8) -> Option<char> {
    let c = match encoding {
        BaseEncoding::Standard => latin_lookup(code, STANDARD_OVERRIDES, STANDARD_HIGH, false),
        BaseEncoding::WinAnsi => latin_lookup(code, &[], WIN_ANSI_HIGH, true),
        BaseEncoding::MacRoman => latin_lookup(code, &[], MAC_ROMAN_HIGH, false),
        BaseEncoding::PdfDoc => latin_lookup(code, PDF_DOC_LOW, PDF_DOC_HIGH, true),
        BaseEncoding::MacExpert => table_lookup(MAC_EXPERT, code),
        BaseEncoding::Symbol => table_lookup(SYMBOL, code),
        BaseEncoding::ZapfDingbats => table_lookup(ZAPF_DINGBATS, code),
    }?;
    char::from_u32(c as u32)
}

/// Inverse of [`decode_byte`]; linear, the tables are tiny.
pub fn encode_char(encoding: BaseEncoding, c: char) -> Option<u8> {
    let target = u32::from(c);
    if target > 0xFFFF {
        return None;
    }
    let target = target as u16;
    for code in 0x20..=0xFFu16 {
        if let Some(found) = decode_byte(encoding, code as u8) {
            if u32::from(found) == u32::from(target) {
                return Some(code as u8);
            }
        }
    }
    None
}

/// Symbolic TrueType fonts expose their glyphs at U+F000–U+F0FF; fold those
/// into the Symbol characters once, at decode time.
pub fn fold_symbol_pua(c: char) -> char {
    let v = u32::from(c);
    if (0xF000..=0xF0FF).contains(&v) {
        if let Some(mapped) = table_lookup(SYMBOL, (v - 0xF000) as u8) {
            if let Some(ch) = char::from_u32(mapped as u32) {
                return ch;
            }
        }
    }
    c
}

fn latin_lookup(code: u8, low: &[(u8, u16)], high: &[(u8, u16)], latin1_high: bool) -> Option<u16> {
    if (0x20..=0x7E).contains(&code) {
        if let Ok(i) = low.binary_search_by_key(&code, |(c, _)| *c) {
            return Some(low[i].1);
        }
        return Some(code as u16);
    }
    if let Ok(i) = low.binary_search_by_key(&code, |(c, _)| *c) {
        return Some(low[i].1);
    }
    if let Ok(i) = high.binary_search_by_key(&code, |(c, _)| *c) {
        return Some(high[i].1);
    }
    if latin1_high && code >= 0xA0 {
        return Some(code as u16);
    }
    None
}

fn table_lookup(table: &[(u8, u16)], code: u8) -> Option<u16> {
    table
        .binary_search_by_key(&code, |(c, _)| *c)
        .ok()
        .map(|i| table[i].1)
}

/// StandardEncoding deviations inside ASCII.
const STANDARD_OVERRIDES: &[(u8, u16)] = &[(0x27, 0x2019), (0x60, 0x2018)];

/// StandardEncoding upper half.
const STANDARD_HIGH: &[(u8, u16)] = &[
    (0xA1, 0x00A1),
    (0xA2, 0x00A2),
    (0xA3, 0x00A3),
    (0xA4, 0x2044),
    (0xA5, 0x00A5),
    (0xA6, 0x0192),
    (0xA7, 0x00A7),
    (0xA8, 0x00A4),
    (0xA9, 0x0027),
    (0xAA, 0x201C),
    (0xAB, 0x00AB),
    (0xAC, 0x2039),
    (0xAD, 0x203A),
    (0xAE, 0xFB01),
    (0xAF, 0xFB02),
    (0xB1, 0x2013),
    (0xB2, 0x2020),
    (0xB3, 0x2021),
    (0xB4, 0x00B7),
    (0xB6, 0x00B6),
    (0xB7, 0x2022),
    (0xB8, 0x201A),
    (0xB9, 0x201E),
    (0xBA, 0x201D),
    (0xBB, 0x00BB),
    (0xBC, 0x2026),
    (0xBD, 0x2030),
    (0xBF, 0x00BF),
    (0xC1, 0x0060),
    (0xC2, 0x00B4),
    (0xC3, 0x02C6),
    (0xC4, 0x02DC),
    (0xC5, 0x00AF),
    (0xC6, 0x02D8),
    (0xC7, 0x02D9),
    (0xC8, 0x00A8),
    (0xCA, 0x02DA),
    (0xCB, 0x00B8),
    (0xCD, 0x02DD),
    (0xCE, 0x02DB),
    (0xCF, 0x02C7),
    (0xD0, 0x2014),
    (0xE1, 0x00C6),
    (0xE3, 0x00AA),
    (0xE8, 0x0141),
    (0xE9, 0x00D8),
    (0xEA, 0x0152),
    (0xEB, 0x00BA),
    (0xF1, 0x00E6),
    (0xF5, 0x0131),
    (0xF8, 0x0142),
    (0xF9, 0x00F8),
    (0xFA, 0x0153),
    (0xFB, 0x00DF),
];

/// WinAnsiEncoding 0x80–0x9F (CP1252); 0xA0.. is Latin-1 identity.
const WIN_ANSI_HIGH: &[(u8, u16)] = &[
    (0x80, 0x20AC),
    (0x82, 0x201A),
    (0x83, 0x0192),
    (0x84, 0x201E),
    (0x85, 0x2026),
    (0x86, 0x2020),
    (0x87, 0x2021),
    (0x88, 0x02C6),
    (0x89, 0x2030),
    (0x8A, 0x0160),
    (0x8B, 0x2039),
    (0x8C, 0x0152),
    (0x8E, 0x017D),
    (0x91, 0x2018),
    (0x92, 0x2019),
    (0x93, 0x201C),
    (0x94, 0x201D),
    (0x95, 0x2022),
    (0x96, 0x2013),
    (0x97, 0x2014),
    (0x98, 0x02DC),
    (0x99, 0x2122),
    (0x9A, 0x0161),
    (0x9B, 0x203A),
    (0x9C, 0x0153),
    (0x9E, 0x017E),
    (0x9F, 0x0178),
];

/// PDFDocEncoding control-range additions.
const PDF_DOC_LOW: &[(u8, u16)] = &[
    (0x18, 0x02D8),
    (0x19, 0x02C7),
    (0x1A, 0x02C6),
    (0x1B, 0x02D9),
    (0x1C, 0x02DD),
    (0x1D, 0x02DB),
    (0x1E, 0x02DA),
    (0x1F, 0x02DC),
];

/// PDFDocEncoding 0x80–0xA0; the rest is Latin-1 identity.
const PDF_DOC_HIGH: &[(u8, u16)] = &[
    (0x80, 0x2022),
    (0x81, 0x2020),
    (0x82, 0x2021),
    (0x83, 0x2026),
    (0x84, 0x2014),
    (0x85, 0x2013),
    (0x86, 0x0192),
    (0x87, 0x2044),
    (0x88, 0x2039),
    (0x89, 0x203A),
    (0x8A, 0x2212),
    (0x8B, 0x2030),
    (0x8C, 0x201E),
    (0x8D, 0x201C),
    (0x8E, 0x201D),
    (0x8F, 0x2018),
    (0x90, 0x2019),
    (0x91, 0x201A),
    (0x92, 0x2122),
    (0x93, 0xFB01),
    (0x94, 0xFB02),
    (0x95, 0x0141),
    (0x96, 0x0152),
    (0x97, 0x0160),
    (0x98, 0x0178),
    (0x99, 0x017D),
    (0x9A, 0x0131),
    (0x9B, 0x0142),
    (0x9C, 0x0153),
    (0x9D, 0x0161),
    (0x9E, 0x017E),
    (0xA0, 0x20AC),
];

/// MacRomanEncoding upper half.
const MAC_ROMAN_HIGH: &[(u8, u16)] = &[
    (0x80, 0x00C4),
    (0x81, 0x00C5),
    (0x82, 0x00C7),
    (0x83, 0x00C9),
    (0x84, 0x00D1),
    (0x85, 0x00D6),
    (0x86, 0x00DC),
    (0x87, 0x00E1),
    (0x88, 0x00E0),
    (0x89, 0x00E2),
    (0x8A, 0x00E4),
    (0x8B, 0x00E3),
    (0x8C, 0x00E5),
    (0x8D, 0x00E7),
    (0x8E, 0x00E9),
    (0x8F, 0x00E8),
    (0x90, 0x00EA),
    (0x91, 0x00EB),
    (0x92, 0x00ED),
    (0x93, 0x00EC),
    (0x94, 0x00EE),
    (0x95, 0x00EF),
    (0x96, 0x00F1),
    (0x97, 0x00F3),
    (0x98, 0x00F2),
    (0x99, 0x00F4),
    (0x9A, 0x00F6),
    (0x9B, 0x00F5),
    (0x9C, 0x00FA),
    (0x9D, 0x00F9),
    (0x9E, 0x00FB),
    (0x9F, 0x00FC),
    (0xA0, 0x2020),
    (0xA1, 0x00B0),
    (0xA2, 0x00A2),
    (0xA3, 0x00A3),
    (0xA4, 0x00A7),
    (0xA5, 0x2022),
    (0xA6, 0x00B6),
    (0xA7, 0x00DF),
    (0xA8, 0x00AE),
    (0xA9, 0x00A9),
    (0xAA, 0x2122),
    (0xAB, 0x00B4),
    (0xAC, 0x00A8),
    (0xAD, 0x2260),
    (0xAE, 0x00C6),
    (0xAF, 0x00D8),
    (0xB0, 0x221E),
    (0xB1, 0x00B1),
    (0xB2, 0x2264),
    (0xB3, 0x2265),
    (0xB4, 0x00A5),
    (0xB5, 0x00B5),
    (0xB6, 0x2202),
    (0xB7, 0x2211),
    (0xB8, 0x220F),
    (0xB9, 0x03C0),
    (0xBA, 0x222B),
    (0xBB, 0x00AA),
    (0xBC, 0x00BA),
    (0xBD, 0x03A9),
    (0xBE, 0x00E6),
    (0xBF, 0x00F8),
    (0xC0, 0x00BF),
    (0xC1, 0x00A1),
    (0xC2, 0x00AC),
    (0xC3, 0x221A),
    (0xC4, 0x0192),
    (0xC5, 0x2248),
    (0xC6, 0x2206),
    (0xC7, 0x00AB),
    (0xC8, 0x00BB),
    (0xC9, 0x2026),
    (0xCA, 0x00A0),
    (0xCB, 0x00C0),
    (0xCC, 0x00C3),
    (0xCD, 0x00D5),
    (0xCE, 0x0152),
    (0xCF, 0x0153),
    (0xD0, 0x2013),
    (0xD1, 0x2014),
    (0xD2, 0x201C),
    (0xD3, 0x201D),
    (0xD4, 0x2018),
    (0xD5, 0x2019),
    (0xD6, 0x00F7),
    (0xD7, 0x25CA),
    (0xD8, 0x00FF),
    (0xD9, 0x0178),
    (0xDA, 0x2044),
    (0xDB, 0x00A4),
    (0xDC, 0x2039),
    (0xDD, 0x203A),
    (0xDE, 0xFB01),
    (0xDF, 0xFB02),
    (0xE0, 0x2021),
    (0xE1, 0x00B7),
    (0xE2, 0x201A),
    (0xE3, 0x201E),
    (0xE4, 0x2030),
    (0xE5, 0x00C2),
    (0xE6, 0x00CA),
    (0xE7, 0x00C1),
    (0xE8, 0x00CB),
    (0xE9, 0x00C8),
    (0xEA, 0x00CD),
    (0xEB, 0x00CE),
    (0xEC, 0x00CF),
    (0xED, 0x00CC),
    (0xEE, 0x00D3),
    (0xEF, 0x00D4),
    (0xF0, 0xF8FF),
    (0xF1, 0x00D2),
    (0xF2, 0x00DA),
    (0xF3, 0x00DB),
    (0xF4, 0x00D9),
    (0xF5, 0x0131),
    (0xF6, 0x02C6),
    (0xF7, 0x02DC),
    (0xF8, 0x00AF),
    (0xF9, 0x02D8),
    (0xFA, 0x02D9),
    (0xFB, 0x02DA),
    (0xFC, 0x00B8),
    (0xFD, 0x02DD),
    (0xFE, 0x02DB),
    (0xFF, 0x02C7),
];

/// Symbol, complete.
const SYMBOL: &[(u8, u16)] = &[
    (0x20, 0x0020),
    (0x21, 0x0021),
    (0x22, 0x2200),
    (0x23, 0x0023),
    (0x24, 0x2203),
    (0x25, 0x0025),
    (0x26, 0x0026),
    (0x27, 0x220B),
    (0x28, 0x0028),
    (0x29, 0x0029),
    (0x2A, 0x2217),
    (0x2B, 0x002B),
    (0x2C, 0x002C),
    (0x2D, 0x2212),
    (0x2E, 0x002E),
    (0x2F, 0x002F),
    (0x30, 0x0030),
    (0x31, 0x0031),
    (0x32, 0x0032),
    (0x33, 0x0033),
    (0x34, 0x0034),
    (0x35, 0x0035),
    (0x36, 0x0036),
    (0x37, 0x0037),
    (0x38, 0x0038),
    (0x39, 0x0039),
    (0x3A, 0x003A),
    (0x3B, 0x003B),
    (0x3C, 0x003C),
    (0x3D, 0x003D),
    (0x3E, 0x003E),
    (0x3F, 0x003F),
    (0x40, 0x2245),
    (0x41, 0x0391),
    (0x42, 0x0392),
    (0x43, 0x03A7),
    (0x44, 0x0394),
    (0x45, 0x0395),
    (0x46, 0x03A6),
    (0x47, 0x0393),
    (0x48, 0x0397),
    (0x49, 0x0399),
    (0x4A, 0x03D1),
    (0x4B, 0x039A),
    (0x4C, 0x039B),
    (0x4D, 0x039C),
    (0x4E, 0x039D),
    (0x4F, 0x039F),
    (0x50, 0x03A0),
    (0x51, 0x0398),
    (0x52, 0x03A1),
    (0x53, 0x03A3),
    (0x54, 0x03A4),
    (0x55, 0x03A5),
    (0x56, 0x03C2),
    (0x57, 0x03A9),
    (0x58, 0x039E),
    (0x59, 0x03A8),
    (0x5A, 0x0396),
    (0x5B, 0x005B),
    (0x5C, 0x2234),
    (0x5D, 0x005D),
    (0x5E, 0x22A5),
    (0x5F, 0x005F),
    (0x60, 0x203E),
    (0x61, 0x03B1),
    (0x62, 0x03B2),
    (0x63, 0x03C7),
    (0x64, 0x03B4),
    (0x65, 0x03B5),
    (0x66, 0x03C6),
    (0x67, 0x03B3),
    (0x68, 0x03B7),
    (0x69, 0x03B9),
    (0x6A, 0x03D5),
    (0x6B, 0x03BA),
    (0x6C, 0x03BB),
    (0x6D, 0x03BC),
    (0x6E, 0x03BD),
    (0x6F, 0x03BF),
    (0x70, 0x03C0),
    (0x71, 0x03B8),
    (0x72, 0x03C1),
    (0x73, 0x03C3),
    (0x74, 0x03C4),
    (0x75, 0x03C5),
    (0x76, 0x03D6),
    (0x77, 0x03C9),
    (0x78, 0x03BE),
    (0x79, 0x03C8),
    (0x7A, 0x03B6),
    (0x7B, 0x007B),
    (0x7C, 0x007C),
    (0x7D, 0x007D),
    (0x7E, 0x223C),
    (0xA0, 0x20AC),
    (0xA1, 0x03D2),
    (0xA2, 0x2032),
    (0xA3, 0x2264),
    (0xA4, 0x2044),
    (0xA5, 0x221E),
    (0xA6, 0x0192),
    (0xA7, 0x2663),
    (0xA8, 0x2666),
    (0xA9, 0x2665),
    (0xAA, 0x2660),
    (0xAB, 0x2194),
    (0xAC, 0x2190),
    (0xAD, 0x2191),
    (0xAE, 0x2192),
    (0xAF, 0x2193),
    (0xB0, 0x00B0),
    (0xB1, 0x00B1),
    (0xB2, 0x2033),
    (0xB3, 0x2265),
    (0xB4, 0x00D7),
    (0xB5, 0x221D),
    (0xB6, 0x2202),
    (0xB7, 0x2022),
    (0xB8, 0x00F7),
    (0xB9, 0x2260),
    (0xBA, 0x2261),
    (0xBB, 0x2248),
    (0xBC, 0x2026),
    (0xBD, 0x23D0),
    (0xBE, 0x23AF),
    (0xBF, 0x21B5),
    (0xC0, 0x2135),
    (0xC1, 0x2111),
    (0xC2, 0x211C),
    (0xC3, 0x2118),
    (0xC4, 0x2297),
    (0xC5, 0x2205),
    (0xC6, 0x2295),
    (0xC7, 0x2229),
    (0xC8, 0x222A),
    (0xC9, 0x2283),
    (0xCA, 0x2287),
    (0xCB, 0x2284),
    (0xCC, 0x2282),
    (0xCD, 0x2286),
    (0xCE, 0x2208),
    (0xCF, 0x2209),
    (0xD0, 0x2220),
    (0xD1, 0x2207),
    (0xD2, 0x00AE),
    (0xD3, 0x00A9),
    (0xD4, 0x2122),
    (0xD5, 0x220F),
    (0xD6, 0x221A),
    (0xD7, 0x22C5),
    (0xD8, 0x00AC),
    (0xD9, 0x2227),
    (0xDA, 0x2228),
    (0xDB, 0x21D4),
    (0xDC, 0x21D0),
    (0xDD, 0x21D1),
    (0xDE, 0x21D2),
    (0xDF, 0x21D3),
    (0xE0, 0x25CA),
    (0xE1, 0x2329),
    (0xE2, 0x00AE),
    (0xE3, 0x00A9),
    (0xE4, 0x2122),
    (0xE5, 0x2211),
    (0xE6, 0x239B),
    (0xE7, 0x239C),
    (0xE8, 0x239D),
    (0xE9, 0x23A1),
    (0xEA, 0x23A2),
    (0xEB, 0x23A3),
    (0xEC, 0x23A7),
    (0xED, 0x23A8),
    (0xEE, 0x23A9),
    (0xEF, 0x23AA),
    (0xF1, 0x232A),
    (0xF2, 0x222B),
    (0xF3, 0x2320),
    (0xF4, 0x23AE),
    (0xF5, 0x2321),
    (0xF6, 0x239E),
    (0xF7, 0x239F),
    (0xF8, 0x23A0),
    (0xF9, 0x23A4),
    (0xFA, 0x23A5),
    (0xFB, 0x23A6),
    (0xFC, 0x23AB),
    (0xFD, 0x23AC),
    (0xFE, 0x23AD),
];

/// ZapfDingbats, complete.
const ZAPF_DINGBATS: &[(u8, u16)] = &[
    (0x20, 0x0020),
    (0x21, 0x2701),
    (0x22, 0x2702),
    (0x23, 0x2703),
    (0x24, 0x2704),
    (0x25, 0x260E),
    (0x26, 0x2706),
    (0x27, 0x2707),
    (0x28, 0x2708),
    (0x29, 0x2709),
    (0x2A, 0x261B),
    (0x2B, 0x261E),
    (0x2C, 0x270C),
    (0x2D, 0x270D),
    (0x2E, 0x270E),
    (0x2F, 0x270F),
    (0x30, 0x2710),
    (0x31, 0x2711),
    (0x32, 0x2712),
    (0x33, 0x2713),
    (0x34, 0x2714),
    (0x35, 0x2715),
    (0x36, 0x2716),
    (0x37, 0x2717),
    (0x38, 0x2718),
    (0x39, 0x2719),
    (0x3A, 0x271A),
    (0x3B, 0x271B),
    (0x3C, 0x271C),
    (0x3D, 0x271D),
    (0x3E, 0x271E),
    (0x3F, 0x271F),
    (0x40, 0x2720),
    (0x41, 0x2721),
    (0x42, 0x2722),
    (0x43, 0x2723),
    (0x44, 0x2724),
    (0x45, 0x2725),
    (0x46, 0x2726),
    (0x47, 0x2727),
    (0x48, 0x2605),
    (0x49, 0x2729),
    (0x4A, 0x272A),
    (0x4B, 0x272B),
    (0x4C, 0x272C),
    (0x4D, 0x272D),
    (0x4E, 0x272E),
    (0x4F, 0x272F),
    (0x50, 0x2730),
    (0x51, 0x2731),
    (0x52, 0x2732),
    (0x53, 0x2733),
    (0x54, 0x2734),
    (0x55, 0x2735),
    (0x56, 0x2736),
    (0x57, 0x2737),
    (0x58, 0x2738),
    (0x59, 0x2739),
    (0x5A, 0x273A),
    (0x5B, 0x273B),
    (0x5C, 0x273C),
    (0x5D, 0x273D),
    (0x5E, 0x273E),
    (0x5F, 0x273F),
    (0x60, 0x2740),
    (0x61, 0x2741),
    (0x62, 0x2742),
    (0x63, 0x2743),
    (0x64, 0x2744),
    (0x65, 0x2745),
    (0x66, 0x2746),
    (0x67, 0x2747),
    (0x68, 0x2748),
    (0x69, 0x2749),
    (0x6A, 0x274A),
    (0x6B, 0x274B),
    (0x6C, 0x25CF),
    (0x6D, 0x274D),
    (0x6E, 0x25A0),
    (0x6F, 0x274F),
    (0x70, 0x2750),
    (0x71, 0x2751),
    (0x72, 0x2752),
    (0x73, 0x25B2),
    (0x74, 0x25BC),
    (0x75, 0x25C6),
    (0x76, 0x2756),
    (0x77, 0x25D7),
    (0x78, 0x2758),
    (0x79, 0x2759),
    (0x7A, 0x275A),
    (0x7B, 0x275B),
    (0x7C, 0x275C),
    (0x7D, 0x275D),
    (0x7E, 0x275E),
    (0x80, 0x2768),
    (0x81, 0x2769),
    (0x82, 0x276A),
    (0x83, 0x276B),
    (0x84, 0x276C),
    (0x85, 0x276D),
    (0x86, 0x276E),
    (0x87, 0x276F),
    (0x88, 0x2770),
    (0x89, 0x2771),
    (0x8A, 0x2772),
    (0x8B, 0x2773),
    (0x8C, 0x2774),
    (0x8D, 0x2775),
    (0xA1, 0x2761),
    (0xA2, 0x2762),
    (0xA3, 0x2763),
    (0xA4, 0x2764),
    (0xA5, 0x2765),
    (0xA6, 0x2766),
    (0xA7, 0x2767),
    (0xA8, 0x2663),
    (0xA9, 0x2666),
    (0xAA, 0x2665),
    (0xAB, 0x2660),
    (0xAC, 0x2460),
    (0xAD, 0x2461),
    (0xAE, 0x2462),
    (0xAF, 0x2463),
    (0xB0, 0x2464),
    (0xB1, 0x2465),
    (0xB2, 0x2466),
    (0xB3, 0x2467),
    (0xB4, 0x2468),
    (0xB5, 0x2469),
    (0xB6, 0x2776),
    (0xB7, 0x2777),
    (0xB8, 0x2778),
    (0xB9, 0x2779),
    (0xBA, 0x277A),
    (0xBB, 0x277B),
    (0xBC, 0x277C),
    (0xBD, 0x277D),
    (0xBE, 0x277E),
    (0xBF, 0x277F),
    (0xC0, 0x2780),
    (0xC1, 0x2781),
    (0xC2, 0x2782),
    (0xC3, 0x2783),
    (0xC4, 0x2784),
    (0xC5, 0x2785),
    (0xC6, 0x2786),
    (0xC7, 0x2787),
    (0xC8, 0x2788),
    (0xC9, 0x2789),
    (0xCA, 0x278A),
    (0xCB, 0x278B),
    (0xCC, 0x278C),
    (0xCD, 0x278D),
    (0xCE, 0x278E),
    (0xCF, 0x278F),
    (0xD0, 0x2790),
    (0xD1, 0x2791),
    (0xD2, 0x2792),
    (0xD3, 0x2793),
    (0xD4, 0x2794),
    (0xD5, 0x2192),
    (0xD6, 0x2194),
    (0xD7, 0x2195),
    (0xD8, 0x2798),
    (0xD9, 0x2799),
    (0xDA, 0x279A),
    (0xDB, 0x279B),
    (0xDC, 0x279C),
    (0xDD, 0x279D),
    (0xDE, 0x279E),
    (0xDF, 0x279F),
    (0xE0, 0x27A0),
    (0xE1, 0x27A1),
    (0xE2, 0x27A2),
    (0xE3, 0x27A3),
    (0xE4, 0x27A4),
    (0xE5, 0x27A5),
    (0xE6, 0x27A6),
    (0xE7, 0x27A7),
    (0xE8, 0x27A8),
    (0xE9, 0x27A9),
    (0xEA, 0x27AA),
    (0xEB, 0x27AB),
    (0xEC, 0x27AC),
    (0xED, 0x27AD),
    (0xEE, 0x27AE),
    (0xEF, 0x27AF),
    (0xF1, 0x27B1),
    (0xF2, 0x27B2),
    (0xF3, 0x27B3),
    (0xF4, 0x27B4),
    (0xF5, 0x27B5),
    (0xF6, 0x27B6),
    (0xF7, 0x27B7),
    (0xF8, 0x27B8),
    (0xF9, 0x27B9),
    (0xFA, 0x27BA),
    (0xFB, 0x27BB),
    (0xFC, 0x27BC),
    (0xFD, 0x27BD),
    (0xFE, 0x27BE),
];

/// MacExpertEncoding. Most targets sit in Adobe's corporate private-use
/// block, matching the glyph list; the fractions and ligatures that have
/// real code points use them.
const MAC_EXPERT: &[(u8, u16)] = &[
    (0x20, 0x0020),
    (0x21, 0xF721),
    (0x22, 0xF6F8),
    (0x23, 0xF7A2),
    (0x24, 0xF724),
    (0x25, 0xF6E4),
    (0x26, 0xF726),
    (0x27, 0xF7B4),
    (0x28, 0x207D),
    (0x29, 0x207E),
    (0x2A, 0x2025),
    (0x2B, 0x2024),
    (0x2C, 0x002C),
    (0x2D, 0x002D),
    (0x2E, 0x002E),
    (0x2F, 0x2044),
    (0x30, 0xF730),
    (0x31, 0xF731),
    (0x32, 0xF732),
    (0x33, 0xF733),
    (0x34, 0xF734),
    (0x35, 0xF735),
    (0x36, 0xF736),
    (0x37, 0xF737),
    (0x38, 0xF738),
    (0x39, 0xF739),
    (0x3A, 0x003A),
    (0x3B, 0x003B),
    (0x3D, 0xF6DE),
    (0x3F, 0xF73F),
    (0x44, 0xF7DF),
    (0x47, 0x00BC),
    (0x48, 0x00BD),
    (0x49, 0x00BE),
    (0x4A, 0x215B),
    (0x4B, 0x215C),
    (0x4C, 0x215D),
    (0x4D, 0x215E),
    (0x4E, 0x2153),
    (0x4F, 0x2154),
    (0x56, 0xFB00),
    (0x57, 0xFB01),
    (0x58, 0xFB02),
    (0x59, 0xFB03),
    (0x5A, 0xFB04),
    (0x5B, 0x208D),
    (0x5D, 0x208E),
    (0x5E, 0xF6F6),
    (0x5F, 0xF6E5),
    (0x60, 0xF760),
    (0x61, 0xF761),
    (0x62, 0xF762),
    (0x63, 0xF763),
    (0x64, 0xF764),
    (0x65, 0xF765),
    (0x66, 0xF766),
    (0x67, 0xF767),
    (0x68, 0xF768),
    (0x69, 0xF769),
    (0x6A, 0xF76A),
    (0x6B, 0xF76B),
    (0x6C, 0xF76C),
    (0x6D, 0xF76D),
    (0x6E, 0xF76E),
    (0x6F, 0xF76F),
    (0x70, 0xF770),
    (0x71, 0xF771),
    (0x72, 0xF772),
    (0x73, 0xF773),
    (0x74, 0xF774),
    (0x75, 0xF775),
    (0x76, 0xF776),
    (0x77, 0xF777),
    (0x78, 0xF778),
    (0x79, 0xF779),
    (0x7A, 0xF77A),
    (0x7B, 0x20A1),
    (0x7C, 0xF6DC),
    (0x7D, 0xF6DD),
    (0x7E, 0xF6FE),
    (0x81, 0xF6E9),
    (0x82, 0xF6E0),
    (0x87, 0xF7E1),
    (0x88, 0xF7E0),
    (0x89, 0xF7E2),
    (0x8A, 0xF7E4),
    (0x8B, 0xF7E3),
    (0x8C, 0xF7E5),
    (0x8D, 0xF7E7),
    (0x8E, 0xF7E9),
    (0x8F, 0xF7E8),
    (0x90, 0xF7EA),
    (0x91, 0xF7EB),
    (0x92, 0xF7ED),
    (0x93, 0xF7EC),
    (0x94, 0xF7EE),
    (0x95, 0xF7EF),
    (0x96, 0xF7F1),
    (0x97, 0xF7F3),
    (0x98, 0xF7F2),
    (0x99, 0xF7F4),
    (0x9A, 0xF7F6),
    (0x9B, 0xF7F5),
    (0x9C, 0xF7FA),
    (0x9D, 0xF7F9),
    (0x9E, 0xF7FB),
    (0x9F, 0xF7FC),
    (0xA1, 0x2078),
    (0xA2, 0x2084),
    (0xA3, 0x2083),
    (0xA4, 0x2086),
    (0xA5, 0x2088),
    (0xA6, 0x2087),
    (0xA7, 0xF6FD),
    (0xA9, 0xF6DF),
    (0xAA, 0x2012),
    (0xAC, 0xF7A8),
    (0xAE, 0xF6F5),
    (0xAF, 0xF6F0),
    (0xB0, 0x2085),
    (0xB2, 0xF6E1),
    (0xB3, 0xF6E7),
    (0xB4, 0xF7FD),
    (0xB6, 0xF6E3),
    (0xB9, 0xF7FE),
    (0xBB, 0x2089),
    (0xBC, 0x2080),
    (0xBD, 0xF6FF),
    (0xBE, 0xF7E6),
    (0xBF, 0xF7F8),
    (0xC0, 0xF7BF),
    (0xC1, 0x2081),
    (0xC2, 0xF6F9),
    (0xC5, 0xF7B8),
    (0xC9, 0xF6FA),
    (0xCA, 0x2012),
    (0xCB, 0xF6F7),
    (0xCF, 0xF6FC),
    (0xD0, 0xF6FB),
    (0xD1, 0x2082),
    (0xD6, 0xF7A1),
    (0xD8, 0xF7FF),
    (0xDA, 0x00B9),
    (0xDB, 0x00B2),
    (0xDC, 0x00B3),
    (0xDD, 0x2074),
    (0xDE, 0x2075),
    (0xDF, 0x2076),
    (0xE0, 0x2077),
    (0xE1, 0x2079),
    (0xE2, 0x2070),
    (0xE4, 0xF6EC),
    (0xE5, 0xF6F1),
    (0xE6, 0xF6F3),
    (0xE9, 0xF6ED),
    (0xEA, 0xF6F2),
    (0xEB, 0xF6EB),
    (0xF1, 0xF6EE),
    (0xF2, 0xF6FB),
    (0xF3, 0xF6F4),
    (0xF4, 0xF7AF),
    (0xF5, 0xF6EA),
    (0xF6, 0x207F),
    (0xF7, 0xF6EF),
    (0xF8, 0xF6E2),
    (0xF9, 0xF6E8),
    (0xFA, 0xF6F6),
    (0xFB, 0xF6E6),
];

/// A name from an `/Encoding` `Differences` array to Unicode: the glyph
/// list, then the `uniXXXX` / `uXXXXXX` synthetic forms.
pub fn glyph_to_unicode(name: &str) -> Option<String> {
    if let Ok(i) = GLYPH_LIST.binary_search_by_key(&name, |(n, _)| n) {
        return char::from_u32(GLYPH_LIST[i].1).map(String::from);
    }
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() >= 4 && hex.len() % 4 == 0 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let units: Vec<u16> = (0..hex.len())
                .step_by(4)
                .filter_map(|i| u16::from_str_radix(&hex[i..i + 4], 16).ok())
                .collect();
            return String::from_utf16(&units).ok();
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let v = u32::from_str_radix(hex, 16).ok()?;
            return char::from_u32(v).map(String::from);
        }
    }
    None
}

/// The inverse direction, for re-encoding edited text through a
/// `Differences` array.
pub fn unicode_to_glyph(c: char) -> Option<&'static str> {
    let v = u32::from(c);
    GLYPH_LIST
        .iter()
        .find(|(_, u)| *u == v)
        .map(|(n, _)| *n)
}

/// Adobe Glyph List subset: Latin, punctuation, typographic and Greek
/// coverage, sorted by name.
const GLYPH_LIST: &[(&str, u32)] = &[
    ("A", 0x0041),
    ("AE", 0x00C6),
    ("Aacute", 0x00C1),
    ("Acircumflex", 0x00C2),
    ("Adieresis", 0x00C4),
    ("Agrave", 0x00C0),
    ("Alpha", 0x0391),
    ("Aring", 0x00C5),
    ("Atilde", 0x00C3),
    ("B", 0x0042),
    ("Beta", 0x0392),
    ("C", 0x0043),
    ("Ccedilla", 0x00C7),
    ("Chi", 0x03A7),
    ("D", 0x0044),
    ("Delta", 0x2206),
    ("E", 0x0045),
    ("Eacute", 0x00C9),
    ("Ecircumflex", 0x00CA),
    ("Edieresis", 0x00CB),
    ("Egrave", 0x00C8),
    ("Epsilon", 0x0395),
    ("Eta", 0x0397),
    ("Eth", 0x00D0),
    ("Euro", 0x20AC),
    ("F", 0x0046),
    ("G", 0x0047),
    ("Gamma", 0x0393),
    ("H", 0x0048),
    ("I", 0x0049),
    ("Iacute", 0x00CD),
    ("Icircumflex", 0x00CE),
    ("Idieresis", 0x00CF),
    ("Igrave", 0x00CC),
    ("Iota", 0x0399),
    ("J", 0x004A),
    ("K", 0x004B),
    ("Kappa", 0x039A),
    ("L", 0x004C),
    ("Lambda", 0x039B),
    ("Lslash", 0x0141),
    ("M", 0x004D),
    ("Mu", 0x039C),
    ("N", 0x004E),
    ("Ntilde", 0x00D1),
    ("Nu", 0x039D),
    ("O", 0x004F),
    ("OE", 0x0152),
    ("Oacute", 0x00D3),
    ("Ocircumflex", 0x00D4),
    ("Odieresis", 0x00D6),
    ("Ograve", 0x00D2),
    ("Omega", 0x2126),
    ("Omicron", 0x039F),
    ("Oslash", 0x00D8),
    ("Otilde", 0x00D5),
    ("P", 0x0050),
    ("Phi", 0x03A6),
    ("Pi", 0x03A0),
    ("Psi", 0x03A8),
    ("Q", 0x0051),
    ("R", 0x0052),
    ("Rho", 0x03A1),
    ("S", 0x0053),
    ("Scaron", 0x0160),
    ("Sigma", 0x03A3),
    ("T", 0x0054),
    ("Tau", 0x03A4),
    ("Theta", 0x0398),
    ("Thorn", 0x00DE),
    ("U", 0x0055),
    ("Uacute", 0x00DA),
    ("Ucircumflex", 0x00DB),
    ("Udieresis", 0x00DC),
    ("Ugrave", 0x00D9),
    ("Upsilon", 0x03A5),
    ("V", 0x0056),
    ("W", 0x0057),
    ("X", 0x0058),
    ("Xi", 0x039E),
    ("Y", 0x0059),
    ("Yacute", 0x00DD),
    ("Ydieresis", 0x0178),
    ("Z", 0x005A),
    ("Zcaron", 0x017D),
    ("Zeta", 0x0396),
    ("a", 0x0061),
    ("aacute", 0x00E1),
    ("acircumflex", 0x00E2),
    ("acute", 0x00B4),
    ("adieresis", 0x00E4),
    ("ae", 0x00E6),
    ("agrave", 0x00E0),
    ("alpha", 0x03B1),
    ("ampersand", 0x0026),
    ("aring", 0x00E5),
    ("asciicircum", 0x005E),
    ("asciitilde", 0x007E),
    ("asterisk", 0x002A),
    ("at", 0x0040),
    ("atilde", 0x00E3),
    ("b", 0x0062),
    ("backslash", 0x005C),
    ("bar", 0x007C),
    ("beta", 0x03B2),
    ("braceleft", 0x007B),
    ("braceright", 0x007D),
    ("bracketleft", 0x005B),
    ("bracketright", 0x005D),
    ("breve", 0x02D8),
    ("brokenbar", 0x00A6),
    ("bullet", 0x2022),
    ("c", 0x0063),
    ("caron", 0x02C7),
    ("ccedilla", 0x00E7),
    ("cedilla", 0x00B8),
    ("cent", 0x00A2),
    ("chi", 0x03C7),
    ("circumflex", 0x02C6),
    ("colon", 0x003A),
    ("comma", 0x002C),
    ("copyright", 0x00A9),
    ("currency", 0x00A4),
    ("d", 0x0064),
    ("dagger", 0x2020),
    ("daggerdbl", 0x2021),
    ("degree", 0x00B0),
    ("delta", 0x03B4),
    ("dieresis", 0x00A8),
    ("divide", 0x00F7),
    ("dollar", 0x0024),
    ("dotaccent", 0x02D9),
    ("dotlessi", 0x0131),
    ("e", 0x0065),
    ("eacute", 0x00E9),
    ("ecircumflex", 0x00EA),
    ("edieresis", 0x00EB),
    ("egrave", 0x00E8),
    ("eight", 0x0038),
    ("ellipsis", 0x2026),
    ("emdash", 0x2014),
    ("endash", 0x2013),
    ("epsilon", 0x03B5),
    ("equal", 0x003D),
    ("eta", 0x03B7),
    ("eth", 0x00F0),
    ("exclam", 0x0021),
    ("exclamdown", 0x00A1),
    ("f", 0x0066),
    ("fi", 0xFB01),
    ("five", 0x0035),
    ("fl", 0xFB02),
    ("florin", 0x0192),
    ("four", 0x0034),
    ("fraction", 0x2044),
    ("g", 0x0067),
    ("gamma", 0x03B3),
    ("germandbls", 0x00DF),
    ("grave", 0x0060),
    ("greater", 0x003E),
    ("guillemotleft", 0x00AB),
    ("guillemotright", 0x00BB),
    ("guilsinglleft", 0x2039),
    ("guilsinglright", 0x203A),
    ("h", 0x0068),
    ("hungarumlaut", 0x02DD),
    ("hyphen", 0x002D),
    ("i", 0x0069),
    ("iacute", 0x00ED),
    ("icircumflex", 0x00EE),
    ("idieresis", 0x00EF),
    ("igrave", 0x00EC),
    ("iota", 0x03B9),
    ("j", 0x006A),
    ("k", 0x006B),
    ("kappa", 0x03BA),
    ("l", 0x006C),
    ("lambda", 0x03BB),
    ("less", 0x003C),
    ("logicalnot", 0x00AC),
    ("lslash", 0x0142),
    ("m", 0x006D),
    ("macron", 0x00AF),
    ("minus", 0x2212),
    ("mu", 0x00B5),
    ("multiply", 0x00D7),
    ("n", 0x006E),
    ("nine", 0x0039),
    ("ntilde", 0x00F1),
    ("nu", 0x03BD),
    ("numbersign", 0x0023),
    ("o", 0x006F),
    ("oacute", 0x00F3),
    ("ocircumflex", 0x00F4),
    ("odieresis", 0x00F6),
    ("oe", 0x0153),
    ("ogonek", 0x02DB),
    ("ograve", 0x00F2),
    ("omega", 0x03C9),
    ("omicron", 0x03BF),
    ("one", 0x0031),
    ("onehalf", 0x00BD),
    ("onequarter", 0x00BC),
    ("onesuperior", 0x00B9),
    ("ordfeminine", 0x00AA),
    ("ordmasculine", 0x00BA),
    ("oslash", 0x00F8),
    ("otilde", 0x00F5),
    ("p", 0x0070),
    ("paragraph", 0x00B6),
    ("parenleft", 0x0028),
    ("parenright", 0x0029),
    ("percent", 0x0025),
    ("period", 0x002E),
    ("periodcentered", 0x00B7),
    ("perthousand", 0x2030),
    ("phi", 0x03C6),
    ("pi", 0x03C0),
    ("plus", 0x002B),
    ("plusminus", 0x00B1),
    ("psi", 0x03C8),
    ("q", 0x0071),
    ("question", 0x003F),
    ("questiondown", 0x00BF),
    ("quotedbl", 0x0022),
    ("quotedblbase", 0x201E),
    ("quotedblleft", 0x201C),
    ("quotedblright", 0x201D),
    ("quoteleft", 0x2018),
    ("quoteright", 0x2019),
    ("quotesinglbase", 0x201A),
    ("quotesingle", 0x0027),
    ("r", 0x0072),
    ("registered", 0x00AE),
    ("rho", 0x03C1),
    ("ring", 0x02DA),
    ("s", 0x0073),
    ("scaron", 0x0161),
    ("section", 0x00A7),
    ("semicolon", 0x003B),
    ("seven", 0x0037),
    ("sigma", 0x03C3),
    ("six", 0x0036),
    ("slash", 0x002F),
    ("space", 0x0020),
    ("sterling", 0x00A3),
    ("t", 0x0074),
    ("tau", 0x03C4),
    ("theta", 0x03B8),
    ("thorn", 0x00FE),
    ("three", 0x0033),
    ("threequarters", 0x00BE),
    ("threesuperior", 0x00B3),
    ("tilde", 0x02DC),
    ("trademark", 0x2122),
    ("two", 0x0032),
    ("twosuperior", 0x00B2),
    ("u", 0x0075),
    ("uacute", 0x00FA),
    ("ucircumflex", 0x00FB),
    ("udieresis", 0x00FC),
    ("ugrave", 0x00F9),
    ("underscore", 0x005F),
    ("upsilon", 0x03C5),
    ("v", 0x0076),
    ("w", 0x0077),
    ("x", 0x0078),
    ("xi", 0x03BE),
    ("y", 0x0079),
    ("yacute", 0x00FD),
    ("ydieresis", 0x00FF),
    ("yen", 0x00A5),
    ("z", 0x007A),
    ("zcaron", 0x017E),
    ("zero", 0x0030),
    ("zeta", 0x03B6),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_sorted() {
        for table in [
            STANDARD_OVERRIDES,
            STANDARD_HIGH,
            WIN_ANSI_HIGH,
            PDF_DOC_LOW,
            PDF_DOC_HIGH,
            MAC_ROMAN_HIGH,
            SYMBOL,
            ZAPF_DINGBATS,
            MAC_EXPERT,
        ] {
            assert!(table.windows(2).all(|w| w[0].0 < w[1].0));
        }
        assert!(GLYPH_LIST.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn win_ansi_euro() {
        assert_eq!(decode_byte(BaseEncoding::WinAnsi, 0x80), Some('\u{20AC}'));
        assert_eq!(decode_byte(BaseEncoding::WinAnsi, b'A'), Some('A'));
        assert_eq!(decode_byte(BaseEncoding::WinAnsi, 0xE9), Some('é'));
    }

    #[test]
    fn zapf_dingbats_scissors() {
        assert_eq!(
            decode_byte(BaseEncoding::ZapfDingbats, 0x21),
            Some('\u{2701}')
        );
    }

    #[test]
    fn symbol_pi() {
        assert_eq!(decode_byte(BaseEncoding::Symbol, 0x70), Some('\u{03C0}'));
    }

    #[test]
    fn symbol_pua_fold() {
        assert_eq!(fold_symbol_pua('\u{F070}'), '\u{03C0}');
        assert_eq!(fold_symbol_pua('\u{F0C5}'), '\u{2205}');
        assert_eq!(fold_symbol_pua('x'), 'x');
    }

    #[test]
    fn standard_quotes() {
        assert_eq!(decode_byte(BaseEncoding::Standard, 0x27), Some('\u{2019}'));
        assert_eq!(decode_byte(BaseEncoding::Standard, 0x60), Some('\u{2018}'));
    }

    #[test]
    fn encode_is_decode_inverse() {
        for enc in [
            BaseEncoding::WinAnsi,
            BaseEncoding::Standard,
            BaseEncoding::MacRoman,
        ] {
            for code in 0x20..=0x7Eu8 {
                if let Some(c) = decode_byte(enc, code) {
                    let back = encode_char(enc, c).unwrap();
                    assert_eq!(decode_byte(enc, back), Some(c));
                }
            }
        }
        assert_eq!(encode_char(BaseEncoding::WinAnsi, '€'), Some(0x80));
    }

    #[test]
    fn glyph_names() {
        assert_eq!(glyph_to_unicode("space").as_deref(), Some(" "));
        assert_eq!(glyph_to_unicode("Euro").as_deref(), Some("€"));
        assert_eq!(glyph_to_unicode("uni20AC").as_deref(), Some("€"));
        assert_eq!(glyph_to_unicode("u1F600").as_deref(), Some("😀"));
        assert_eq!(glyph_to_unicode("nosuchglyph"), None);
    }
}
