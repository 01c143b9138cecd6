//! lexer.rs
//!
//! Tokeniser and low-level object reader for PDF syntax. This is the single
//! entry point for turning file bytes into [`Object`] values; the xref
//! resolver, the content-stream iterator and the CMap parser all run on top
//! of it. Junk inside content streams is never fatal: unknown keywords come
//! back as [`Token::Keyword`] so the interpreter can decide what to do with
//! them. Only an unclosable balanced construct raises
//! [`Error::MalformedSyntax`].

use crate::error::Error;
use crate::object::{Dictionary, Object, ObjectId, Stream, StringFormat};

/// Whitespace per PDF 32000-1:2008 §7.2.2.
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

/// Delimiters per §7.2.2. Everything else is a "regular" character.
pub fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Integer(i64),
    Real(f32),
    /// Name with `#xx` escapes already applied, without the leading `/`.
    Name(Vec<u8>),
    LiteralString(Vec<u8>),
    HexString(Vec<u8>),
    ArrayOpen,
    ArrayClose,
    DictOpen,
    DictClose,
    ProcOpen,
    ProcClose,
    /// `true`, `false`, `null`, `obj`, `R`, `stream`, ... and any content
    /// operator or junk the lexer cannot classify.
    Keyword(Vec<u8>),
}

impl Token {
    pub fn is_keyword(&self, kw: &[u8]) -> bool {
        matches!(self, Token::Keyword(k) if k == kw)
    }
}

/// Optional resolver for `/Length` entries that are indirect references.
/// The xref layer passes one in; standalone parsing works without it (the
/// lexer then falls back to scanning for `endstream`).
pub type LengthLookup<'a> = &'a dyn Fn(ObjectId) -> Option<i64>;

pub struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a [u8]) -> Lexer<'a> {
        Lexer { data, pos: 0 }
    }

    pub fn at(data: &'a [u8], pos: usize) -> Lexer<'a> {
        Lexer { data, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Skips whitespace and `%…EOL` comments.
    pub fn skip_whitespace(&mut self) {
        loop {
            while let Some(b) = self.peek_byte() {
                if is_whitespace(b) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            if self.peek_byte() == Some(b'%') {
                while let Some(b) = self.peek_byte() {
                    self.pos += 1;
                    if b == b'\n' || b == b'\r' {
                        break;
                    }
                }
            } else {
                return;
            }
        }
    }

    /// Consumes a single end-of-line marker (CRLF, LF or lone CR).
    fn skip_eol(&mut self) {
        match self.peek_byte() {
            Some(b'\r') => {
                self.pos += 1;
                if self.peek_byte() == Some(b'\n') {
                    self.pos += 1;
                }
            }
            Some(b'\n') => self.pos += 1,
            _ => {}
        }
    }

    /// Next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, Error> {
        self.skip_whitespace();
        let b = match self.peek_byte() {
            Some(b) => b,
            None => return Ok(None),
        };
        match b {
            b'[' => {
                self.pos += 1;
                Ok(Some(Token::ArrayOpen))
            }
            b']' => {
                self.pos += 1;
                Ok(Some(Token::ArrayClose))
            }
            b'{' => {
                self.pos += 1;
                Ok(Some(Token::ProcOpen))
            }
            b'}' => {
                self.pos += 1;
                Ok(Some(Token::ProcClose))
            }
            b'<' => {
                if self.data.get(self.pos + 1) == Some(&b'<') {
                    self.pos += 2;
                    Ok(Some(Token::DictOpen))
                } else {
                    self.pos += 1;
                    Ok(Some(Token::HexString(self.read_hex_string()?)))
                }
            }
            b'>' => {
                if self.data.get(self.pos + 1) == Some(&b'>') {
                    self.pos += 2;
                    Ok(Some(Token::DictClose))
                } else {
                    // Stray '>': junk, surfaced as a keyword.
                    self.pos += 1;
                    Ok(Some(Token::Keyword(vec![b'>'])))
                }
            }
            b'(' => {
                self.pos += 1;
                Ok(Some(Token::LiteralString(self.read_literal_string()?)))
            }
            b')' => {
                self.pos += 1;
                Ok(Some(Token::Keyword(vec![b')'])))
            }
            b'/' => {
                self.pos += 1;
                Ok(Some(Token::Name(self.read_name())))
            }
            b'+' | b'-' | b'.' | b'0'..=b'9' => Ok(Some(self.read_number())),
            _ => Ok(Some(Token::Keyword(self.read_regular_bytes()))),
        }
    }

    /// All regular characters from the current position (at least one byte,
    /// so stray delimiters cannot cause an infinite loop upstream).
    fn read_regular_bytes(&mut self) -> Vec<u8> {
        let start = self.pos;
        while let Some(b) = self.peek_byte() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            self.pos += 1;
        }
        self.data[start..self.pos].to_vec()
    }

    /// Integer or real: optional sign, digits, at most one decimal point,
    /// no exponent. Unparseable number-ish runs come back as junk keywords.
    fn read_number(&mut self) -> Token {
        let start = self.pos;
        if matches!(self.peek_byte(), Some(b'+') | Some(b'-')) {
            self.pos += 1;
        }
        let mut seen_dot = false;
        while let Some(b) = self.peek_byte() {
            match b {
                b'0'..=b'9' => self.pos += 1,
                b'.' if !seen_dot => {
                    seen_dot = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let text = &self.data[start..self.pos];
        let s = std::str::from_utf8(text).unwrap_or("");
        if !seen_dot {
            if let Ok(i) = s.parse::<i64>() {
                return Token::Integer(i);
            }
        }
        // "4." and ".5" are valid PDF reals but not valid Rust float syntax
        // on their own sign handling, so normalise before parsing.
        let normalised = match s {
            "." | "-." | "+." => "0".to_string(),
            s if s.ends_with('.') => format!("{s}0"),
            s if s.starts_with('.') => format!("0{s}"),
            s if s.starts_with("-.") => format!("-0{}", &s[1..]),
            s if s.starts_with("+.") => format!("0{}", &s[1..]),
            s => s.to_string(),
        };
        match normalised.parse::<f32>() {
            Ok(r) => Token::Real(r),
            Err(_) => Token::Keyword(text.to_vec()),
        }
    }

    fn read_name(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(b) = self.peek_byte() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            if b == b'#' {
                let hi = self.data.get(self.pos + 1).and_then(|b| hex_value(*b));
                let lo = self.data.get(self.pos + 2).and_then(|b| hex_value(*b));
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    out.push(hi << 4 | lo);
                    self.pos += 3;
                    continue;
                }
            }
            out.push(b);
            self.pos += 1;
        }
        out
    }

    fn read_hex_string(&mut self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        let mut nibble: Option<u8> = None;
        loop {
            let b = self.peek_byte().ok_or_else(|| {
                Error::MalformedSyntax("hex string not closed before end of input".into())
            })?;
            self.pos += 1;
            match b {
                b'>' => {
                    if let Some(hi) = nibble {
                        // odd number of digits: final digit padded with 0
                        out.push(hi << 4);
                    }
                    return Ok(out);
                }
                b if is_whitespace(b) => {}
                b => {
                    if let Some(v) = hex_value(b) {
                        match nibble.take() {
                            Some(hi) => out.push(hi << 4 | v),
                            None => nibble = Some(v),
                        }
                    }
                    // non-hex bytes inside <...> are ignored, not fatal
                }
            }
        }
    }

    fn read_literal_string(&mut self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        let mut depth = 1usize;
        loop {
            let b = self.peek_byte().ok_or_else(|| {
                Error::MalformedSyntax("literal string not closed before end of input".into())
            })?;
            self.pos += 1;
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b'(');
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(b')');
                }
                b'\\' => {
                    let esc = match self.peek_byte() {
                        Some(e) => e,
                        None => {
                            return Err(Error::MalformedSyntax(
                                "literal string ends in lone backslash".into(),
                            ))
                        }
                    };
                    self.pos += 1;
                    match esc {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0C),
                        b'(' => out.push(b'('),
                        b')' => out.push(b')'),
                        b'\\' => out.push(b'\\'),
                        b'\r' => {
                            // line continuation, swallow an optional LF
                            if self.peek_byte() == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut v = (esc - b'0') as u32;
                            for _ in 0..2 {
                                match self.peek_byte() {
                                    Some(d @ b'0'..=b'7') => {
                                        v = v * 8 + (d - b'0') as u32;
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            out.push((v & 0xFF) as u8);
                        }
                        other => out.push(other),
                    }
                }
                b'\r' => {
                    // unescaped EOL inside a string reads as \n
                    if self.peek_byte() == Some(b'\n') {
                        self.pos += 1;
                    }
                    out.push(b'\n');
                }
                b => out.push(b),
            }
        }
    }

    /// Parses any direct object, plus `N G R` references and dict-then-stream.
    pub fn next_object(&mut self, length: Option<LengthLookup>) -> Result<Object, Error> {
        let token = self
            .next_token()?
            .ok_or_else(|| Error::MalformedSyntax("expected an object, found end of input".into()))?;
        self.object_from_token(token, length)
    }

    fn object_from_token(
        &mut self,
        token: Token,
        length: Option<LengthLookup>,
    ) -> Result<Object, Error> {
        match token {
            Token::Integer(i) => {
                // `N G R` lookahead: only if two more tokens form a reference.
                let save = self.pos;
                if i >= 0 && i <= u32::MAX as i64 {
                    if let Ok(Some(Token::Integer(gen))) = self.next_token() {
                        if (0..=u16::MAX as i64).contains(&gen) {
                            if let Ok(Some(tok)) = self.next_token() {
                                if tok.is_keyword(b"R") {
                                    return Ok(Object::Reference((i as u32, gen as u16)));
                                }
                            }
                        }
                    }
                }
                self.pos = save;
                Ok(Object::Integer(i))
            }
            Token::Real(r) => Ok(Object::Real(r)),
            Token::Name(n) => Ok(Object::Name(n)),
            Token::LiteralString(s) => Ok(Object::String(s, StringFormat::Literal)),
            Token::HexString(s) => Ok(Object::String(s, StringFormat::Hexadecimal)),
            Token::ArrayOpen => self.parse_array(length),
            Token::DictOpen => {
                let dict = self.parse_dictionary(length)?;
                // A dictionary followed by `stream` is a stream object.
                let save = self.pos;
                if let Ok(Some(tok)) = self.next_token() {
                    if tok.is_keyword(b"stream") {
                        return self.read_stream_payload(dict, length);
                    }
                }
                self.pos = save;
                Ok(Object::Dictionary(dict))
            }
            Token::Keyword(kw) => match kw.as_slice() {
                b"true" => Ok(Object::Boolean(true)),
                b"false" => Ok(Object::Boolean(false)),
                b"null" => Ok(Object::Null),
                other => Err(Error::MalformedSyntax(format!(
                    "unexpected keyword `{}` where an object was expected",
                    String::from_utf8_lossy(other)
                ))),
            },
            Token::ArrayClose | Token::DictClose | Token::ProcOpen | Token::ProcClose => {
                Err(Error::MalformedSyntax(
                    "unexpected closing delimiter where an object was expected".into(),
                ))
            }
        }
    }

    /// Called with the opening `[` already consumed.
    pub fn parse_array(&mut self, length: Option<LengthLookup>) -> Result<Object, Error> {
        let mut items = Vec::new();
        loop {
            let token = self.next_token()?.ok_or_else(|| {
                Error::MalformedSyntax("array not closed before end of input".into())
            })?;
            if token == Token::ArrayClose {
                return Ok(Object::Array(items));
            }
            items.push(self.object_from_token(token, length)?);
        }
    }

    /// Called with the opening `<<` already consumed.
    pub fn parse_dictionary(&mut self, length: Option<LengthLookup>) -> Result<Dictionary, Error> {
        let mut dict = Dictionary::new();
        loop {
            let token = self.next_token()?.ok_or_else(|| {
                Error::MalformedSyntax("dictionary not closed before end of input".into())
            })?;
            match token {
                Token::DictClose => return Ok(dict),
                Token::Name(key) => {
                    let value = self.next_object(length)?;
                    dict.set(key, value);
                }
                other => {
                    // Tolerate a stray non-name key by skipping it; real files
                    // produced by buggy generators contain these.
                    log::warn!("skipping non-name dictionary key {:?}", other);
                }
            }
        }
    }

    /// Called with the `stream` keyword consumed. The payload is `Length`
    /// bytes past the EOL after `stream`; when `Length` is absent, indirect
    /// and unresolvable, or provably wrong, falls back to scanning for
    /// `endstream`.
    fn read_stream_payload(
        &mut self,
        dict: Dictionary,
        length: Option<LengthLookup>,
    ) -> Result<Object, Error> {
        self.skip_eol();
        let start = self.pos;

        let declared = match dict.get(b"Length") {
            Some(Object::Integer(n)) if *n >= 0 => Some(*n as usize),
            Some(Object::Reference(id)) => length
                .and_then(|f| f(*id))
                .and_then(|n| usize::try_from(n).ok()),
            _ => None,
        };

        let len = match declared {
            Some(len) if self.payload_fits(start, len) => len,
            declared => {
                if declared.is_some() {
                    log::warn!("stream /Length does not line up with endstream, rescanning");
                }
                self.scan_for_endstream(start)?
            }
        };

        let content = self.data[start..start + len].to_vec();
        self.pos = start + len;
        self.skip_whitespace();
        if self.remaining().starts_with(b"endstream") {
            self.pos += b"endstream".len();
        } else {
            log::warn!("stream payload not terminated by endstream");
        }
        Ok(Object::Stream(Stream::new(dict, content)))
    }

    /// True when `endstream` follows within a few bytes of `start + len`.
    fn payload_fits(&self, start: usize, len: usize) -> bool {
        let end = match start.checked_add(len) {
            Some(e) if e <= self.data.len() => e,
            _ => return false,
        };
        let tail = &self.data[end..];
        let mut skip = 0;
        while skip < 4 && skip < tail.len() && is_whitespace(tail[skip]) {
            skip += 1;
        }
        tail[skip..].starts_with(b"endstream")
    }

    fn scan_for_endstream(&self, start: usize) -> Result<usize, Error> {
        let hay = &self.data[start..];
        let found = hay
            .windows(b"endstream".len())
            .position(|w| w == b"endstream")
            .ok_or_else(|| Error::MalformedSyntax("stream without endstream".into()))?;
        // trim the EOL that separates payload from the keyword
        let mut end = found;
        if end > 0 && hay[end - 1] == b'\n' {
            end -= 1;
        }
        if end > 0 && hay[end - 1] == b'\r' {
            end -= 1;
        }
        Ok(end)
    }

    /// Parses `N G obj … endobj` at `offset`.
    pub fn parse_indirect_object_at(
        data: &'a [u8],
        offset: usize,
        length: Option<LengthLookup>,
    ) -> Result<(ObjectId, Object), Error> {
        let mut lexer = Lexer::at(data, offset);
        let num = match lexer.next_token()? {
            Some(Token::Integer(n)) if n >= 0 => n as u32,
            other => {
                return Err(Error::MalformedSyntax(format!(
                    "expected object number at offset {offset}, found {other:?}"
                )))
            }
        };
        let gen = match lexer.next_token()? {
            Some(Token::Integer(g)) if (0..=u16::MAX as i64).contains(&g) => g as u16,
            other => {
                return Err(Error::MalformedSyntax(format!(
                    "expected generation number, found {other:?}"
                )))
            }
        };
        match lexer.next_token()? {
            Some(ref t) if t.is_keyword(b"obj") => {}
            other => {
                return Err(Error::MalformedSyntax(format!(
                    "expected `obj` keyword, found {other:?}"
                )))
            }
        }
        let object = lexer.next_object(length)?;
        let save = lexer.pos;
        match lexer.next_token() {
            Ok(Some(ref t)) if t.is_keyword(b"endobj") => {}
            _ => {
                // endobj is frequently missing in the wild; not fatal
                lexer.pos = save;
            }
        }
        Ok(((num, gen), object))
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_object(data: &[u8]) -> Object {
        Lexer::new(data).next_object(None).unwrap()
    }

    #[test]
    fn numbers() {
        assert_eq!(one_object(b"42"), Object::Integer(42));
        assert_eq!(one_object(b"-17"), Object::Integer(-17));
        assert_eq!(one_object(b"+3"), Object::Integer(3));
        assert_eq!(one_object(b"4."), Object::Real(4.0));
        assert_eq!(one_object(b"-.5"), Object::Real(-0.5));
        assert_eq!(one_object(b"3.14"), Object::Real(3.14));
    }

    #[test]
    fn names_with_hex_escapes() {
        assert_eq!(one_object(b"/Name1"), Object::name("Name1"));
        assert_eq!(one_object(b"/A#20B"), Object::name("A B"));
        assert_eq!(one_object(b"/#2F"), Object::name("/"));
        assert_eq!(one_object(b"/"), Object::name(""));
    }

    #[test]
    fn literal_string_escapes() {
        assert_eq!(
            one_object(b"(a\\(b\\)c)"),
            Object::string_literal(&b"a(b)c"[..])
        );
        assert_eq!(one_object(b"(\\101\\102)"), Object::string_literal(&b"AB"[..]));
        assert_eq!(one_object(b"(a\\\nb)"), Object::string_literal(&b"ab"[..]));
        assert_eq!(one_object(b"((nested))"), Object::string_literal(&b"(nested)"[..]));
        assert_eq!(one_object(b"(a\r\nb)"), Object::string_literal(&b"a\nb"[..]));
    }

    #[test]
    fn hex_string_odd_digit_pads_with_zero() {
        assert_eq!(
            one_object(b"<48656C6C6F>"),
            Object::String(b"Hello".to_vec(), StringFormat::Hexadecimal)
        );
        assert_eq!(
            one_object(b"<9 0 1 f a>"),
            Object::String(vec![0x90, 0x1F, 0xA0], StringFormat::Hexadecimal)
        );
    }

    #[test]
    fn reference_lookahead_does_not_eat_plain_integers() {
        let mut lexer = Lexer::new(b"[1 0 R 2 3]");
        let arr = lexer.next_object(None).unwrap();
        assert_eq!(
            arr,
            Object::Array(vec![
                Object::Reference((1, 0)),
                Object::Integer(2),
                Object::Integer(3),
            ])
        );
    }

    #[test]
    fn dictionary_and_stream() {
        let data = b"<< /Type /XObject /Length 5 >>\nstream\nHello\nendstream";
        let obj = one_object(data);
        let stream = obj.as_stream().unwrap();
        assert_eq!(stream.content, b"Hello");
        assert_eq!(
            stream.dict.get(b"Type").and_then(|t| t.as_name()),
            Some(&b"XObject"[..])
        );
    }

    #[test]
    fn stream_with_wrong_length_rescans() {
        let data = b"<< /Length 99 >>\nstream\nHi\nendstream";
        let obj = one_object(data);
        assert_eq!(obj.as_stream().unwrap().content, b"Hi");
    }

    #[test]
    fn comments_are_whitespace() {
        assert_eq!(one_object(b"% a comment\n 7"), Object::Integer(7));
    }

    #[test]
    fn indirect_object() {
        let data = b"12 0 obj << /K 1 >> endobj";
        let ((num, gen), obj) = Lexer::parse_indirect_object_at(data, 0, None).unwrap();
        assert_eq!((num, gen), (12, 0));
        assert_eq!(obj.as_dict().unwrap().get(b"K"), Some(&Object::Integer(1)));
    }

    #[test]
    fn unclosed_array_is_malformed() {
        assert!(matches!(
            Lexer::new(b"[1 2 3").next_object(None),
            Err(Error::MalformedSyntax(_))
        ));
    }
}
