//! content.rs
//!
//! Content streams as a lazy sequence of `(operator, operands)` pairs. The
//! iterator is restartable (re-parse the same bytes) and never fails: junk
//! bytes become instructions with an unrecognisable operator that the
//! interpreter logs and skips. Inline images (`BI … ID … EI`) are folded
//! into a single instruction so the interpreter sees them as one event.

use smallvec::SmallVec;

use crate::lexer::{is_whitespace, Lexer, Token};
use crate::object::{Dictionary, Object, StringFormat};

/// One content instruction. Operand lists are short in practice (`TJ` packs
/// its payload into a single array operand), hence the inline vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentInstruction {
    pub operator: String,
    pub operands: SmallVec<[Object; 4]>,
}

impl ContentInstruction {
    pub fn new<O: Into<String>>(operator: O, operands: Vec<Object>) -> ContentInstruction {
        ContentInstruction {
            operator: operator.into(),
            operands: SmallVec::from_vec(operands),
        }
    }
}

/// Lazy instruction iterator over decoded content-stream bytes.
pub struct ContentIter<'a> {
    lexer: Lexer<'a>,
    operands: SmallVec<[Object; 4]>,
    done: bool,
}

impl<'a> ContentIter<'a> {
    pub fn new(data: &'a [u8]) -> ContentIter<'a> {
        ContentIter {
            lexer: Lexer::new(data),
            operands: SmallVec::new(),
            done: false,
        }
    }

    /// `BI` was consumed: key/value pairs until `ID`, then raw bytes until
    /// a whitespace-delimited `EI`.
    fn parse_inline_image(&mut self) -> Option<ContentInstruction> {
        let mut dict = Dictionary::new();
        loop {
            match self.lexer.next_token() {
                Ok(Some(Token::Name(key))) => {
                    match self.lexer.next_object(None) {
                        Ok(value) => dict.set(key, value),
                        Err(_) => break,
                    }
                }
                Ok(Some(ref t)) if t.is_keyword(b"ID") => break,
                Ok(Some(_)) => continue,
                _ => {
                    self.done = true;
                    return None;
                }
            }
        }
        // exactly one whitespace byte separates ID from the data
        let data = self.lexer.remaining();
        let start = usize::from(data.first().map(|b| is_whitespace(*b)).unwrap_or(false));
        let mut end = start;
        let bytes = &data[start..];
        let mut found = None;
        for i in 0..bytes.len().saturating_sub(1) {
            if bytes[i] == b'E' && bytes[i + 1] == b'I' {
                let before_ok = i == 0 || is_whitespace(bytes[i - 1]);
                let after_ok = bytes
                    .get(i + 2)
                    .map(|b| is_whitespace(*b) || crate::lexer::is_delimiter(*b))
                    .unwrap_or(true);
                if before_ok && after_ok {
                    found = Some(i);
                    break;
                }
            }
        }
        let image_data = match found {
            Some(i) => {
                let mut len = i;
                // drop the single EOL/space between data and EI
                if len > 0 && is_whitespace(bytes[len - 1]) {
                    len -= 1;
                    if len > 0 && bytes[len - 1] == b'\r' && bytes[len] == b'\n' {
                        len -= 1;
                    }
                }
                end = start + i + 2;
                bytes[..len].to_vec()
            }
            None => {
                self.done = true;
                bytes.to_vec()
            }
        };
        let pos = self.lexer.pos() + end;
        self.lexer.seek(pos);

        let mut operands = SmallVec::new();
        operands.push(Object::Dictionary(dict));
        operands.push(Object::String(image_data, StringFormat::Hexadecimal));
        Some(ContentInstruction {
            operator: "BI".to_string(),
            operands,
        })
    }
}

impl<'a> Iterator for ContentIter<'a> {
    type Item = ContentInstruction;

    fn next(&mut self) -> Option<ContentInstruction> {
        if self.done {
            return None;
        }
        loop {
            let token = match self.lexer.next_token() {
                Ok(Some(t)) => t,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    // a truncated balanced construct ends interpretation cleanly
                    log::warn!("content stream ends mid-construct: {e}");
                    self.done = true;
                    return None;
                }
            };
            match token {
                Token::Integer(i) => self.operands.push(Object::Integer(i)),
                Token::Real(r) => self.operands.push(Object::Real(r)),
                Token::Name(n) => self.operands.push(Object::Name(n)),
                Token::LiteralString(s) => {
                    self.operands.push(Object::String(s, StringFormat::Literal))
                }
                Token::HexString(s) => self
                    .operands
                    .push(Object::String(s, StringFormat::Hexadecimal)),
                Token::ArrayOpen => match self.lexer.parse_array(None) {
                    Ok(arr) => self.operands.push(arr),
                    Err(e) => {
                        log::warn!("content stream ends inside an array: {e}");
                        self.done = true;
                        return None;
                    }
                },
                Token::DictOpen => match self.lexer.parse_dictionary(None) {
                    Ok(dict) => self.operands.push(Object::Dictionary(dict)),
                    Err(e) => {
                        log::warn!("content stream ends inside a dictionary: {e}");
                        self.done = true;
                        return None;
                    }
                },
                Token::ArrayClose | Token::DictClose | Token::ProcOpen | Token::ProcClose => {
                    // stray delimiter: surface it as an unknown operator
                    let op = ContentInstruction {
                        operator: "?".to_string(),
                        operands: std::mem::take(&mut self.operands),
                    };
                    return Some(op);
                }
                Token::Keyword(kw) => match kw.as_slice() {
                    b"true" => self.operands.push(Object::Boolean(true)),
                    b"false" => self.operands.push(Object::Boolean(false)),
                    b"null" => self.operands.push(Object::Null),
                    b"BI" => {
                        self.operands.clear();
                        match self.parse_inline_image() {
                            Some(instr) => return Some(instr),
                            None => return None,
                        }
                    }
                    _ => {
                        return Some(ContentInstruction {
                            operator: String::from_utf8_lossy(&kw).into_owned(),
                            operands: std::mem::take(&mut self.operands),
                        })
                    }
                },
            }
        }
    }
}

/// Serialises instructions back to content-stream bytes. Together with
/// [`ContentIter`] this is the editor's rewrite path: parse, mutate the
/// vector, serialise.
pub fn serialize_instructions(instructions: &[ContentInstruction]) -> Vec<u8> {
    let mut out = Vec::new();
    for instr in instructions {
        if instr.operator == "BI" {
            serialize_inline_image(instr, &mut out);
            continue;
        }
        for operand in &instr.operands {
            crate::writer::write_object(operand, &mut out);
            out.push(b' ');
        }
        out.extend_from_slice(instr.operator.as_bytes());
        out.push(b'\n');
    }
    out
}

fn serialize_inline_image(instr: &ContentInstruction, out: &mut Vec<u8>) {
    let (dict, data) = match (instr.operands.first(), instr.operands.get(1)) {
        (Some(Object::Dictionary(d)), Some(Object::String(data, _))) => (d, data),
        _ => return,
    };
    out.extend_from_slice(b"BI");
    for (key, value) in dict.iter() {
        out.push(b' ');
        crate::writer::write_name(key, out);
        out.push(b' ');
        crate::writer::write_object(value, out);
    }
    out.extend_from_slice(b" ID\n");
    out.extend_from_slice(data);
    out.extend_from_slice(b"\nEI\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(data: &[u8]) -> Vec<ContentInstruction> {
        ContentIter::new(data).collect()
    }

    #[test]
    fn simple_text_block() {
        let parsed = ops(b"BT /F1 12 Tf 72 720 Td (Hello) Tj ET");
        let operators: Vec<&str> = parsed.iter().map(|i| i.operator.as_str()).collect();
        assert_eq!(operators, vec!["BT", "Tf", "Td", "Tj", "ET"]);
        assert_eq!(
            parsed[1].operands.as_slice(),
            &[Object::name("F1"), Object::Integer(12)]
        );
        assert_eq!(
            parsed[3].operands.as_slice(),
            &[Object::string_literal(&b"Hello"[..])]
        );
    }

    #[test]
    fn tj_array_is_one_operand() {
        let parsed = ops(b"[(A) -120 (B)] TJ");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].operator, "TJ");
        let arr = parsed[0].operands[0].as_array().unwrap();
        assert_eq!(arr.len(), 3);
    }

    #[test]
    fn unknown_operator_is_surfaced_not_fatal() {
        let parsed = ops(b"1 2 frobnicate 0 0 m");
        assert_eq!(parsed[0].operator, "frobnicate");
        assert_eq!(parsed[0].operands.len(), 2);
        assert_eq!(parsed[1].operator, "m");
    }

    #[test]
    fn inline_image_is_one_event() {
        let parsed = ops(b"BI /W 2 /H 2 /BPC 8 /CS /G ID\n\x00\x01\x02\x03\nEI Q");
        assert_eq!(parsed[0].operator, "BI");
        let dict = parsed[0].operands[0].as_dict().unwrap();
        assert_eq!(dict.get(b"W").and_then(|w| w.as_i64()), Some(2));
        assert_eq!(
            parsed[0].operands[1].as_string(),
            Some(&[0u8, 1, 2, 3][..])
        );
        assert_eq!(parsed[1].operator, "Q");
    }

    #[test]
    fn restartable() {
        let data = b"q 1 0 0 1 10 10 cm Q";
        assert_eq!(ops(data), ops(data));
    }

    #[test]
    fn roundtrip_through_serializer() {
        let data = b"BT /F1 12 Tf (Hi \\(there\\)) Tj ET\n";
        let first = ops(data);
        let bytes = serialize_instructions(&first);
        assert_eq!(ops(&bytes), first);
    }
}
