//! The PDF object model: a tagged value tree.
//!
//! Every value that can appear in a PDF file is an [`Object`]. Indirect
//! objects are stored once in the document's object table and addressed by
//! `(number, generation)`; everything else holds [`Object::Reference`] values
//! that look up through the table, so reference cycles (Pages parent
//! pointers, annotation targets) need no special handling.

use std::cell::OnceCell;
use std::fmt;

use indexmap::IndexMap;

/// `(object number, generation number)` of an indirect object.
pub type ObjectId = (u32, u16);

/// Whether a string was written `(literal)` or `<hex>`. Kept so the writer
/// can re-emit the original form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StringFormat {
    Literal,
    Hexadecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f32),
    /// Interned name bytes, `#xx` escapes already applied, without the leading `/`.
    Name(Vec<u8>),
    /// Raw string bytes (escapes applied) plus the original spelling.
    String(Vec<u8>, StringFormat),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(ObjectId),
}

impl Object {
    pub fn string_literal<S: Into<Vec<u8>>>(s: S) -> Object {
        Object::String(s.into(), StringFormat::Literal)
    }

    pub fn name<S: Into<Vec<u8>>>(s: S) -> Object {
        Object::Name(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Any numeric object as `f32`; integers are widened.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Object::Integer(i) => Some(*i as f32),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&[u8]> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Name bytes as UTF-8 (names are almost always ASCII).
    pub fn as_name_str(&self) -> Option<&str> {
        self.as_name().and_then(|n| std::str::from_utf8(n).ok())
    }

    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s, _) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Object>> {
        match self {
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The dictionary of a dictionary object or of a stream.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&mut s.dict),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_stream_mut(&mut self) -> Option<&mut Stream> {
        match self {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            Object::Reference(id) => Some(*id),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::Name(_) => "Name",
            Object::String(..) => "String",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream(_) => "Stream",
            Object::Reference(_) => "Reference",
        }
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Object {
        Object::Boolean(b)
    }
}

impl From<i64> for Object {
    fn from(i: i64) -> Object {
        Object::Integer(i)
    }
}

impl From<i32> for Object {
    fn from(i: i32) -> Object {
        Object::Integer(i as i64)
    }
}

impl From<f32> for Object {
    fn from(r: f32) -> Object {
        Object::Real(r)
    }
}

impl From<&str> for Object {
    fn from(s: &str) -> Object {
        Object::Name(s.as_bytes().to_vec())
    }
}

impl From<Vec<Object>> for Object {
    fn from(a: Vec<Object>) -> Object {
        Object::Array(a)
    }
}

impl From<Dictionary> for Object {
    fn from(d: Dictionary) -> Object {
        Object::Dictionary(d)
    }
}

impl From<Stream> for Object {
    fn from(s: Stream) -> Object {
        Object::Stream(s)
    }
}

/// A PDF dictionary. Iteration order is insertion order, which the writer
/// relies on for byte-deterministic output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary(IndexMap<Vec<u8>, Object>);

impl Dictionary {
    pub fn new() -> Dictionary {
        Dictionary(IndexMap::new())
    }

    pub fn get(&self, key: &[u8]) -> Option<&Object> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Object> {
        self.0.get_mut(key)
    }

    /// First present key out of `keys` (used for filter abbreviations like
    /// `/Filter` vs `/F` in inline images).
    pub fn get_any<'a>(&'a self, keys: &[&[u8]]) -> Option<&'a Object> {
        keys.iter().find_map(|k| self.0.get(*k))
    }

    pub fn has(&self, key: &[u8]) -> bool {
        self.0.contains_key(key)
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<Vec<u8>>,
        V: Into<Object>,
    {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Object> {
        self.0.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Vec<u8>, Object> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> indexmap::map::IterMut<'_, Vec<u8>, Object> {
        self.0.iter_mut()
    }
}

impl<K: Into<Vec<u8>>, V: Into<Object>> FromIterator<(K, V)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut dict = Dictionary::new();
        for (k, v) in iter {
            dict.set(k, v);
        }
        dict
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a Vec<u8>, &'a Object);
    type IntoIter = indexmap::map::Iter<'a, Vec<u8>, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A stream object: its dictionary plus the raw (still encoded) payload.
/// The decoded payload is computed lazily and cached.
#[derive(Clone)]
pub struct Stream {
    pub dict: Dictionary,
    /// Exactly `Length` bytes as they appear in the file (or as replaced by
    /// the text editor).
    pub content: Vec<u8>,
    decoded: OnceCell<Vec<u8>>,
}

impl Stream {
    pub fn new(mut dict: Dictionary, content: Vec<u8>) -> Stream {
        dict.set("Length", content.len() as i64);
        Stream {
            dict,
            content,
            decoded: OnceCell::new(),
        }
    }

    /// Runs the filter pipeline once and caches the result. Streams without
    /// a `/Filter` entry decode to their raw content.
    pub fn decoded_content(&self) -> Result<&[u8], crate::error::Error> {
        if let Some(v) = self.decoded.get() {
            return Ok(v);
        }
        let v = crate::filter::decode_stream(self)?;
        Ok(self.decoded.get_or_init(|| v))
    }

    /// Replaces the raw payload keeping the filter chain (used after
    /// decryption, where the bytes are still filtered).
    pub fn set_raw_content(&mut self, content: Vec<u8>) {
        self.dict.set("Length", content.len() as i64);
        self.content = content;
        self.decoded = OnceCell::new();
    }

    /// Replaces the payload, drops any filter chain and rebuilds `Length`.
    /// Used by the text editor, which always writes plain bodies back.
    pub fn set_plain_content(&mut self, content: Vec<u8>) {
        self.dict.remove(b"Filter");
        self.dict.remove(b"DecodeParms");
        self.dict.set("Length", content.len() as i64);
        self.content = content;
        self.decoded = OnceCell::new();
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("dict", &self.dict)
            .field("content_len", &self.content.len())
            .finish()
    }
}

impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        self.dict == other.dict && self.content == other.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dictionary_preserves_insertion_order() {
        let mut dict = Dictionary::new();
        dict.set("Zebra", 1i64);
        dict.set("Apple", 2i64);
        dict.set("Mango", 3i64);
        let keys: Vec<&[u8]> = dict.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![&b"Zebra"[..], &b"Apple"[..], &b"Mango"[..]]);
    }

    #[test]
    fn stream_dict_accessible_through_object() {
        let stream = Stream::new(
            Dictionary::from_iter(vec![("Type", Object::name("XObject"))]),
            vec![1, 2, 3],
        );
        let obj = Object::Stream(stream);
        assert_eq!(
            obj.as_dict().and_then(|d| d.get(b"Type")).and_then(|t| t.as_name()),
            Some(&b"XObject"[..])
        );
        assert_eq!(
            obj.as_dict().and_then(|d| d.get(b"Length")).and_then(|l| l.as_i64()),
            Some(3)
        );
    }

    #[test]
    fn numeric_widening() {
        assert_eq!(Object::Integer(42).as_f32(), Some(42.0));
        assert_eq!(Object::Real(1.5).as_f32(), Some(1.5));
        assert_eq!(Object::Null.as_f32(), None);
    }
}
