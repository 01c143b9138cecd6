//! document.rs
//!
//! The document façade: owns the file bytes, the cross-reference table, the
//! trailer, the security handler and the memoised object table. Pages, page
//! attribute inheritance and resource merging live here too.
//!
//! A `PdfDocument` is single-task: resolution caches use interior
//! mutability and are not synchronised. Rendering independent documents in
//! parallel is fine; sharing one document across threads is not.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::encryption::SecurityHandler;
use crate::error::Error;
use crate::lexer::Lexer;
use crate::object::{Dictionary, Object, ObjectId};
use crate::xref::{self, XrefEntry, XrefTable};

/// How far into the file the `%PDF-x.y` header may sit.
const HEADER_SEARCH_WINDOW: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Attempt the `N G obj` scan when the xref data is broken.
    pub rebuild_xref: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { rebuild_xref: true }
    }
}

/// Attribute names that inherit down the page tree.
pub const INHERITABLE_PAGE_KEYS: [&[u8]; 4] = [b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

/// Resource subdictionaries merged across the ancestor chain.
const RESOURCE_KEYS: [&[u8]; 7] = [
    b"Font",
    b"XObject",
    b"ColorSpace",
    b"Pattern",
    b"Shading",
    b"ExtGState",
    b"Properties",
];

pub struct PdfDocument {
    data: Vec<u8>,
    /// Header version, e.g. "1.7".
    pub version: String,
    pub trailer: Dictionary,
    xref: XrefTable,
    security: Option<SecurityHandler>,
    /// Object id of the Encrypt dictionary; its strings are never decrypted.
    encrypt_ref: Option<ObjectId>,
    /// Editor-side replacements, consulted before the file.
    overrides: RefCell<HashMap<ObjectId, Rc<Object>>>,
    cache: RefCell<HashMap<ObjectId, Rc<Object>>>,
    /// Decoded object streams: container number -> (object id, position in
    /// the decoded bytes of each contained object).
    objstm_cache: RefCell<HashMap<u32, Rc<Vec<(ObjectId, Object)>>>>,
    /// Objects currently being resolved, to cut reference cycles.
    resolving: RefCell<HashSet<ObjectId>>,
    page_list: RefCell<Option<Rc<Vec<ObjectId>>>>,
    pub(crate) font_cache: RefCell<HashMap<ObjectId, Rc<crate::font::PdfFont>>>,
    pub modified: bool,
}

impl PdfDocument {
    /// Opens a document with no password.
    pub fn open(data: Vec<u8>) -> Result<PdfDocument, Error> {
        Self::open_with(data, b"", &ParseOptions::default())
    }

    pub fn open_with_password(data: Vec<u8>, password: &[u8]) -> Result<PdfDocument, Error> {
        Self::open_with(data, password, &ParseOptions::default())
    }

    pub fn open_with(
        data: Vec<u8>,
        password: &[u8],
        opts: &ParseOptions,
    ) -> Result<PdfDocument, Error> {
        let version = parse_header(&data)?;

        let (xref_table, trailer) = match xref::parse(&data) {
            Ok(parsed) => parsed,
            Err(Error::InvalidTrailer) if !opts.rebuild_xref => return Err(Error::InvalidTrailer),
            Err(e @ (Error::InvalidXref(_) | Error::InvalidTrailer | Error::MalformedSyntax(_))) => {
                if !opts.rebuild_xref {
                    return Err(e);
                }
                let (table, trailer) = xref::rebuild(&data);
                match trailer {
                    Some(t) if !table.is_empty() => (table, t),
                    _ => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };

        let mut doc = PdfDocument {
            data,
            version,
            trailer,
            xref: xref_table,
            security: None,
            encrypt_ref: None,
            overrides: RefCell::new(HashMap::new()),
            cache: RefCell::new(HashMap::new()),
            objstm_cache: RefCell::new(HashMap::new()),
            resolving: RefCell::new(HashSet::new()),
            page_list: RefCell::new(None),
            font_cache: RefCell::new(HashMap::new()),
            modified: false,
        };

        // Security gate: resolve just the Encrypt dictionary (no decryption
        // is active yet, so its own strings come through raw), authenticate,
        // then drop everything resolved so far and replay with decryption.
        if let Some(encrypt_obj) = doc.trailer.get(b"Encrypt").cloned() {
            let encrypt_ref = encrypt_obj.as_reference();
            let encrypt_dict = doc
                .resolve(&encrypt_obj)?
                .as_dict()
                .cloned()
                .ok_or_else(|| Error::InvalidXref("Encrypt is not a dictionary".into()))?;
            let file_id = doc
                .trailer
                .get(b"ID")
                .and_then(|id| id.as_array())
                .and_then(|a| a.first())
                .and_then(|o| o.as_string())
                .unwrap_or(&[])
                .to_vec();
            let handler = SecurityHandler::open(&encrypt_dict, &file_id, password)?;
            doc.security = Some(handler);
            doc.encrypt_ref = encrypt_ref;
            doc.cache.borrow_mut().clear();
            doc.objstm_cache.borrow_mut().clear();
        }

        Ok(doc)
    }

    pub fn is_encrypted(&self) -> bool {
        self.security.is_some()
    }

    pub fn permissions(&self) -> Option<crate::encryption::Permissions> {
        self.security.as_ref().map(|s| s.permissions)
    }

    /// Memoised resolution of `(num, gen)` through the xref table, the
    /// editor overrides and the object-stream expansion.
    pub fn get_object(&self, id: ObjectId) -> Result<Rc<Object>, Error> {
        if let Some(obj) = self.overrides.borrow().get(&id) {
            return Ok(obj.clone());
        }
        if let Some(obj) = self.cache.borrow().get(&id) {
            return Ok(obj.clone());
        }
        if !self.resolving.borrow_mut().insert(id) {
            log::warn!("reference cycle while resolving {} {} R", id.0, id.1);
            return Err(Error::MissingObject(id.0, id.1));
        }
        let result = self.load_object(id);
        self.resolving.borrow_mut().remove(&id);
        let obj = Rc::new(result?);
        self.cache.borrow_mut().insert(id, obj.clone());
        Ok(obj)
    }

    fn load_object(&self, id: ObjectId) -> Result<Object, Error> {
        let entry = *self.xref.get(id.0).ok_or(Error::MissingObject(id.0, id.1))?;
        match entry {
            XrefEntry::Free { .. } => Err(Error::MissingObject(id.0, id.1)),
            XrefEntry::InUse { offset, gen } => {
                if gen != id.1 {
                    log::warn!(
                        "generation mismatch for object {}: requested {}, table has {}",
                        id.0,
                        id.1,
                        gen
                    );
                }
                let lookup = |length_id: ObjectId| -> Option<i64> {
                    self.get_object(length_id).ok().and_then(|o| o.as_i64())
                };
                let ((num, _), mut obj) =
                    Lexer::parse_indirect_object_at(&self.data, offset as usize, Some(&lookup))?;
                if num != id.0 {
                    log::warn!(
                        "xref points {} {} R at an object labelled {num}",
                        id.0,
                        id.1
                    );
                }
                if let Some(security) = &self.security {
                    let is_encrypt_dict = self.encrypt_ref == Some(id);
                    let is_xref_stream = obj
                        .as_stream()
                        .map(|s| s.dict.get(b"Type").and_then(|t| t.as_name()) == Some(b"XRef"))
                        .unwrap_or(false);
                    if !is_encrypt_dict && !is_xref_stream {
                        security.decrypt_object(id, &mut obj);
                    }
                }
                Ok(obj)
            }
            XrefEntry::Compressed { container, index } => {
                let objects = self.expand_object_stream(container)?;
                objects
                    .iter()
                    .find(|((num, _), _)| *num == id.0)
                    .or_else(|| objects.get(index as usize))
                    .map(|(_, obj)| obj.clone())
                    .ok_or(Error::MissingObject(id.0, id.1))
            }
        }
    }

    /// Decodes `/Type /ObjStm` number `container`: an `N`-pair header
    /// `(num offset)*` followed by the concatenated objects at
    /// `First + offset`. Contained objects inherit the container's
    /// decryption and are never decrypted individually.
    fn expand_object_stream(&self, container: u32) -> Result<Rc<Vec<(ObjectId, Object)>>, Error> {
        if let Some(cached) = self.objstm_cache.borrow().get(&container) {
            return Ok(cached.clone());
        }
        let container_obj = self.get_object((container, 0))?;
        let stream = container_obj
            .as_stream()
            .ok_or_else(|| Error::CorruptStream(format!("object stream {container} is not a stream")))?;
        let n = stream
            .dict
            .get(b"N")
            .and_then(|n| n.as_i64())
            .ok_or_else(|| Error::CorruptStream("object stream without N".into()))?;
        let first = stream
            .dict
            .get(b"First")
            .and_then(|f| f.as_i64())
            .ok_or_else(|| Error::CorruptStream("object stream without First".into()))?
            as usize;
        let decoded = stream.decoded_content()?.to_vec();

        let mut header = Lexer::new(&decoded);
        let mut pairs = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let num = match header.next_token() {
                Ok(Some(crate::lexer::Token::Integer(v))) if v >= 0 => v as u32,
                other => {
                    return Err(Error::CorruptStream(format!(
                        "bad object stream header entry: {other:?}"
                    )))
                }
            };
            let offset = match header.next_token() {
                Ok(Some(crate::lexer::Token::Integer(v))) if v >= 0 => v as usize,
                other => {
                    return Err(Error::CorruptStream(format!(
                        "bad object stream header offset: {other:?}"
                    )))
                }
            };
            pairs.push((num, offset));
        }

        let mut objects = Vec::with_capacity(pairs.len());
        for (num, offset) in pairs {
            let pos = first + offset;
            if pos >= decoded.len() {
                log::warn!("object {num} points past the end of its object stream");
                continue;
            }
            match Lexer::at(&decoded, pos).next_object(None) {
                Ok(obj) => objects.push(((num, 0u16), obj)),
                Err(e) => log::warn!("skipping unreadable object {num} in object stream: {e}"),
            }
        }
        let objects = Rc::new(objects);
        self.objstm_cache
            .borrow_mut()
            .insert(container, objects.clone());
        Ok(objects)
    }

    /// Follows reference chains until a non-reference object (bounded, so a
    /// reference loop degrades into `MissingObject` rather than a hang).
    pub fn resolve(&self, obj: &Object) -> Result<Rc<Object>, Error> {
        let mut current = match obj {
            Object::Reference(id) => self.get_object(*id)?,
            other => return Ok(Rc::new(other.clone())),
        };
        for _ in 0..32 {
            match current.as_reference() {
                Some(id) => current = self.get_object(id)?,
                None => return Ok(current),
            }
        }
        Err(Error::MalformedSyntax("reference chain too deep".into()))
    }

    /// Resolves a dictionary value in one step.
    pub fn resolve_dict_value(&self, dict: &Dictionary, key: &[u8]) -> Option<Rc<Object>> {
        dict.get(key).and_then(|v| self.resolve(v).ok())
    }

    pub fn catalog(&self) -> Result<Rc<Object>, Error> {
        let root = self
            .trailer
            .get(b"Root")
            .ok_or_else(|| Error::InvalidXref("trailer has no Root".into()))?;
        self.resolve(root)
    }

    /// The trailer `/Info` dictionary, if any.
    pub fn info(&self) -> Option<Rc<Object>> {
        let info = self.trailer.get(b"Info")?;
        self.resolve(info).ok()
    }

    /// Page object ids in document order: a depth-first walk of the Pages
    /// tree, skipping null or unreadable subtrees.
    pub fn pages(&self) -> Rc<Vec<ObjectId>> {
        if let Some(list) = self.page_list.borrow().as_ref() {
            return list.clone();
        }
        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        if let Ok(catalog) = self.catalog() {
            if let Some(pages_ref) = catalog.as_dict().and_then(|d| d.get(b"Pages")) {
                self.collect_pages(pages_ref, &mut pages, &mut visited);
            }
        }
        let pages = Rc::new(pages);
        *self.page_list.borrow_mut() = Some(pages.clone());
        pages
    }

    fn collect_pages(
        &self,
        node: &Object,
        pages: &mut Vec<ObjectId>,
        visited: &mut HashSet<ObjectId>,
    ) {
        let id = match node.as_reference() {
            Some(id) => id,
            None => return,
        };
        if !visited.insert(id) {
            log::warn!("page tree cycle at {} {} R", id.0, id.1);
            return;
        }
        let dict = match self.get_object(id).ok().and_then(|o| {
            o.as_dict().cloned()
        }) {
            Some(d) => d,
            None => return,
        };
        match dict.get(b"Type").and_then(|t| t.as_name()) {
            Some(b"Page") => pages.push(id),
            Some(b"Pages") | None => {
                if let Some(kids) = dict.get(b"Kids").and_then(|k| {
                    self.resolve(k).ok()
                }) {
                    if let Some(kids) = kids.as_array() {
                        for kid in kids {
                            self.collect_pages(kid, pages, visited);
                        }
                    }
                }
            }
            Some(other) => {
                log::warn!(
                    "unexpected node type {:?} in the page tree",
                    String::from_utf8_lossy(other)
                );
            }
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages().len()
    }

    pub fn page_id(&self, index: usize) -> Result<ObjectId, Error> {
        self.pages()
            .get(index)
            .copied()
            .ok_or_else(|| Error::MissingObject(0, 0))
    }

    pub fn page_dict(&self, index: usize) -> Result<Dictionary, Error> {
        let id = self.page_id(index)?;
        self.get_object(id)?
            .as_dict()
            .cloned()
            .ok_or(Error::MissingObject(id.0, id.1))
    }

    /// First non-null value of `key` along the page's ancestor chain.
    pub fn page_inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<Rc<Object>> {
        let mut current = page_id;
        for _ in 0..64 {
            let dict = self.get_object(current).ok()?.as_dict().cloned()?;
            if let Some(value) = dict.get(key) {
                if !value.is_null() {
                    return self.resolve(value).ok();
                }
            }
            current = dict.get(b"Parent")?.as_reference()?;
        }
        log::warn!("page ancestor chain deeper than 64, giving up");
        None
    }

    /// MediaBox as `[llx, lly, urx, ury]`, defaulting to US Letter when the
    /// tree carries none.
    pub fn page_media_box(&self, page_id: ObjectId) -> [f32; 4] {
        self.page_inherited(page_id, b"MediaBox")
            .as_deref()
            .and_then(rect_from_object)
            .unwrap_or([0.0, 0.0, 612.0, 792.0])
    }

    pub fn page_crop_box(&self, page_id: ObjectId) -> Option<[f32; 4]> {
        self.page_inherited(page_id, b"CropBox")
            .as_deref()
            .and_then(rect_from_object)
    }

    /// Rotation normalised to a multiple of 90 in `0..360`.
    pub fn page_rotation(&self, page_id: ObjectId) -> i32 {
        let raw = self
            .page_inherited(page_id, b"Rotate")
            .and_then(|r| r.as_i64())
            .unwrap_or(0);
        (((raw / 90 * 90) % 360 + 360) % 360) as i32
    }

    /// Merged resources: walking page → root, the first writer of each
    /// resource subkey (`Font`, `XObject`, …) wins.
    pub fn page_resources(&self, page_id: ObjectId) -> Dictionary {
        let mut merged = Dictionary::new();
        let mut current = Some(page_id);
        for _ in 0..64 {
            let id = match current {
                Some(id) => id,
                None => break,
            };
            let dict = match self.get_object(id).ok().and_then(|o| o.as_dict().cloned()) {
                Some(d) => d,
                None => break,
            };
            if let Some(res) = self
                .resolve_dict_value(&dict, b"Resources")
                .and_then(|r| r.as_dict().cloned())
            {
                for key in RESOURCE_KEYS {
                    if merged.has(key) {
                        continue;
                    }
                    if let Some(sub) = res.get(key) {
                        if let Ok(resolved) = self.resolve(sub) {
                            merged.set(key.to_vec(), (*resolved).clone());
                        }
                    }
                }
            }
            current = dict.get(b"Parent").and_then(|p| p.as_reference());
        }
        merged
    }

    /// The ordered content streams of a page (a single stream or an array).
    pub fn page_contents(&self, page_id: ObjectId) -> Vec<(ObjectId, Rc<Object>)> {
        let dict = match self.get_object(page_id).ok().and_then(|o| o.as_dict().cloned()) {
            Some(d) => d,
            None => return Vec::new(),
        };
        let contents = match dict.get(b"Contents") {
            Some(c) => c.clone(),
            None => return Vec::new(),
        };
        let mut streams = Vec::new();
        match contents {
            Object::Reference(id) => {
                if let Ok(obj) = self.resolve(&contents) {
                    if obj.as_stream().is_some() {
                        streams.push((id, obj));
                    } else if let Some(arr) = obj.as_array() {
                        // Contents referencing an array of streams
                        for item in arr {
                            if let (Some(id), Ok(obj)) = (item.as_reference(), self.resolve(item)) {
                                if obj.as_stream().is_some() {
                                    streams.push((id, obj));
                                }
                            }
                        }
                    }
                }
            }
            Object::Array(ref arr) => {
                for item in arr {
                    if let (Some(id), Ok(obj)) = (item.as_reference(), self.resolve(item)) {
                        if obj.as_stream().is_some() {
                            streams.push((id, obj));
                        }
                    }
                }
            }
            _ => {}
        }
        streams
    }

    /// All content streams of a page decoded and joined with newlines, the
    /// form the interpreter consumes.
    pub fn page_content_bytes(&self, page_id: ObjectId) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        for (_, obj) in self.page_contents(page_id) {
            let stream = obj.as_stream().expect("page_contents returns streams");
            match stream.decoded_content() {
                Ok(bytes) => {
                    if !out.is_empty() {
                        out.push(b'\n');
                    }
                    out.extend_from_slice(bytes);
                }
                Err(e) => log::warn!("skipping undecodable content stream: {e}"),
            }
        }
        Ok(out)
    }

    /// Installs an editor-side replacement for an object. The original file
    /// bytes are left untouched; `save` picks the override up.
    pub fn set_object(&mut self, id: ObjectId, obj: Object) {
        self.overrides.borrow_mut().insert(id, Rc::new(obj));
        self.cache.borrow_mut().remove(&id);
        self.modified = true;
    }

    /// Allocates an unused object number (for streams the editor appends).
    pub fn allocate_object_id(&self) -> ObjectId {
        let mut max = self.xref.size.saturating_sub(1);
        for (num, _) in self.xref.in_use_entries() {
            max = max.max(num);
        }
        for (num, _) in self.overrides.borrow().keys() {
            max = max.max(*num);
        }
        (max + 1, 0)
    }

    pub fn xref(&self) -> &XrefTable {
        &self.xref
    }

    pub fn original_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn overrides(&self) -> Vec<(ObjectId, Rc<Object>)> {
        let mut v: Vec<_> = self
            .overrides
            .borrow()
            .iter()
            .map(|(id, obj)| (*id, obj.clone()))
            .collect();
        v.sort_by_key(|(id, _)| *id);
        v
    }

    /// Serialises the document; see [`crate::writer`].
    pub fn save(&self, opts: &crate::writer::SaveOptions) -> Result<Vec<u8>, Error> {
        crate::writer::save_document(self, opts)
    }
}

fn parse_header(data: &[u8]) -> Result<String, Error> {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    let pos = window
        .windows(5)
        .position(|w| w == b"%PDF-")
        .ok_or(Error::InvalidHeader)?;
    let rest = &window[pos + 5..];
    let end = rest
        .iter()
        .position(|b| !(b.is_ascii_digit() || *b == b'.'))
        .unwrap_or(rest.len());
    let version = String::from_utf8_lossy(&rest[..end]).into_owned();
    if version.is_empty() {
        return Err(Error::InvalidHeader);
    }
    Ok(version)
}

fn rect_from_object(obj: &Object) -> Option<[f32; 4]> {
    let arr = obj.as_array()?;
    if arr.len() != 4 {
        return None;
    }
    let mut rect = [0f32; 4];
    for (slot, item) in rect.iter_mut().zip(arr) {
        *slot = item.as_f32()?;
    }
    // normalise so (llx, lly) really is the lower left
    if rect[0] > rect[2] {
        rect.swap(0, 2);
    }
    if rect[1] > rect[3] {
        rect.swap(1, 3);
    }
    Some(rect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_parsing() {
        assert_eq!(parse_header(b"%PDF-1.4\nrest").unwrap(), "1.4");
        assert_eq!(parse_header(b"garbage\n%PDF-2.0\n").unwrap(), "2.0");
        assert!(matches!(parse_header(b"not a pdf"), Err(Error::InvalidHeader)));
    }

    #[test]
    fn rotation_normalisation() {
        // covered end-to-end in tests/, here just the arithmetic
        let norm = |raw: i64| (((raw / 90 * 90) % 360 + 360) % 360) as i32;
        assert_eq!(norm(90), 90);
        assert_eq!(norm(450), 90);
        assert_eq!(norm(-90), 270);
        assert_eq!(norm(95), 90);
    }
}
