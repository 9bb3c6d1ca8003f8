//! `Document`: an ordered, key-unique map stored as one encoded buffer.
//!
//! The buffer is always a complete, valid document: length prefix, elements
//! in iteration order, terminator. A side index of keys (an insertion-ordered
//! set) answers `contains_key`, `keys` and `len` without touching the bytes.
//!
//! # Mutation cost
//!
//! Appending a new key is amortized O(size of the new element). Overwriting
//! or removing a key rebuilds the buffer from every other element, which is
//! O(document size). The buffer never contains dead bytes, and an
//! overwritten key moves to the end of the iteration order.
//! Callers that assemble large documents should prefer [`Document::from_pairs`]
//! or [`Extend`] with fresh keys over repeated overwrites.

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexSet;
use tracing::{debug, error};

use crate::decoder::{self, DecodeOptions, RawElement, RawIter};
use crate::encoder::{self, EMPTY_DOCUMENT, LENGTH_PREFIX_SIZE};
use crate::error::{BsonError, Result};
use crate::types::Value;

/// An ordered BSON document backed by a single byte buffer.
///
/// `Clone` copies the buffer, so clones never observe each other's writes.
/// Equality and hashing are defined on the encoded bytes, which makes them
/// order-sensitive.
#[derive(Clone)]
pub struct Document {
    buf: Vec<u8>,
    keys: IndexSet<String>,
}

impl Document {
    /// An empty document (`05 00 00 00 00`).
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: EMPTY_DOCUMENT.to_vec(),
            keys: IndexSet::new(),
        }
    }

    /// Build a document from key/value pairs, in order.
    ///
    /// # Panics
    ///
    /// Panics if the same key appears twice. A literal list with duplicate
    /// keys is a programming error; use [`Document::try_from_pairs`] for
    /// pairs that come from data.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        match Self::try_from_pairs(pairs) {
            Ok(doc) => doc,
            Err(err) => panic!("cannot build document: {err}"),
        }
    }

    /// Build a document from key/value pairs, rejecting duplicate keys.
    pub fn try_from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut doc = Self::new();
        for (key, value) in pairs {
            let key = key.into();
            if doc.keys.contains(&key) {
                return Err(BsonError::DuplicateKey {
                    offset: doc.buf.len() - 1,
                    key,
                });
            }
            doc.append(&key, &value.into());
            doc.keys.insert(key);
        }
        Ok(doc)
    }

    /// Attach an encoded document, validating it with default limits.
    ///
    /// The bytes are stored verbatim; one decode pass checks every element
    /// and rebuilds the key index. Duplicate keys are rejected.
    ///
    /// Nesting deeper than [`DecodeOptions::DEFAULT_MAX_DEPTH`] embedded
    /// levels is rejected with [`BsonError::MaxDepthExceeded`], even for
    /// bytes exported by [`Document::raw_bytes`]. Re-import such documents
    /// with [`Document::from_bytes_with`] and a larger limit.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        Self::from_bytes_with(bytes, &DecodeOptions::default())
    }

    /// Attach an encoded document, validating it with explicit limits.
    pub fn from_bytes_with(bytes: impl Into<Vec<u8>>, options: &DecodeOptions) -> Result<Self> {
        let buf = bytes.into();
        match decoder::index_keys(&buf, options) {
            Ok(keys) => Ok(Self { buf, keys }),
            Err(err) => {
                debug!(%err, len = buf.len(), "rejected encoded document");
                Err(err)
            }
        }
    }

    /// Attach a buffer sliced out of another document's validated bytes.
    ///
    /// Only the top level is walked to rebuild the key index; nested
    /// documents were checked when the enclosing document was.
    pub(crate) fn from_trusted(buf: Vec<u8>) -> Result<Self> {
        let keys = RawIter::trusted(&buf)?
            .map(|element| element.map(|element| element.key().to_owned()))
            .collect::<Result<IndexSet<String>>>()?;
        Ok(Self { buf, keys })
    }

    /// Look up `key`, decoding its value.
    ///
    /// Returns `None` without scanning the buffer when the key is absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        if !self.keys.contains(key) {
            return None;
        }
        let element = self.elements().find(|element| element.key() == key)?;
        match element.value() {
            Ok(value) => Some(value),
            Err(err) => {
                error!(%err, key, "stored element failed to decode");
                None
            }
        }
    }

    /// `get(key)`, or `default` when the key is absent.
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// `get(key)`, or the result of `default` when the key is absent.
    /// `default` only runs on a miss.
    pub fn get_or_else<F>(&self, key: &str, default: F) -> Value
    where
        F: FnOnce() -> Value,
    {
        self.get(key).unwrap_or_else(default)
    }

    /// Set or delete `key`.
    ///
    /// - `Some(value)` for a new key appends it.
    /// - `Some(value)` for an existing key removes the old element and
    ///   appends the new one, so the key moves to the end.
    /// - `None` removes the key; removing an absent key does nothing.
    ///
    /// # Panics
    ///
    /// Panics if `key` contains a NUL byte or the document would exceed
    /// `i32::MAX` bytes.
    pub fn set(&mut self, key: &str, value: Option<Value>) {
        let Some(value) = value else {
            self.remove(key);
            return;
        };
        assert!(
            !key.as_bytes().contains(&0),
            "document key {key:?} contains a NUL byte"
        );
        if self.keys.contains(key) {
            self.strip(key);
        }
        self.append(key, &value);
        self.keys.insert(key.to_owned());
    }

    /// `set(key, Some(value))`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        self.set(&key, Some(value.into()));
    }

    /// Remove `key`, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        if !self.keys.contains(key) {
            return false;
        }
        self.strip(key);
        true
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Keys in iteration order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.keys.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The complete encoded document, terminator included.
    #[must_use]
    pub fn raw_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Space-separated lowercase hex of [`raw_bytes`](Self::raw_bytes).
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.buf
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Iterate `(key, value)` pairs in order, decoding each value.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            elements: self.elements(),
        }
    }

    /// A fresh cursor over the encoded elements. Values are not decoded
    /// until [`RawElement::value`] is called.
    #[must_use]
    pub fn raw_iter(&self) -> RawIter<'_> {
        match self.cursor() {
            Ok(cursor) => cursor,
            Err(err) => {
                error!(%err, "stored document header failed to decode");
                RawIter::exhausted()
            }
        }
    }

    fn cursor(&self) -> Result<RawIter<'_>> {
        RawIter::trusted(&self.buf)
    }

    pub(crate) fn elements(&self) -> Elements<'_> {
        Elements {
            raw: self.raw_iter(),
        }
    }

    /// Append one element at the end, keeping the buffer terminated.
    fn append(&mut self, key: &str, value: &Value) {
        // Step back over the terminator, write, then restore it. The
        // encoder has already counted it in the length prefix.
        self.buf.pop();
        encoder::write_element(&mut self.buf, key, value);
        self.buf.push(0x00);
    }

    /// Append an already-encoded element whose key is not yet present.
    pub(crate) fn append_raw(&mut self, element: &RawElement<'_>) {
        self.buf.pop();
        self.buf.extend_from_slice(element.raw());
        self.buf.push(0x00);
        let len = self.buf.len();
        encoder::patch_length(&mut self.buf, 0, len);
        self.keys.insert(element.key().to_owned());
    }

    /// Rebuild the buffer from every element except `key`.
    fn strip(&mut self, key: &str) {
        let mut buf = Vec::with_capacity(self.buf.len());
        buf.extend_from_slice(&EMPTY_DOCUMENT[..LENGTH_PREFIX_SIZE]);
        for element in self.elements() {
            if element.key() != key {
                buf.extend_from_slice(element.raw());
            }
        }
        buf.push(0x00);
        let len = buf.len();
        encoder::patch_length(&mut buf, 0, len);
        debug!(key, before = self.buf.len(), after = len, "rebuilt document without key");

        self.buf = buf;
        self.keys.shift_remove(key);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.buf == other.buf
    }
}

impl Eq for Document {}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.buf.hash(state);
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (String, Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Collects pairs like [`Document::from_pairs`], panicking on duplicate keys.
impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Inserts each pair with [`Document::set`] semantics.
impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Document {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// Raw elements of a document this crate owns. The buffer is known to be
/// well-formed, so a decode error means a bug; it is logged and ends the
/// iteration.
pub(crate) struct Elements<'a> {
    raw: RawIter<'a>,
}

impl<'a> Iterator for Elements<'a> {
    type Item = RawElement<'a>;

    fn next(&mut self) -> Option<RawElement<'a>> {
        match self.raw.next()? {
            Ok(element) => Some(element),
            Err(err) => {
                error!(%err, "stored document failed to decode");
                None
            }
        }
    }
}

/// Iterator over `(key, value)` pairs of a [`Document`].
pub struct Iter<'a> {
    elements: Elements<'a>,
}

impl Iterator for Iter<'_> {
    type Item = (String, Value);

    fn next(&mut self) -> Option<(String, Value)> {
        let element = self.elements.next()?;
        match element.value() {
            Ok(value) => Some((element.key().to_owned(), value)),
            Err(err) => {
                error!(%err, key = element.key(), "stored element failed to decode");
                self.elements.raw.stop();
                None
            }
        }
    }
}
