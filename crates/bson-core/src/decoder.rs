//! Streaming decoder: walks an encoded document one element at a time.
//!
//! The decoder never trusts its input. Every read is bounds-checked against
//! the enclosing document, and malformed bytes surface as a [`BsonError`]
//! instead of a panic, so buffers from disk or the network can be fed
//! straight in.
//!
//! # Key design decisions
//!
//! - **Borrowed, copyable cursor**: [`RawIter`] is a position into a shared
//!   `&[u8]`. Copying it forks an independent cursor; the borrow keeps the
//!   buffer immutable for as long as any cursor is alive.
//! - **Static dispatch**: the type tag selects a [`PayloadReader`] from a
//!   fixed table (`payload_reader`). Readers only measure and bounds-check a
//!   payload; turning it into a [`Value`] is deferred to
//!   [`RawElement::value`], so skipping an element never allocates.
//! - **Lazy nesting**: an embedded document is sliced by its own length
//!   prefix and only parsed when the caller materializes it.

use indexmap::IndexSet;
use tracing::trace;

use crate::document::Document;
use crate::encoder::{EMPTY_DOCUMENT, LENGTH_PREFIX_SIZE};
use crate::error::{BsonError, Result};
use crate::types::{ElementType, Value};

/// Smallest valid document: length prefix plus terminator.
const MIN_DOCUMENT_SIZE: usize = LENGTH_PREFIX_SIZE + 1;

/// Limits applied when decoding untrusted bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// How many levels of embedded documents may appear below the top-level
    /// document. `0` rejects any embedded document.
    pub max_depth: usize,
}

impl DecodeOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Measures a payload starting at the front of `avail` and returns its
/// length in bytes. `offset` is the absolute position of the payload, used
/// only for error reporting.
pub type PayloadReader = fn(avail: &[u8], offset: usize) -> Result<usize>;

/// Dispatch table from type tag to payload reader.
#[must_use]
pub fn payload_reader(element_type: ElementType) -> PayloadReader {
    match element_type {
        ElementType::String => read_string_payload,
        ElementType::Document => read_document_payload,
        ElementType::Int32 => read_int32_payload,
        ElementType::Int64 => read_int64_payload,
    }
}

fn fixed_width(type_name: &'static str, size: usize, avail: &[u8], offset: usize) -> Result<usize> {
    if avail.len() < size {
        return Err(BsonError::TruncatedValue {
            type_name,
            offset,
            needed: size,
            available: avail.len(),
        });
    }
    Ok(size)
}

fn read_int32_payload(avail: &[u8], offset: usize) -> Result<usize> {
    fixed_width("int32", 4, avail, offset)
}

fn read_int64_payload(avail: &[u8], offset: usize) -> Result<usize> {
    fixed_width("int64", 8, avail, offset)
}

/// `len:i32  bytes  0x00`, where `len` counts the bytes plus the terminator.
fn read_string_payload(avail: &[u8], offset: usize) -> Result<usize> {
    let declared = read_prefix("string", avail, offset)?;
    if declared < 1 {
        return Err(BsonError::InvalidStringLength { offset });
    }
    let total = LENGTH_PREFIX_SIZE + declared as usize;
    fixed_width("string", total, avail, offset)?;
    if avail[total - 1] != 0x00 {
        return Err(BsonError::InvalidStringLength { offset });
    }
    if std::str::from_utf8(&avail[LENGTH_PREFIX_SIZE..total - 1]).is_err() {
        return Err(BsonError::InvalidUtf8 {
            offset: offset + LENGTH_PREFIX_SIZE,
        });
    }
    Ok(total)
}

/// An embedded document is measured by its own length prefix. Its contents
/// are checked when it is validated or materialized, not here.
fn read_document_payload(avail: &[u8], offset: usize) -> Result<usize> {
    let declared = read_prefix("document", avail, offset)?;
    if declared < MIN_DOCUMENT_SIZE as i32 {
        return Err(BsonError::InvalidLength {
            offset,
            declared: i64::from(declared),
            available: avail.len(),
        });
    }
    fixed_width("document", declared as usize, avail, offset)
}

fn read_prefix(type_name: &'static str, avail: &[u8], offset: usize) -> Result<i32> {
    match avail.first_chunk::<LENGTH_PREFIX_SIZE>() {
        Some(raw) => Ok(i32::from_le_bytes(*raw)),
        None => Err(BsonError::TruncatedValue {
            type_name,
            offset,
            needed: LENGTH_PREFIX_SIZE,
            available: avail.len(),
        }),
    }
}

/// Nesting budget carried by a cursor and handed to the elements it yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Depth {
    /// The buffer belongs to a `Document` and was validated in full when it
    /// was built or imported.
    Trusted,
    /// Untrusted bytes with this many embedded levels left.
    Remaining(usize),
}

/// One undecoded element: a borrowed key plus the raw payload bytes.
#[derive(Debug, Clone, Copy)]
pub struct RawElement<'a> {
    key: &'a str,
    element_type: ElementType,
    raw: &'a [u8],
    payload_start: usize,
    offset: usize,
    depth: Depth,
}

impl<'a> RawElement<'a> {
    #[must_use]
    pub fn key(&self) -> &'a str {
        self.key
    }

    #[must_use]
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// The whole encoded element: tag, key, terminator and payload.
    #[must_use]
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Just the type-specific payload.
    #[must_use]
    pub fn payload(&self) -> &'a [u8] {
        &self.raw[self.payload_start..]
    }

    /// Absolute offset of the element's tag byte.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Materialize the payload as a [`Value`].
    ///
    /// Scalars were fully checked when the element was read. An embedded
    /// document from untrusted bytes is validated here, against the depth
    /// budget left over from the cursor that produced this element. One
    /// taken from a [`Document`] is only indexed at its own top level.
    pub fn value(&self) -> Result<Value> {
        let payload = self.payload();
        let payload_offset = self.offset + self.payload_start;
        match self.element_type {
            ElementType::Int32 => payload
                .first_chunk::<4>()
                .map(|raw| Value::Int32(i32::from_le_bytes(*raw)))
                .ok_or(BsonError::TruncatedValue {
                    type_name: "int32",
                    offset: payload_offset,
                    needed: 4,
                    available: payload.len(),
                }),
            ElementType::Int64 => payload
                .first_chunk::<8>()
                .map(|raw| Value::Int64(i64::from_le_bytes(*raw)))
                .ok_or(BsonError::TruncatedValue {
                    type_name: "int64",
                    offset: payload_offset,
                    needed: 8,
                    available: payload.len(),
                }),
            ElementType::String => {
                let body = &payload[LENGTH_PREFIX_SIZE..payload.len() - 1];
                std::str::from_utf8(body)
                    .map(|s| Value::String(s.to_owned()))
                    .map_err(|_| BsonError::InvalidUtf8 {
                        offset: payload_offset + LENGTH_PREFIX_SIZE,
                    })
            }
            ElementType::Document => match self.depth {
                Depth::Trusted => Document::from_trusted(payload.to_vec()).map(Value::Document),
                Depth::Remaining(0) => Err(BsonError::MaxDepthExceeded { max_depth: 0 }),
                Depth::Remaining(left) => {
                    let options = DecodeOptions {
                        max_depth: left - 1,
                    };
                    Document::from_bytes_with(payload.to_vec(), &options).map(Value::Document)
                }
            },
        }
    }
}

/// A single-pass cursor over the elements of one encoded document.
///
/// Yields `Some(Ok(element))` per element, `None` once the terminator is
/// reached, and `Some(Err(_))` on malformed input, after which it is fused.
#[derive(Debug, Clone, Copy)]
pub struct RawIter<'a> {
    bytes: &'a [u8],
    pos: usize,
    base: usize,
    depth: Depth,
    done: bool,
}

impl<'a> RawIter<'a> {
    /// Check the document header and position the cursor on the first element.
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        Self::with_options(bytes, &DecodeOptions::default())
    }

    pub fn with_options(bytes: &'a [u8], options: &DecodeOptions) -> Result<Self> {
        Self::at(bytes, 0, Depth::Remaining(options.max_depth))
    }

    /// Cursor over a buffer owned by a [`Document`]. Embedded documents it
    /// yields are not re-validated.
    pub(crate) fn trusted(bytes: &'a [u8]) -> Result<Self> {
        Self::at(bytes, 0, Depth::Trusted)
    }

    fn at(bytes: &'a [u8], base: usize, depth: Depth) -> Result<Self> {
        if bytes.len() < MIN_DOCUMENT_SIZE {
            return Err(BsonError::DocumentTooSmall { len: bytes.len() });
        }
        let declared = read_prefix("document", bytes, base)?;
        if declared < 0 || declared as usize != bytes.len() {
            return Err(BsonError::InvalidLength {
                offset: base,
                declared: i64::from(declared),
                available: bytes.len(),
            });
        }
        let last = bytes.len() - 1;
        if bytes[last] != 0x00 {
            return Err(BsonError::MissingTerminator { offset: base + last });
        }
        Ok(Self {
            bytes,
            pos: LENGTH_PREFIX_SIZE,
            base,
            depth,
            done: false,
        })
    }

    /// A cursor that yields nothing.
    pub(crate) fn exhausted() -> RawIter<'static> {
        RawIter {
            bytes: &EMPTY_DOCUMENT,
            pos: LENGTH_PREFIX_SIZE,
            base: 0,
            depth: Depth::Trusted,
            done: true,
        }
    }

    /// Stop yielding elements.
    pub(crate) fn stop(&mut self) {
        self.done = true;
    }

    fn fail(&mut self, err: BsonError) -> Option<Result<RawElement<'a>>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<'a> Iterator for RawIter<'a> {
    type Item = Result<RawElement<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        // The final byte is the document terminator; elements live before it.
        let end = self.bytes.len() - 1;
        if self.done || self.pos >= end {
            self.done = true;
            return None;
        }

        let start = self.pos;
        let tag = self.bytes[start];
        let Some(element_type) = ElementType::from_byte(tag) else {
            return self.fail(BsonError::UnknownType {
                tag,
                offset: self.base + start,
            });
        };

        let key_start = start + 1;
        let Some(key_len) = self.bytes[key_start..end].iter().position(|&b| b == 0x00) else {
            return self.fail(BsonError::TruncatedKey {
                offset: self.base + key_start,
            });
        };
        let Ok(key) = std::str::from_utf8(&self.bytes[key_start..key_start + key_len]) else {
            return self.fail(BsonError::InvalidUtf8 {
                offset: self.base + key_start,
            });
        };

        let payload_start = key_start + key_len + 1;
        let reader = payload_reader(element_type);
        let payload_len = match reader(&self.bytes[payload_start..end], self.base + payload_start) {
            Ok(len) => len,
            Err(err) => return self.fail(err),
        };

        let element_end = payload_start + payload_len;
        self.pos = element_end;
        trace!(key, element_type = element_type.name(), offset = self.base + start, "decoded element");

        Some(Ok(RawElement {
            key,
            element_type,
            raw: &self.bytes[start..element_end],
            payload_start: payload_start - start,
            offset: self.base + start,
            depth: self.depth,
        }))
    }
}

impl std::iter::FusedIterator for RawIter<'_> {}

/// Fully validate `bytes` as a document without materializing it.
///
/// Walks every element, recursing into embedded documents up to
/// `options.max_depth` levels, and rejects duplicate keys at every level.
pub fn validate(bytes: &[u8], options: &DecodeOptions) -> Result<()> {
    index_keys(bytes, options).map(|_| ())
}

/// Validate `bytes` and collect the top-level keys in physical order.
pub(crate) fn index_keys(bytes: &[u8], options: &DecodeOptions) -> Result<IndexSet<String>> {
    walk(bytes, 0, options.max_depth, options.max_depth)
}

fn walk(bytes: &[u8], base: usize, remaining: usize, limit: usize) -> Result<IndexSet<String>> {
    let mut keys = IndexSet::new();
    for element in RawIter::at(bytes, base, Depth::Remaining(remaining))? {
        let element = element?;
        if element.element_type() == ElementType::Document {
            if remaining == 0 {
                return Err(BsonError::MaxDepthExceeded { max_depth: limit });
            }
            let nested_base = element.offset() + element.payload_start;
            walk(element.payload(), nested_base, remaining - 1, limit)?;
        }
        if !keys.insert(element.key().to_owned()) {
            return Err(BsonError::DuplicateKey {
                key: element.key().to_owned(),
                offset: element.offset(),
            });
        }
    }
    Ok(keys)
}
