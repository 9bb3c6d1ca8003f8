//! Element encoder: appends `(key, value)` pairs to a document buffer.
//!
//! Encoding is append-only. A document buffer starts with a 4-byte
//! little-endian length prefix; every call to [`write_element`] writes one
//! element at the end of the buffer and then re-patches that prefix to the
//! new length **plus one**, reserving room for the single `0x00` terminator
//! the owning document writes after the last element.
//!
//! ```text
//! element := tag:u8  key:utf8  0x00  payload
//!
//! string   (0x02)  len:i32 (= bytes + 1)  bytes  0x00
//! document (0x03)  nested document, self-length-prefixed
//! int32    (0x10)  4 bytes LE
//! int64    (0x12)  8 bytes LE
//! ```
//!
//! Between a `write_element` call and the terminator being appended, the
//! buffer is an intermediate state: its prefix already counts a byte that is
//! not there yet. Such a buffer must not be handed out.

use crate::types::Value;

/// Size of the little-endian `i32` length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Encoding of a document with no elements: length 5, then the terminator.
pub const EMPTY_DOCUMENT: [u8; 5] = [0x05, 0x00, 0x00, 0x00, 0x00];

/// Append one element to `buf` and patch the document length prefix.
///
/// `buf` must hold a length prefix followed by zero or more complete
/// elements and **no** terminator.
///
/// # Panics
///
/// Panics if `key` contains a `0x00` byte (keys are NUL-terminated on the
/// wire and cannot carry one) or if the document would grow past
/// `i32::MAX` bytes.
pub fn write_element(buf: &mut Vec<u8>, key: &str, value: &Value) {
    assert!(
        !key.as_bytes().contains(&0),
        "document key {key:?} contains a NUL byte"
    );

    buf.reserve(element_len(key, value));
    buf.push(value.element_type().as_byte());
    write_cstring(buf, key);
    write_payload(buf, value);

    let total = buf.len() + 1;
    patch_length(buf, 0, total);
}

/// Write the type-specific payload for `value`.
fn write_payload(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::String(s) => {
            buf.extend_from_slice(&length_prefix(s.len() + 1).to_le_bytes());
            buf.extend_from_slice(s.as_bytes());
            buf.push(0x00);
        }
        Value::Document(d) => buf.extend_from_slice(d.raw_bytes()),
        Value::Int32(n) => buf.extend_from_slice(&n.to_le_bytes()),
        Value::Int64(n) => buf.extend_from_slice(&n.to_le_bytes()),
    }
}

/// Write `s` followed by its `0x00` terminator.
fn write_cstring(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0x00);
}

/// Overwrite the 4-byte length prefix that starts at `at`.
///
/// # Panics
///
/// Panics if `len` does not fit in an `i32`.
pub fn patch_length(buf: &mut [u8], at: usize, len: usize) {
    buf[at..at + LENGTH_PREFIX_SIZE].copy_from_slice(&length_prefix(len).to_le_bytes());
}

/// Number of bytes [`write_element`] appends for this pair.
#[must_use]
pub fn element_len(key: &str, value: &Value) -> usize {
    let payload = match value {
        Value::String(s) => LENGTH_PREFIX_SIZE + s.len() + 1,
        Value::Document(d) => d.raw_bytes().len(),
        Value::Int32(_) => 4,
        Value::Int64(_) => 8,
    };
    1 + key.len() + 1 + payload
}

fn length_prefix(len: usize) -> i32 {
    match i32::try_from(len) {
        Ok(n) => n,
        Err(_) => panic!("encoded length {len} exceeds the i32 length prefix"),
    }
}
