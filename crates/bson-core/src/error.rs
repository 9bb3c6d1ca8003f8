//! Error types for BSON decoding and import.

use thiserror::Error;

/// Errors that can occur while decoding an encoded document.
///
/// Every variant that points into a buffer carries the byte offset at which
/// the problem was detected, relative to the start of the outermost document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BsonError {
    /// The buffer is shorter than the smallest valid document (5 bytes).
    #[error("document too small: {len} bytes (minimum is 5)")]
    DocumentTooSmall { len: usize },

    /// The length prefix disagrees with the bytes actually available.
    #[error("length prefix {declared} at offset {offset} does not match {available} available bytes")]
    InvalidLength {
        offset: usize,
        declared: i64,
        available: usize,
    },

    /// A type tag byte that maps to no supported payload type.
    #[error("unknown element type 0x{tag:02x} at offset {offset}")]
    UnknownType { tag: u8, offset: usize },

    /// An element key ran to the end of the buffer without a `0x00` terminator.
    #[error("unterminated key starting at offset {offset}")]
    TruncatedKey { offset: usize },

    /// A payload needs more bytes than remain in the buffer.
    #[error("truncated {type_name} payload at offset {offset}: need {needed} bytes, {available} remain")]
    TruncatedValue {
        type_name: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A string payload's declared length is zero, negative, or not followed by `0x00`.
    #[error("malformed string payload at offset {offset}")]
    InvalidStringLength { offset: usize },

    /// A key or string payload is not valid UTF-8.
    #[error("invalid UTF-8 at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// The document does not end with the `0x00` terminator.
    #[error("missing document terminator at offset {offset}")]
    MissingTerminator { offset: usize },

    /// The same key occurs twice in one document.
    #[error("duplicate key {key:?} at offset {offset}")]
    DuplicateKey { key: String, offset: usize },

    /// Nested documents exceed the configured depth limit.
    #[error("nesting depth exceeds limit of {max_depth}")]
    MaxDepthExceeded { max_depth: usize },
}

/// Convenience alias used throughout bson-core.
pub type Result<T> = std::result::Result<T, BsonError>;
