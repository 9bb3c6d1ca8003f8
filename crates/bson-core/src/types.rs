//! Value model: the closed set of element types this codec understands.
//!
//! The wire format reserves tag bytes for many more types (arrays, binary,
//! dates, object ids, ...). Only the four below are supported; any other tag
//! is reported as [`BsonError::UnknownType`](crate::BsonError::UnknownType)
//! by the decoder.

use std::fmt;

use crate::document::Document;

/// Element type tag, the first byte of every encoded element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    String = 0x02,
    Document = 0x03,
    Int32 = 0x10,
    Int64 = 0x12,
}

impl ElementType {
    /// Parse a tag byte. Returns `None` for reserved or unknown tags.
    #[inline]
    #[must_use]
    pub fn from_byte(tag: u8) -> Option<Self> {
        match tag {
            0x02 => Some(ElementType::String),
            0x03 => Some(ElementType::Document),
            0x10 => Some(ElementType::Int32),
            0x12 => Some(ElementType::Int64),
            _ => None,
        }
    }

    /// The raw tag byte.
    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Type name for error messages and inspection output.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ElementType::String => "string",
            ElementType::Document => "document",
            ElementType::Int32 => "int32",
            ElementType::Int64 => "int64",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single BSON value.
///
/// Equality is structural: same variant, equal payload. Nested documents
/// compare by their encoded bytes, so key order matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// UTF-8 string (tag `0x02`).
    String(String),
    /// Embedded document (tag `0x03`).
    Document(Document),
    /// 32-bit signed integer (tag `0x10`).
    Int32(i32),
    /// 64-bit signed integer (tag `0x12`).
    Int64(i64),
}

impl Value {
    /// The wire type tag for this value.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            Value::String(_) => ElementType::String,
            Value::Document(_) => ElementType::Document,
            Value::Int32(_) => ElementType::Int32,
            Value::Int64(_) => ElementType::Int64,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Int32(n) => write!(f, "{n}"),
            Value::Int64(n) => write!(f, "{n}"),
            Value::Document(d) => {
                f.write_str("{")?;
                for (i, (key, value)) in d.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

/// Native-width integers become `Int32` on 32-bit targets and `Int64` on
/// 64-bit targets, so the wire encoding of a bare integer follows the
/// platform's pointer width.
impl From<isize> for Value {
    fn from(n: isize) -> Self {
        if isize::BITS == 32 {
            Value::Int32(n as i32)
        } else {
            Value::Int64(n as i64)
        }
    }
}

impl From<Document> for Value {
    fn from(d: Document) -> Self {
        Value::Document(d)
    }
}

impl TryFrom<Value> for String {
    type Error = Value;

    fn try_from(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(other),
        }
    }
}

impl TryFrom<Value> for i32 {
    type Error = Value;

    fn try_from(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Int32(n) => Ok(n),
            other => Err(other),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = Value;

    fn try_from(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Int64(n) => Ok(n),
            other => Err(other),
        }
    }
}

impl TryFrom<Value> for Document {
    type Error = Value;

    fn try_from(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Document(d) => Ok(d),
            other => Err(other),
        }
    }
}
