//! # bson-core
//!
//! A mutable, ordered key/value document whose only storage is its own
//! BSON encoding: one contiguous, length-prefixed byte buffer.
//!
//! Supported element types are strings, 32-bit and 64-bit integers, and
//! embedded documents. Other BSON tags are rejected on import.
//!
//! ## Quick start
//!
//! ```rust
//! use bson_core::{Document, Value};
//!
//! let mut doc = Document::new();
//! doc.insert("name", "Alice");
//! doc.insert("age", 30i32);
//!
//! // Export the wire bytes and attach them again.
//! let bytes = doc.raw_bytes().to_vec();
//! let back = Document::from_bytes(bytes).unwrap();
//! assert_eq!(back, doc);
//! assert_eq!(back.get("age"), Some(Value::Int32(30)));
//!
//! // Overwriting moves the key to the end.
//! doc.insert("name", "Bob");
//! assert_eq!(doc.keys().collect::<Vec<_>>(), ["age", "name"]);
//! ```
//!
//! ## Modules
//!
//! - [`types`]: `Value` and `ElementType` (tag bytes)
//! - [`encoder`]: element layout and length-prefix patching
//! - [`decoder`]: bounds-checked streaming cursor over encoded bytes
//! - [`document`]: `Document` and its mutation rules
//! - [`sequence`]: filter, map, prefix/suffix, drop and split
//! - [`error`]: decode errors

pub mod decoder;
pub mod document;
pub mod encoder;
pub mod error;
pub mod sequence;
pub mod types;

pub use decoder::{validate, DecodeOptions, RawElement, RawIter};
pub use document::{Document, Iter};
pub use error::{BsonError, Result};
pub use types::{ElementType, Value};
