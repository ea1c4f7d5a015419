//! # Hmily Serializer
//!
//! Record serializers for the Hmily transaction repository.
//!
//! The repository never interprets the bytes it stores. A serializer turns a
//! record into a self-contained payload and back; the payload is written to
//! disk verbatim, with no framing, length prefix or checksum.
//!
//! ## Available Serializers
//!
//! - [`CborSerializer`] - Compact binary encoding (default)
//! - [`JsonSerializer`] - Human-readable encoding, handy for debugging
//!
//! [`SerializerKind`] selects one of them by name at runtime.
//!
//! ## Usage
//!
//! ```
//! use hmily_serializer::{CborSerializer, Serializer};
//!
//! let bytes = CborSerializer.serialize(&(7u64, "acct")).unwrap();
//! let decoded: (u64, String) = CborSerializer.deserialize(&bytes).unwrap();
//! assert_eq!(decoded, (7, "acct".to_string()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cbor;
mod error;
mod json;
mod kind;

pub use cbor::CborSerializer;
pub use error::{SerializerError, SerializerResult};
pub use json::JsonSerializer;
pub use kind::SerializerKind;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes records to bytes and decodes them back.
///
/// # Invariants
///
/// - `deserialize(serialize(v))` yields a value equal to `v`
/// - `deserialize` never panics on arbitrary input; corrupt bytes are an error
pub trait Serializer: Send + Sync {
    /// Short, stable name of the format (`"cbor"`, `"json"`).
    fn name(&self) -> &'static str;

    /// Encodes a value.
    ///
    /// # Errors
    ///
    /// Returns [`SerializerError::EncodingFailed`] if the value cannot be
    /// represented in this format.
    fn serialize<T: Serialize>(&self, value: &T) -> SerializerResult<Vec<u8>>;

    /// Decodes a value.
    ///
    /// # Errors
    ///
    /// Returns [`SerializerError::DecodingFailed`] if the bytes are truncated,
    /// corrupt or describe a different type.
    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> SerializerResult<T>;
}
