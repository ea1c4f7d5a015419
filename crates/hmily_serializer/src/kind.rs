//! Runtime selection of a serializer.

use crate::cbor::CborSerializer;
use crate::error::{SerializerError, SerializerResult};
use crate::json::JsonSerializer;
use crate::Serializer;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A serializer chosen by name, e.g. from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializerKind {
    /// [`CborSerializer`].
    #[default]
    Cbor,
    /// [`JsonSerializer`].
    Json,
}

impl SerializerKind {
    /// All registered serializers.
    pub const ALL: [SerializerKind; 2] = [SerializerKind::Cbor, SerializerKind::Json];
}

impl FromStr for SerializerKind {
    type Err = SerializerError;

    fn from_str(s: &str) -> SerializerResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SerializerError::unknown_serializer(s))
    }
}

impl fmt::Display for SerializerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serializer for SerializerKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Cbor => CborSerializer.name(),
            Self::Json => JsonSerializer.name(),
        }
    }

    fn serialize<T: Serialize>(&self, value: &T) -> SerializerResult<Vec<u8>> {
        match self {
            Self::Cbor => CborSerializer.serialize(value),
            Self::Json => JsonSerializer.serialize(value),
        }
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> SerializerResult<T> {
        match self {
            Self::Cbor => CborSerializer.deserialize(bytes),
            Self::Json => JsonSerializer.deserialize(bytes),
        }
    }
}
