//! JSON serializer backed by `serde_json`.

use crate::error::{SerializerError, SerializerResult};
use crate::Serializer;
use serde::de::DeserializeOwned;
use serde::Serialize;

const NAME: &str = "json";

/// UTF-8 JSON encoding.
///
/// Larger than CBOR but readable with ordinary tools, which makes it useful
/// when inspecting a repository directory by hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn serialize<T: Serialize>(&self, value: &T) -> SerializerResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| SerializerError::encoding_failed(NAME, e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> SerializerResult<T> {
        serde_json::from_slice(bytes)
            .map_err(|e| SerializerError::decoding_failed(NAME, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_readable() {
        let bytes = JsonSerializer.serialize(&vec![1u32, 2, 3]).unwrap();
        assert_eq!(bytes, b"[1,2,3]");
    }

    #[test]
    fn garbage_fails_to_decode() {
        let result: SerializerResult<Vec<u32>> = JsonSerializer.deserialize(b"[1,2,");
        assert!(matches!(result, Err(SerializerError::DecodingFailed { format: "json", .. })));
    }
}
