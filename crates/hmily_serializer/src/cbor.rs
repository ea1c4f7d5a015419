//! CBOR serializer backed by `ciborium`.

use crate::error::{SerializerError, SerializerResult};
use crate::Serializer;
use serde::de::DeserializeOwned;
use serde::Serialize;

const NAME: &str = "cbor";

/// Binary CBOR encoding (RFC 8949).
///
/// Decoding reads exactly one CBOR item, so trailing bytes after the item
/// are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CborSerializer;

impl Serializer for CborSerializer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn serialize<T: Serialize>(&self, value: &T) -> SerializerResult<Vec<u8>> {
        let mut buffer = Vec::with_capacity(128);
        ciborium::into_writer(value, &mut buffer)
            .map_err(|e| SerializerError::encoding_failed(NAME, format!("{e:?}")))?;
        Ok(buffer)
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> SerializerResult<T> {
        if bytes.is_empty() {
            return Err(SerializerError::decoding_failed(NAME, "empty input"));
        }
        ciborium::from_reader(bytes)
            .map_err(|e| SerializerError::decoding_failed(NAME, format!("{e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: u64,
        name: String,
        tag: Option<u64>,
    }

    #[test]
    fn encodes_and_decodes_struct() {
        let value = Sample {
            id: 42,
            name: "acct".into(),
            tag: None,
        };
        let bytes = CborSerializer.serialize(&value).unwrap();
        let decoded: Sample = CborSerializer.deserialize(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let value = Sample {
            id: 1,
            name: "x".into(),
            tag: Some(3),
        };
        let mut bytes = CborSerializer.serialize(&value).unwrap();
        bytes.extend_from_slice(&[0u8; 16]);
        let decoded: Sample = CborSerializer.deserialize(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn truncated_input_fails() {
        let value = Sample {
            id: 9,
            name: "truncated".into(),
            tag: Some(1),
        };
        let bytes = CborSerializer.serialize(&value).unwrap();
        let result: SerializerResult<Sample> =
            CborSerializer.deserialize(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(SerializerError::DecodingFailed { .. })));
    }

    #[test]
    fn empty_input_fails() {
        let result: SerializerResult<Sample> = CborSerializer.deserialize(&[]);
        assert!(result.is_err());
    }
}
