//! Error types for the serializer crate.

use thiserror::Error;

/// Result type for serializer operations.
pub type SerializerResult<T> = Result<T, SerializerError>;

/// Errors that can occur while encoding or decoding a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializerError {
    /// Failed to encode a value.
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        /// Name of the serializer that failed.
        format: &'static str,
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode bytes into a value.
    #[error("{format} decoding failed: {message}")]
    DecodingFailed {
        /// Name of the serializer that failed.
        format: &'static str,
        /// Description of the decoding error.
        message: String,
    },

    /// No serializer is registered under the requested name.
    #[error("unknown serializer: {name}")]
    UnknownSerializer {
        /// The name that was looked up.
        name: String,
    },
}

impl SerializerError {
    /// Create an encoding failed error.
    pub fn encoding_failed(format: &'static str, message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            format,
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(format: &'static str, message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            format,
            message: message.into(),
        }
    }

    /// Create an unknown serializer error.
    pub fn unknown_serializer(name: impl Into<String>) -> Self {
        Self::UnknownSerializer { name: name.into() }
    }
}
