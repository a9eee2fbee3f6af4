//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode value to CBOR.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode CBOR bytes.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// NaN or infinite floats cannot be stored.
    #[error("non-finite float values are forbidden")]
    NonFiniteFloat,

    /// Bytes remained after the top-level item.
    #[error("{0} trailing bytes after document")]
    TrailingBytes(usize),

    /// The document was written by an incompatible format version.
    #[error("unsupported document version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u16,
        /// Version this build reads.
        expected: u16,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl ToString) -> Self {
        Self::EncodingFailed {
            message: message.to_string(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl ToString) -> Self {
        Self::DecodingFailed {
            message: message.to_string(),
        }
    }
}
