//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a value.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Input ended in the middle of a value or frame.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A value carried a type discriminant this codec does not know.
    #[error("unknown value tag: {tag:#04x}")]
    UnknownValueTag {
        /// The offending tag byte.
        tag: u8,
    },

    /// A parameter frame carried a shape discriminant this codec does not know.
    #[error("unknown parameter frame tag: {tag:#04x}")]
    UnknownFrameTag {
        /// The offending tag byte.
        tag: u8,
    },

    /// Invalid UTF-8 in a text value or parameter name.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// The same name appeared twice in a named parameter frame.
    #[error("duplicate parameter name: {name}")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },

    /// A declared length exceeds the hard payload limit.
    #[error("size limit exceeded: claimed {claimed} bytes, max allowed {max_allowed}")]
    SizeLimitExceeded {
        /// Length claimed by the input.
        claimed: u64,
        /// Maximum permitted length.
        max_allowed: u64,
    },

    /// A complete frame was decoded but bytes remain.
    #[error("{remaining} trailing bytes after frame")]
    TrailingBytes {
        /// Number of unconsumed bytes.
        remaining: usize,
    },

    /// Structurally impossible input (e.g. a count larger than the input).
    #[error("invalid structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }
}
