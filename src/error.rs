//! Error types for linguistic steganography.

use thiserror::Error;

/// Error variants for codec operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Bit input cannot be parsed (e.g. not a multiple of 8 where required).
    #[error("malformed bit stream of length {len}")]
    MalformedBitstream {
        /// Length in bits of the offending input.
        len: usize,
    },

    /// A cover-text token does not appear within the codec's candidate set.
    #[error("cover text cannot be decoded: token mismatch at position {position}")]
    DecodeMismatch {
        /// Zero-based position of the first undecodable cover-text token.
        position: usize,
    },

    /// Binary conversion was requested but the vocabulary has no ASCII NUL token.
    #[error("vocabulary does not contain an ASCII NUL token")]
    UnsupportedVocabulary,

    /// The model backend failed to tokenize, detokenize, or produce logits.
    #[error("model backend failure: {0}")]
    ModelBackend(String),

    /// A codec parameter is outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// A specialized Result type for codec operations.
pub type Result<T> = std::result::Result<T, Error>;
