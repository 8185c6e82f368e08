//! Cross-cutting error type for the linkage core.
//!
//! One variant per kind named in the error taxonomy: callers match on kind
//! rather than parse a message. The core never retries and never logs; every
//! error is surfaced to the call site that triggered it.

use thiserror::Error;

/// Errors the linkage core can raise. See each variant for the conditions
/// that produce it.
#[derive(Debug, Error)]
pub enum LinkageError {
    /// `m <= 0`, `k == 0`, a non-symmetric `S`, or `S` whose dimension isn't `m`.
    #[error("invalid embedder config: {0}")]
    InvalidConfig(String),

    /// A column specification names a feature type absent from the factory.
    #[error("unknown feature type: {0}")]
    UnknownFeatureType(String),

    /// An extractor could not coerce a field value to text.
    #[error("invalid field value for column \"{column}\": {reason}")]
    InvalidFieldValue { column: String, reason: String },

    /// `compare` was called on datasets produced by different `EmbedderConfig`s.
    #[error("cannot compare datasets embedded under different configs")]
    ConfigMismatch,

    /// `match` was called on an empty similarity matrix.
    #[error("match called with an empty dataset on one or both sides")]
    EmptyInput,

    /// A dataset or embedder blob was corrupt or from an incompatible format version.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LinkageError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

impl From<std::io::Error> for LinkageError {
    fn from(e: std::io::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LinkageError>;
