//! Error types surfaced by the library.

/// Failure reported by a [`crate::DirectoryLookup`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
    #[error("lookup failed for {identifier}: {reason}")]
    Failed { identifier: String, reason: String },
}

/// Document-level failure of a storage-format conversion.
///
/// Content problems never produce this error; only structural failures do.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] std::io::Error),
    #[error("serialized document is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("document nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },
}
