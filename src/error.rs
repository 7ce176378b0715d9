//! Error types for the publication-sniffer library.

use thiserror::Error;

/// Errors raised while reading the content of a resource or a container.
///
/// The same taxonomy is used for single blobs and for archives, so the
/// retriever can propagate them without knowing where they came from.
#[derive(Error, Debug)]
pub enum ContentError {
    /// The resource or archive entry does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Access to the content was denied.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A network transfer failed or the server answered with an error status.
    #[error("Network error: {0}")]
    Network(String),

    /// A local filesystem operation failed.
    #[error("Filesystem error: {0}")]
    Filesystem(#[source] std::io::Error),

    /// The content is larger than what the caller allowed to load in memory.
    #[error("Content too big: {length} bytes (limit {limit})")]
    TooBig { length: u64, limit: u64 },

    /// The archive is corrupted or uses an unsupported feature.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Any other failure.
    #[error("Unknown content error: {0}")]
    Unknown(String),
}

impl From<std::io::Error> for ContentError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ContentError::NotFound(err.to_string()),
            std::io::ErrorKind::PermissionDenied => ContentError::Forbidden(err.to_string()),
            std::io::ErrorKind::OutOfMemory => ContentError::TooBig {
                length: 0,
                limit: 0,
            },
            _ => ContentError::Filesystem(err),
        }
    }
}

impl From<reqwest::Error> for ContentError {
    fn from(err: reqwest::Error) -> Self {
        match err.status().map(|s| s.as_u16()) {
            Some(404) | Some(410) => ContentError::NotFound(err.to_string()),
            Some(401) | Some(403) => ContentError::Forbidden(err.to_string()),
            _ => ContentError::Network(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for ContentError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => io.into(),
            zip::result::ZipError::FileNotFound => ContentError::NotFound(err.to_string()),
            other => ContentError::Archive(other.to_string()),
        }
    }
}

/// Errors returned by a media type retrieval.
#[derive(Error, Debug)]
pub enum SnifferError {
    /// No sniffer recognized the asset and no usable hint was provided.
    #[error("Media type not recognized")]
    NotRecognized,

    /// The content needed for sniffing could not be read.
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Error returned when parsing an invalid media type string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaTypeError {
    #[error("Invalid media type: {0:?}")]
    Invalid(String),
}

/// Convenience type alias for Results using SnifferError.
pub type Result<T> = std::result::Result<T, SnifferError>;

/// Convenience type alias for content accessor Results.
pub type ContentResult<T> = std::result::Result<T, ContentError>;
