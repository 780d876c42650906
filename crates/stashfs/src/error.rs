//! Error types for stashfs

use std::io;

/// Result type alias for stashfs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types shared by the cache engine and the typed storage built on it
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Programmer mistake: empty generated name, empty payload, bad bucket config
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Codec failed to encode or decode a value
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File in a bucket directory whose name is not a cache entry
    #[error("Malformed entry name: {0}")]
    MalformedEntry(String),
}

impl Error {
    /// Shorthand for [`Error::Configuration`]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Shorthand for [`Error::Serialization`]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Error::Serialization(msg.into())
    }
}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Self {
        match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => Error::MalformedEntry(e.input.to_string()),
            nom::Err::Incomplete(_) => Error::MalformedEntry("incomplete input".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::configuration("max_entries must be positive");
        assert_eq!(err.to_string(), "Configuration error: max_entries must be positive");

        let err = Error::serialization("unexpected end of input");
        assert_eq!(err.to_string(), "Serialization error: unexpected end of input");
    }

    #[test]
    fn test_io_source() {
        let err: Error = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
