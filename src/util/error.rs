//! Error types for the state store.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for store, decode and encode operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File cannot be opened or its header cannot be parsed
    #[error("Unable to open \"{path}\": {reason}")]
    Open { path: PathBuf, reason: String },

    /// File layout this store cannot represent
    #[error("Unsupported data format in \"{path}\": {detail}")]
    UnsupportedFormat { path: PathBuf, detail: String },

    /// Callback registration, read or write call into the PLY layer failed
    #[error("Backend error: {0}")]
    Backend(String),

    /// Variant accessed as the wrong primitive type or shape
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Typed get found a variant of the right type but the wrong shape
    #[error("Shape mismatch for \"{key}\": expected {expected}, got {actual}")]
    ShapeMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    /// Key not present under the active prefix
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Malformed PLY header
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// File body is truncated
    #[error("Unexpected end of file after {0} bytes of body")]
    UnexpectedEof(u64),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a backend error from a string.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create an invalid header error.
    pub fn header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }

    pub(crate) fn unsupported(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::Open {
            path: PathBuf::from("state.ply"),
            reason: "missing".into(),
        };
        assert!(e.to_string().contains("state.ply"));

        let e = Error::TypeMismatch {
            expected: "f32 matrix".into(),
            actual: "u8 list".into(),
        };
        assert!(e.to_string().contains("f32 matrix"));
        assert!(e.to_string().contains("u8 list"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
