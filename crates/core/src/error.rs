//! Error types for topicshelf.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, missing inputs, embedding
//! providers, the vector store and content loading.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for topicshelf.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Errors are never retried; they propagate to the command that triggered them.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path handed to an add or search command does not exist
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Image extension outside the set accepted by image embedders
    #[error("Unsupported image format: '{0}' (supported: png, jpeg, webp, bmp)")]
    UnsupportedImage(String),

    /// Embedding provider errors (HTTP, API, response shape)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Content extraction errors (PDF text, directory listing)
    #[error("Loader error: {0}")]
    Loader(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_includes_path() {
        let err = AppError::NotFound(PathBuf::from("/tmp/missing.pdf"));
        assert_eq!(err.to_string(), "Path not found: /tmp/missing.pdf");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
