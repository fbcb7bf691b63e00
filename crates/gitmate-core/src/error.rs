//! Error types for GitMate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire GitMate workspace.
///
/// Repository reader failures (`RateLimited`, `NotFound`, `Unavailable`) and
/// chat failures (`NotInitialized`, `Provider`) are the variants callers are
/// expected to branch on; the rest cover local storage and configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GitMateError {
    /// The repository host refused the request (HTTP 403).
    #[error("Rate limit exceeded. Add a GitHub token in settings.")]
    RateLimited,

    /// The repository or path does not exist (HTTP 404).
    #[error("Repository or path not found: '{path}'")]
    NotFound { path: String },

    /// The repository host failed for any other reason.
    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    /// A send was attempted while no chat session is live.
    #[error("Chat session not initialized")]
    NotInitialized,

    /// Any other failure from the chat provider, including mid-stream failures.
    #[error("Chat provider error: {0}")]
    Provider(String),

    /// A send was attempted while another reply is still streaming.
    #[error("A reply is still streaming")]
    SendInProgress,

    /// Caller supplied input that cannot be acted upon.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GitMateError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates an Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a Provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a RateLimited error
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// Check if this error came from the repository reader.
    ///
    /// The UI renders these inline with a retry affordance instead of
    /// appending anything to the chat.
    pub fn is_repository_error(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::NotFound { .. } | Self::Unavailable(_)
        )
    }

    /// Check if this error came from the chat side.
    pub fn is_chat_error(&self) -> bool {
        matches!(self, Self::NotInitialized | Self::Provider(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for GitMateError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for GitMateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for GitMateError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for GitMateError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, GitMateError>`.
pub type Result<T> = std::result::Result<T, GitMateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_are_classified() {
        assert!(GitMateError::RateLimited.is_repository_error());
        assert!(GitMateError::not_found("src").is_repository_error());
        assert!(GitMateError::unavailable("boom").is_repository_error());
        assert!(!GitMateError::NotInitialized.is_repository_error());
    }

    #[test]
    fn test_chat_errors_are_classified() {
        assert!(GitMateError::NotInitialized.is_chat_error());
        assert!(GitMateError::provider("stream reset").is_chat_error());
        assert!(!GitMateError::RateLimited.is_chat_error());
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let err: GitMateError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        match err {
            GitMateError::Io { message } => assert!(message.contains("PermissionDenied")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
