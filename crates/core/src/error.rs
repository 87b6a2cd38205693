//! Error types for shelf-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.
//! Validation failures, adapter failures and partially completed multi-step
//! operations are kept apart so callers can report each one differently.

use std::fmt;

use thiserror::Error;

/// Result type alias for shelf-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for shelf-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Profile not found
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Request rejected before any store was contacted
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A multi-step operation stopped after changing some state
    #[error(transparent)]
    PartiallyCompleted(Box<PartialFailure>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error from the object store
    #[error("Network error: {0}")]
    Network(String),

    /// Conflict error (the key is already taken)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Metadata catalog failure
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) | Error::Config(_) => 2, // UsageError
            Error::Validation(ValidationError::Duplicate(_)) => 6, // Conflict
            Error::Validation(_) => 2,                     // UsageError
            Error::Network(_) | Error::Catalog(_) => 3,    // NetworkError
            Error::Auth(_) => 4,                           // AuthError
            Error::NotFound(_) | Error::ProfileNotFound(_) => 5, // NotFound
            Error::Conflict(_) => 6,                       // Conflict
            Error::PartiallyCompleted(_) => 8,             // PartiallyCompleted
            _ => 1,                                        // GeneralError
        }
    }

    /// Whether the error was raised before any store call was made
    pub const fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub(crate) fn partial(failure: PartialFailure) -> Self {
        Error::PartiallyCompleted(Box::new(failure))
    }
}

/// Requests rejected up front
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Invalid name '{0}': names cannot contain '/' or be '.' or '..'")]
    InvalidName(String),

    #[error("'{0}' already has that name")]
    Unchanged(String),

    #[error("Cannot change the extension from '{from}' to '{to}'")]
    ExtensionChanged { from: String, to: String },

    #[error("An item named '{0}' already exists in this folder")]
    Duplicate(String),

    #[error("Cannot move '{item}' into itself or one of its subfolders ('{target}')")]
    IntoItself { item: String, target: String },

    #[error("'{0}' is already in this folder")]
    AlreadyInFolder(String),

    #[error("Nothing to drop onto")]
    NoDropTarget,
}

/// State left behind by a copy-then-delete sequence that did not finish
///
/// Nothing is rolled back. Source objects are still in place whenever this
/// is returned, so every key in `completed` now exists twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialFailure {
    /// What was being done, for display
    pub operation: String,
    /// Keys written at the destination
    pub completed: Vec<String>,
    /// Keys or rows the operation never reached
    pub pending: Vec<String>,
    /// The error that stopped the operation
    pub cause: String,
}

impl fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} partially completed ({} done, {} pending): {}",
            self.operation,
            self.completed.len(),
            self.pending.len(),
            self.cause
        )
    }
}

impl std::error::Error for PartialFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidPath("test".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::Validation(ValidationError::EmptyName).exit_code(), 2);
        assert_eq!(
            Error::Validation(ValidationError::Duplicate("a".into())).exit_code(),
            6
        );
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::Catalog("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::ProfileNotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::Conflict("test".into()).exit_code(), 6);
        assert_eq!(Error::General("test".into()).exit_code(), 1);

        let partial = Error::partial(PartialFailure {
            operation: "rename".into(),
            completed: vec![],
            pending: vec![],
            cause: "boom".into(),
        });
        assert_eq!(partial.exit_code(), 8);
    }

    #[test]
    fn test_error_display() {
        let err = Error::ProfileNotFound("media".into());
        assert_eq!(err.to_string(), "Profile not found: media");

        let err = Error::from(ValidationError::ExtensionChanged {
            from: "png".into(),
            to: "jpg".into(),
        });
        assert_eq!(
            err.to_string(),
            "Cannot change the extension from 'png' to 'jpg'"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_partial_failure_display() {
        let failure = PartialFailure {
            operation: "move folder 'a'".into(),
            completed: vec!["a/1".into()],
            pending: vec!["a/2".into(), "a/3".into()],
            cause: "Network error: reset".into(),
        };
        assert_eq!(
            failure.to_string(),
            "move folder 'a' partially completed (1 done, 2 pending): Network error: reset"
        );
    }
}
