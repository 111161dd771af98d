//! Unified error handling for the identity store.
//!
//! Argument and lifecycle failures are raised by the store itself, before
//! any session call. Everything else comes from the document session and
//! is propagated as-is.

use domain::DomainError;
use thiserror::Error;

/// Identity store error types.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required argument was absent or empty
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The store was used after `dispose`
    #[error("Cannot access a disposed object: {0}")]
    ObjectDisposed(String),

    /// A new document collided with an existing key at commit
    #[error("Document {0} already exists")]
    Conflict(String),

    /// A document could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other failure reported by the document session
    #[error("Session error: {0}")]
    Session(String),
}

impl StoreError {
    /// Stable error code for logs and callers
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidArgument(_) => "INVALID_ARGUMENT",
            StoreError::ObjectDisposed(_) => "OBJECT_DISPOSED",
            StoreError::Conflict(_) => "CONFLICT",
            StoreError::Serialization(_) => "SERIALIZATION_ERROR",
            StoreError::Session(_) => "SESSION_ERROR",
        }
    }

    /// Check if this error was raised by argument validation
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StoreError::InvalidArgument(_))
    }

    /// Check if this error was raised by the disposed guard
    pub fn is_disposed(&self) -> bool {
        matches!(self, StoreError::ObjectDisposed(_))
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        StoreError::InvalidArgument(err.to_string())
    }
}

/// Result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Convenience constructors
impl StoreError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        StoreError::InvalidArgument(msg.into())
    }

    pub fn disposed(object: impl Into<String>) -> Self {
        StoreError::ObjectDisposed(object.into())
    }

    pub fn conflict(key: impl Into<String>) -> Self {
        StoreError::Conflict(key.into())
    }

    pub fn session(msg: impl Into<String>) -> Self {
        StoreError::Session(msg.into())
    }
}
