//! Domain-level errors.
//!
//! These errors represent rejected descriptors (empty names, blank roles).
//! They are independent of any document store.

use thiserror::Error;

/// Domain-specific errors for invalid identity descriptors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was empty
    #[error("{field} is required")]
    Missing { field: &'static str },

    /// Validation failed for a field or input
    #[error("Validation error: {0}")]
    Validation(String),
}

impl DomainError {
    /// Create a missing field error
    pub fn missing(field: &'static str) -> Self {
        DomainError::Missing { field }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Reject an empty (or whitespace only) required value.
pub fn require(field: &'static str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::missing(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_blank() {
        assert_eq!(require("user_name", ""), Err(DomainError::missing("user_name")));
        assert_eq!(require("user_name", "   "), Err(DomainError::missing("user_name")));
        assert!(require("user_name", "alice").is_ok());
    }

    #[test]
    fn test_missing_message() {
        assert_eq!(DomainError::missing("role").to_string(), "role is required");
    }
}
