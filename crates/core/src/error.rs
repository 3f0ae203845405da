//! Errors raised by the volunteer domain itself.
//!
//! Policy denials are not errors here; they travel as [`crate::Decision`].
//! Missing records and write conflicts belong to the store layer.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// A deterministic failure of caller input or of a domain rule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Caller input that cannot be accepted as given: an unknown role or
    /// status name, a rating outside 1..=5, an event that ends before it
    /// starts. Raised before any policy check.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A valid request that the record's current state cannot take, such
    /// as enrolling into a full event or shrinking capacity below the
    /// enrolled count.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An id string that is not a UUID; the message names the id kind.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_offending_detail() {
        let err = DomainError::validation("unknown role 'bishop'");
        assert_eq!(err.to_string(), "validation failed: unknown role 'bishop'");
        assert_eq!(
            DomainError::invariant("event is full").to_string(),
            "invariant violated: event is full"
        );
    }
}
