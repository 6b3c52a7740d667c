//! Errors raised while shaping variations on the client.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Failure detected before anything reaches the catalog backend.
///
/// Covers user input (axis and value names, variant fields), workflow stage
/// rules and stale product versions. Backend failures are modelled by
/// `CatalogError` in `storefront-catalog`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Rejected input, e.g. a blank value name or a negative price.
    #[error("invalid variation data: {0}")]
    Validation(String),

    /// An operation was attempted in a stage that forbids it, such as
    /// removing an axis after combinations were generated.
    #[error("variation rule broken: {0}")]
    InvariantViolation(String),

    /// A textual id (axis, value, product) did not parse.
    #[error("malformed id: {0}")]
    InvalidId(String),

    /// The axis, value or draft is not part of the current session.
    #[error("unknown record: {0}")]
    NotFound(String),

    /// The product was written since its version was last read.
    #[error("version conflict: {0}")]
    Conflict(String),
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

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_variation_concern() {
        assert_eq!(
            DomainError::validation("value name is blank").to_string(),
            "invalid variation data: value name is blank"
        );
        assert_eq!(
            DomainError::conflict("product 7 expected 2, found 3").to_string(),
            "version conflict: product 7 expected 2, found 3"
        );
    }
}
