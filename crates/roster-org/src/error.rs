//! Error types for membership operations
//!
//! Every rejected membership operation returns one [`MembershipError`]. The
//! variant is the stable error kind; the payload is the human-readable reason.

use thiserror::Error;

/// Membership error types.
///
/// - `NotFound`: the entity is absent
/// - `Unauthorized`: the actor lacks permission for this actor/target pair
/// - `InvalidOperation`: well-formed request that violates a business rule
///   (last administrator, duplicate pending invitation, expired token, ...)
/// - `Conflict`: a concurrent write lost a uniqueness or compare-and-set race
/// - `Transient`: storage or network failure that is safe to retry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    /// Entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Actor may not perform this operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Operation violates a membership invariant
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Concurrent write conflict reported by storage
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage or network failure, retryable
    #[error("Transient failure: {0}")]
    Transient(String),

    /// Collaborator failure that is neither retryable nor a rule violation
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for membership operations.
pub type MembershipResult<T> = Result<T, MembershipError>;

/// Stable, payload-free classification of a [`MembershipError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`MembershipError::NotFound`]
    NotFound,
    /// See [`MembershipError::Unauthorized`]
    Unauthorized,
    /// See [`MembershipError::InvalidOperation`]
    InvalidOperation,
    /// See [`MembershipError::Conflict`]
    Conflict,
    /// See [`MembershipError::Transient`]
    Transient,
    /// See [`MembershipError::Internal`]
    Internal,
}

impl MembershipError {
    /// Build a `NotFound` error.
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound(reason.into())
    }

    /// Build an `Unauthorized` error.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }

    /// Build an `InvalidOperation` error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidOperation(reason.into())
    }

    /// Build a `Conflict` error.
    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict(reason.into())
    }

    /// Build a `Transient` error.
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient(reason.into())
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::InvalidOperation(_) => ErrorKind::InvalidOperation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Transient(_) => ErrorKind::Transient,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get the human-readable reason without the kind prefix.
    pub fn reason(&self) -> &str {
        match self {
            Self::NotFound(r)
            | Self::Unauthorized(r)
            | Self::InvalidOperation(r)
            | Self::Conflict(r)
            | Self::Transient(r)
            | Self::Internal(r) => r,
        }
    }

    /// Check if the caller may retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Check if this error should be logged at error level.
    ///
    /// Rule violations and permission denials are expected outcomes.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Internal(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Unauthorized(_) => 403,
            Self::InvalidOperation(_) => 422,
            Self::Conflict(_) => 409,
            Self::Transient(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidOperation(_) => "INVALID_OPERATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Transient(_) => "TRANSIENT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_reason() {
        let err = MembershipError::invalid("last admin");
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert_eq!(err.reason(), "last admin");
        assert_eq!(err.to_string(), "Invalid operation: last admin");
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(MembershipError::transient("timeout").is_retryable());
        assert!(!MembershipError::conflict("duplicate").is_retryable());
        assert!(!MembershipError::unauthorized("self").is_retryable());
    }

    #[test]
    fn test_codes() {
        assert_eq!(MembershipError::not_found("x").status_code(), 404);
        assert_eq!(MembershipError::conflict("x").error_code(), "CONFLICT");
        assert!(MembershipError::Internal("x".into()).is_server_error());
        assert!(!MembershipError::invalid("x").is_server_error());
    }
}
