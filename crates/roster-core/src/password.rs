//! Credential derivation seam.
//!
//! The membership services never see how passwords are stored; they hand the
//! plain password to a [`PasswordHasher`] and keep the returned credential.

use roster_org::{MembershipError, MembershipResult};

/// Derives the stored credential from a plain password.
pub trait PasswordHasher: Send + Sync {
    /// Hash `password`.
    ///
    /// # Errors
    ///
    /// `Internal` when the hashing backend fails.
    fn hash(&self, password: &str) -> MembershipResult<String>;
}

/// Reject passwords shorter than `min_length` characters.
pub fn ensure_password_length(password: &str, min_length: usize) -> MembershipResult<()> {
    if password.chars().count() < min_length {
        return Err(MembershipError::invalid(format!(
            "Password must be at least {} characters",
            min_length
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length() {
        assert!(ensure_password_length("abc", 3).is_ok());
        let err = ensure_password_length("ab", 3).unwrap_err();
        assert_eq!(err.reason(), "Password must be at least 3 characters");
        assert!(ensure_password_length("", 0).is_ok());
    }
}
