//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] vitrine_core::EmailError),

    /// Invalid username.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] vitrine_core::UsernameError),

    /// Invalid phone number.
    #[error("invalid number: {0}")]
    InvalidNumber(#[from] vitrine_core::PhoneNumberError),

    /// Password too short or too long.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Username is taken by another account.
    #[error("username already in use")]
    UsernameTaken,

    /// Email is taken by another account.
    #[error("email already in use")]
    EmailTaken,

    /// Phone number is taken by another account.
    #[error("number already in use")]
    NumberTaken,

    /// A profile update carried no fields.
    #[error("no fields to update")]
    NothingToUpdate,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Translate a repository error, naming the field behind a unique violation.
    pub(crate) fn from_repository(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(constraint) => match constraint.as_str() {
                "users_username_key" => Self::UsernameTaken,
                "users_email_key" => Self::EmailTaken,
                "users_number_key" => Self::NumberTaken,
                _ => Self::Repository(RepositoryError::Conflict(constraint)),
            },
            RepositoryError::NotFound => Self::UserNotFound,
            other => Self::Repository(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_repository_maps_constraints() {
        let map = |name: &str| AuthError::from_repository(RepositoryError::Conflict(name.to_owned()));
        assert!(matches!(map("users_username_key"), AuthError::UsernameTaken));
        assert!(matches!(map("users_email_key"), AuthError::EmailTaken));
        assert!(matches!(map("users_number_key"), AuthError::NumberTaken));
        assert!(matches!(map("other"), AuthError::Repository(_)));
    }

    #[test]
    fn test_from_repository_not_found() {
        assert!(matches!(
            AuthError::from_repository(RepositoryError::NotFound),
            AuthError::UserNotFound
        ));
    }
}
