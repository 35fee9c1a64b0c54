//! Account service: registration, password login, and profile changes.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use vitrine_core::{Email, PhoneNumber, UserId, Username};

use crate::db::users::{NewUser, UserRepository};
use crate::models::User;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length, in characters.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Raw registration input, validated by [`AuthService::register`].
#[derive(Debug)]
pub struct Registration<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub number: &'a str,
}

/// Account service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns a validation variant (`InvalidUsername`, `InvalidEmail`,
    /// `InvalidNumber`, `WeakPassword`) for malformed input, and
    /// `UsernameTaken` / `EmailTaken` / `NumberTaken` for duplicates.
    pub async fn register(&self, input: &Registration<'_>) -> Result<User, AuthError> {
        let username = Username::parse(input.username)?;
        let email = Email::parse(input.email)?;
        let number = PhoneNumber::parse(input.number)?;
        validate_password(input.password)?;

        let password_hash = hash_password(input.password)?;

        let user = self
            .users
            .create(&NewUser {
                username: &username,
                email: &email,
                number: &number,
                password_hash: &password_hash,
            })
            .await
            .map_err(AuthError::from_repository)?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::WeakPassword` for
    /// malformed input before any lookup, and `AuthError::InvalidCredentials`
    /// if the email is unknown or the password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        if password.chars().count() > MAX_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword(format!(
                "password must be at most {MAX_PASSWORD_LENGTH} characters"
            )));
        }

        let (user, password_hash) = self
            .users
            .get_with_password_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Change username and/or phone number.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NothingToUpdate` if both fields are absent,
    /// a validation variant for malformed input, and a `*Taken` variant if
    /// the new value belongs to another account.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        username: Option<&str>,
        number: Option<&str>,
    ) -> Result<User, AuthError> {
        if username.is_none() && number.is_none() {
            return Err(AuthError::NothingToUpdate);
        }

        let username = username.map(Username::parse).transpose()?;
        let number = number.map(PhoneNumber::parse).transpose()?;

        self.users
            .update_profile(user_id, username.as_ref(), number.as_ref())
            .await
            .map_err(AuthError::from_repository)
    }

    /// Change a user's password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the new password is out of range,
    /// `AuthError::InvalidCredentials` if `current_password` is wrong, and
    /// `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;

        let current_hash = self
            .users
            .get_password_hash(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        verify_password(current_password, &current_hash)?;

        let new_hash = hash_password(new_password)?;
        self.users
            .update_password(user_id, &new_hash)
            .await
            .map_err(AuthError::from_repository)?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_bounds() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password(&"x".repeat(128)).is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_password_counts_chars() {
        // Six characters, twelve bytes
        assert!(validate_password("éééééé").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("pass123456").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("pass123456", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(matches!(
            verify_password("pass123456", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }
}
