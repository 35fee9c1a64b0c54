//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vitrine_core::{Email, PhoneNumber, PlanId, UserId, Username};

use super::RepositoryError;
use crate::models::User;

const USER_COLUMNS: &str = "id, username, email, number, plan_id, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    email: String,
    number: String,
    plan_id: Option<PlanId>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let number = PhoneNumber::parse(&row.number).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid number in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            username,
            email,
            number,
            plan_id: row.plan_id,
            created_at: row.created_at,
        })
    }
}

/// Validated fields for a new account.
pub struct NewUser<'a> {
    pub username: &'a Username,
    pub email: &'a Email,
    pub number: &'a PhoneNumber,
    pub password_hash: &'a str,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` carrying the violated constraint
    /// name if the username, email, or number is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_user: &NewUser<'_>) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (username, email, number, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new_user.username.as_str())
        .bind(new_user.email)
        .bind(new_user.number.as_str())
        .bind(new_user.password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_unique_violation)?;

        row.try_into()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored field is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user and their password hash by email, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored field is invalid.
    pub async fn get_with_password_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<UserWithPasswordRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((User::try_from(r.user)?, r.password_hash)))
            .transpose()
    }

    /// Get a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(hash)
    }

    /// Update the profile fields that are present, leaving the rest unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Conflict` if the new username or number is taken.
    pub async fn update_profile(
        &self,
        id: UserId,
        username: Option<&Username>,
        number: Option<&PhoneNumber>,
    ) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users
             SET username = COALESCE($2, username),
                 number = COALESCE($3, number),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(username.map(Username::as_str))
        .bind(number.map(PhoneNumber::as_str))
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::from_unique_violation)?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Assign a plan to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_plan(&self, id: UserId, plan_id: PlanId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET plan_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(plan_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
