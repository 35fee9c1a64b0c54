//! Bearer token issuing and verification (HS256 JWT).

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use vitrine_core::UserId;

use crate::config::AuthConfig;

/// Errors that can occur issuing or verifying a bearer token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature, structure, or algorithm check failed.
    #[error("invalid token")]
    Invalid,

    /// The token's `exp` is in the past.
    #[error("token expired")]
    Expired,

    /// The `user_id` claim is missing or not a non-negative integer.
    #[error("token has no usable user_id claim")]
    InvalidSubject,

    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize)]
struct IssuedClaims {
    user_id: UserId,
    exp: i64,
    iat: i64,
}

// Tokens from other issuers may carry the id as a number or a numeric string.
#[derive(Debug, Deserialize)]
struct ReceivedClaims {
    #[serde(default)]
    user_id: Option<Value>,
}

/// Issues and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Build a token service from the auth configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::hours(i64::from(config.token_ttl_hours)),
        }
    }

    /// Issue a token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = IssuedClaims {
            user_id,
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    /// Verify a token and extract the caller's user id.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for an expired token,
    /// `TokenError::InvalidSubject` if the `user_id` claim is unusable, and
    /// `TokenError::Invalid` for any other failure.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let validation = Validation::new(Algorithm::HS256);

        let claims = decode::<ReceivedClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {e}");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid,
                }
            })?;

        claims
            .user_id
            .as_ref()
            .and_then(coerce_user_id)
            .ok_or(TokenError::InvalidSubject)
    }
}

fn coerce_user_id(value: &Value) -> Option<UserId> {
    match value {
        Value::Number(n) => {
            let raw = n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && (0.0..=f64::from(i32::MAX)).contains(f))
                    .map(|f| {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        // Range checked above
                        let whole = f as u64;
                        whole
                    })
            })?;
            i32::try_from(raw).ok().map(UserId::new)
        }
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
