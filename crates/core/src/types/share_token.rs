//! Public share token type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShareToken`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareTokenError {
    /// Not exactly [`ShareToken::ENCODED_LEN`] characters.
    #[error("share token must be {expected} characters")]
    InvalidLength {
        /// Expected length.
        expected: usize,
    },
    /// Contains a character outside the URL-safe base64 alphabet.
    #[error("share token contains an invalid character")]
    InvalidCharacter,
}

/// An opaque token granting anonymous read access to one collection.
///
/// Tokens are [`ShareToken::RANDOM_BYTES`] bytes of OS randomness encoded as
/// unpadded URL-safe base64, so a well-formed token is always
/// [`ShareToken::ENCODED_LEN`] characters from `[A-Za-z0-9_-]`. Generation
/// lives in the server crate; this type only validates shape.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShareToken(String);

impl ShareToken {
    /// Bytes of randomness behind each token (192 bits).
    pub const RANDOM_BYTES: usize = 24;
    /// Length of the encoded token.
    pub const ENCODED_LEN: usize = 32;

    /// Validate a token received from a URL or the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the input has the wrong length or contains a
    /// character outside the URL-safe base64 alphabet.
    pub fn parse(s: &str) -> Result<Self, ShareTokenError> {
        if s.len() != Self::ENCODED_LEN {
            return Err(ShareTokenError::InvalidLength {
                expected: Self::ENCODED_LEN,
            });
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(ShareTokenError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ShareToken {
    type Error = ShareTokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShareToken> for String {
    fn from(token: ShareToken) -> Self {
        token.0
    }
}

// Tokens are bearer secrets; keep them out of logs.
impl fmt::Debug for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShareToken").field(&"[REDACTED]").finish()
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ShareToken {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ShareToken {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ShareToken {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const VALID: &str = "AbCdEfGhIjKlMnOpQrStUvWxYz012-_9";

    #[test]
    fn test_parse_valid() {
        assert_eq!(VALID.len(), ShareToken::ENCODED_LEN);
        assert_eq!(ShareToken::parse(VALID).unwrap().as_str(), VALID);
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            ShareToken::parse("short"),
            Err(ShareTokenError::InvalidLength { expected: 32 })
        ));
        assert!(ShareToken::parse("").is_err());
        assert!(ShareToken::parse(&format!("{VALID}A")).is_err());
    }

    #[test]
    fn test_parse_rejects_non_url_safe() {
        let padded = format!("{}=", &VALID[..31]);
        assert_eq!(
            ShareToken::parse(&padded),
            Err(ShareTokenError::InvalidCharacter)
        );
        let slashed = format!("{}/", &VALID[..31]);
        assert_eq!(
            ShareToken::parse(&slashed),
            Err(ShareTokenError::InvalidCharacter)
        );
    }

    #[test]
    fn test_serde_validates_shape() {
        let token: ShareToken = serde_json::from_str(&format!("\"{VALID}\"")).unwrap();
        assert_eq!(token.as_str(), VALID);
        assert_eq!(serde_json::to_string(&token).unwrap(), format!("\"{VALID}\""));

        assert!(serde_json::from_str::<ShareToken>("\"short\"").is_err());
        let padded = format!("\"{}=\"", &VALID[..31]);
        assert!(serde_json::from_str::<ShareToken>(&padded).is_err());
    }

    #[test]
    fn test_debug_redacts() {
        let token = ShareToken::parse(VALID).unwrap();
        assert!(!format!("{token:?}").contains(VALID));
    }
}
