//! Store username type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// Fewer than [`Username::MIN_LENGTH`] characters after trimming.
    #[error("username must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// More than [`Username::MAX_LENGTH`] characters after trimming.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Contains something other than letters, digits and spaces.
    #[error("username may only contain letters, numbers and spaces")]
    InvalidCharacter,
}

/// The public store name a user registers with.
///
/// Letters (ASCII and the Latin-1 accented range `À`-`ÿ`), ASCII digits and
/// whitespace are accepted; surrounding whitespace is trimmed.
///
/// ```
/// use vitrine_core::Username;
///
/// assert_eq!(Username::parse("  Loja da Ana ").unwrap().as_str(), "Loja da Ana");
/// assert!(Username::parse("Café São João").is_ok());
/// assert!(Username::parse("<script>").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Minimum length in characters.
    pub const MIN_LENGTH: usize = 2;
    /// Maximum length in characters.
    pub const MAX_LENGTH: usize = 50;

    /// Parse a `Username` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is shorter than 2 or longer
    /// than 50 characters, or contains a disallowed character.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        let s = s.trim();
        let len = s.chars().count();

        if len < Self::MIN_LENGTH {
            return Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if len > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s.chars().all(is_allowed_char) {
            return Err(UsernameError::InvalidCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Username` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

const fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || matches!(c, '\u{C0}'..='\u{FF}')
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
