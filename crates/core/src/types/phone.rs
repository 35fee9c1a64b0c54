//! Contact phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneNumberError {
    /// Wrong number of digits once formatting is stripped.
    #[error("phone number must have {min} to {max} digits (got {got})")]
    InvalidLength {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count.
        max: usize,
        /// Digits found in the input.
        got: usize,
    },
}

/// A phone number reduced to its digits.
///
/// Any formatting (spaces, dashes, parentheses, a leading `+`) is dropped;
/// what remains must be 10 or 11 digits (area code plus subscriber number).
///
/// ```
/// use vitrine_core::PhoneNumber;
///
/// assert_eq!(PhoneNumber::parse("(11) 99999-9999").unwrap().as_str(), "11999999999");
/// assert!(PhoneNumber::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum digit count.
    pub const MIN_DIGITS: usize = 10;
    /// Maximum digit count.
    pub const MAX_DIGITS: usize = 11;

    /// Parse a `PhoneNumber`, keeping only ASCII digits.
    ///
    /// # Errors
    ///
    /// Returns `PhoneNumberError::InvalidLength` if the digit count falls
    /// outside 10..=11.
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len()) {
            return Err(PhoneNumberError::InvalidLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
                got: digits.len(),
            });
        }

        Ok(Self(digits))
    }

    /// Returns the digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `PhoneNumber` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
