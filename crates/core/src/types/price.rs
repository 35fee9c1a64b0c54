//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Not a decimal number.
    #[error("price must be a decimal number")]
    NotANumber,
    /// Below zero.
    #[error("price cannot be negative")]
    Negative,
    /// More than two fractional digits.
    #[error("price must have at most {max} decimal places")]
    TooPrecise {
        /// Maximum fractional digits.
        max: u32,
    },
}

/// A non-negative amount with at most two decimal places.
///
/// Serialized as a JSON number (e.g. `29.9`) so API clients can treat it as
/// a float; stored as `NUMERIC(12, 2)`.
///
/// ```
/// use vitrine_core::Price;
///
/// assert_eq!(Price::parse("29.90").unwrap().to_string(), "29.90");
/// assert!(Price::parse("-1").is_err());
/// assert!(Price::parse("1.999").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Maximum number of fractional digits.
    pub const MAX_SCALE: u32 = 2;

    /// Free.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or has more than two
    /// fractional digits (after trailing zeros are dropped).
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let normalized = amount.normalize();
        if normalized.scale() > Self::MAX_SCALE {
            return Err(PriceError::TooPrecise {
                max: Self::MAX_SCALE,
            });
        }
        let mut rounded = normalized;
        rounded.rescale(Self::MAX_SCALE);
        Ok(Self(rounded))
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub const fn from_cents(cents: u32) -> Self {
        Self(Decimal::from_parts(cents, 0, 0, false, Self::MAX_SCALE))
    }

    /// Parse a price from text such as `"19.90"` or `"5"`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotANumber` for non-numeric input, otherwise the
    /// same errors as [`Price::new`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Price {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Binary floats rarely land on exact cents
        let amount: Decimal = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount.round_dp(Self::MAX_SCALE)).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // NUMERIC(12, 2) with a CHECK (>= 0) constraint
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
