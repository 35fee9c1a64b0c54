//! Plan quota types.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The kinds of owned resources a plan puts a ceiling on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Product,
    Collection,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product => write!(f, "product"),
            Self::Collection => write!(f, "collection"),
        }
    }
}

/// A per-plan ceiling on how many resources a user may own.
///
/// Stored as an integer column where `-1` means unlimited.
///
/// ```
/// use vitrine_core::PlanLimit;
///
/// assert!(PlanLimit::from_raw(2).allows(1));
/// assert!(!PlanLimit::from_raw(2).allows(2));
/// assert!(PlanLimit::from_raw(-1).allows(1_000_000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanLimit {
    /// No ceiling.
    Unlimited,
    /// At most this many resources.
    Limited(u32),
}

impl PlanLimit {
    /// Raw column value meaning "no ceiling".
    pub const UNLIMITED_RAW: i32 = -1;

    /// Interpret a raw column value. Any negative value is unlimited.
    #[must_use]
    pub fn from_raw(raw: i32) -> Self {
        u32::try_from(raw).map_or(Self::Unlimited, Self::Limited)
    }

    /// Convert back to the raw column value.
    #[must_use]
    pub fn as_raw(self) -> i32 {
        match self {
            Self::Unlimited => Self::UNLIMITED_RAW,
            Self::Limited(max) => i32::try_from(max).unwrap_or(i32::MAX),
        }
    }

    /// Whether one more resource may be created when `current` already exist.
    #[must_use]
    pub fn allows(self, current: i64) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Limited(max) => current < i64::from(max),
        }
    }
}

impl fmt::Display for PlanLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::Limited(max) => write!(f, "{max}"),
        }
    }
}

impl Serialize for PlanLimit {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_raw())
    }
}

impl<'de> Deserialize<'de> for PlanLimit {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i32::deserialize(deserializer).map(Self::from_raw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw() {
        assert_eq!(PlanLimit::from_raw(-1), PlanLimit::Unlimited);
        assert_eq!(PlanLimit::from_raw(-5), PlanLimit::Unlimited);
        assert_eq!(PlanLimit::from_raw(0), PlanLimit::Limited(0));
        assert_eq!(PlanLimit::from_raw(10), PlanLimit::Limited(10));
    }

    #[test]
    fn test_allows_strictly_below_limit() {
        let limit = PlanLimit::Limited(10);
        assert!(limit.allows(0));
        assert!(limit.allows(9));
        assert!(!limit.allows(10));
        assert!(!limit.allows(11));
    }

    #[test]
    fn test_display() {
        assert_eq!(PlanLimit::Unlimited.to_string(), "unlimited");
        assert_eq!(PlanLimit::Limited(30).to_string(), "30");
    }

    #[test]
    fn test_zero_limit_denies_everything() {
        assert!(!PlanLimit::Limited(0).allows(0));
    }

    #[test]
    fn test_unlimited_always_allows() {
        assert!(PlanLimit::Unlimited.allows(0));
        assert!(PlanLimit::Unlimited.allows(i64::MAX));
    }

    #[test]
    fn test_serde_uses_raw_value() {
        assert_eq!(serde_json::to_string(&PlanLimit::Unlimited).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&PlanLimit::Limited(5)).unwrap(), "5");
        let parsed: PlanLimit = serde_json::from_str("-1").unwrap();
        assert_eq!(parsed, PlanLimit::Unlimited);
    }
}
