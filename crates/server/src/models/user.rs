//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vitrine_core::{Email, PhoneNumber, PlanId, UserId, Username};

/// A catalog owner account.
///
/// The password hash is deliberately not part of this type; it is only ever
/// read alongside the user during credential checks.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    pub number: PhoneNumber,
    /// `None` means the user is on the default tier.
    pub plan_id: Option<PlanId>,
    pub created_at: DateTime<Utc>,
}
