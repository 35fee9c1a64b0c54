//! Plan quota checks.
//!
//! The check and the subsequent insert are not serialized, so two concurrent
//! creates at `limit - 1` can both pass. The ceiling is advisory under
//! concurrency.

use sqlx::PgPool;

use vitrine_core::{ResourceKind, UserId};

use crate::db::{CollectionRepository, PlanRepository, ProductRepository, RepositoryError};
use crate::models::{Plan, UserPlanInfo};

/// Result of a quota check. A denial is a normal outcome, not an error.
#[derive(Debug, Clone)]
pub struct QuotaCheck {
    pub allowed: bool,
    pub plan: Plan,
    pub current_count: i64,
    pub kind: ResourceKind,
}

/// Computes what a user's plan allows them to create.
pub struct QuotaService<'a> {
    pool: &'a PgPool,
}

impl<'a> QuotaService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve the plan that applies to a user, falling back to the default tier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no plan and no
    /// active plan exists, or `RepositoryError::Database` on query failure.
    pub async fn plan_for(&self, user_id: UserId) -> Result<Plan, RepositoryError> {
        let plans = PlanRepository::new(self.pool);
        match plans.get_for_user(user_id).await? {
            Some(plan) => Ok(plan),
            None => plans.get_default().await,
        }
    }

    /// Check whether `user_id` may create one more resource of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the plan or count cannot be read. A
    /// quota denial is reported through `QuotaCheck::allowed`, never as an error.
    pub async fn check_limit(
        &self,
        user_id: UserId,
        kind: ResourceKind,
    ) -> Result<QuotaCheck, RepositoryError> {
        let plan = self.plan_for(user_id).await?;
        let current_count = self.count(user_id, kind).await?;

        Ok(QuotaCheck {
            allowed: plan.limit_for(kind).allows(current_count),
            plan,
            current_count,
            kind,
        })
    }

    /// Summarize a user's plan and usage.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the plan or counts cannot be read.
    pub async fn plan_info(&self, user_id: UserId) -> Result<UserPlanInfo, RepositoryError> {
        let plan = self.plan_for(user_id).await?;
        let product_count = self.count(user_id, ResourceKind::Product).await?;
        let collection_count = self.count(user_id, ResourceKind::Collection).await?;

        Ok(UserPlanInfo::new(plan, product_count, collection_count))
    }

    async fn count(&self, user_id: UserId, kind: ResourceKind) -> Result<i64, RepositoryError> {
        match kind {
            ResourceKind::Product => ProductRepository::new(self.pool).count_by_owner(user_id).await,
            ResourceKind::Collection => {
                CollectionRepository::new(self.pool)
                    .count_by_owner(user_id)
                    .await
            }
        }
    }
}
