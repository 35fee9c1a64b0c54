//! Plan repository: lookups and catalog reconciliation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vitrine_core::{PlanId, PlanLimit, Price, UserId};

use super::RepositoryError;
use crate::models::plan::{DEFAULT_PLAN_NAME, Plan, PlanDefinition};

const PLAN_COLUMNS: &str = "p.id, p.name, p.display_name, p.description, p.price, \
     p.max_products, p.max_collections, p.features, p.is_active, p.created_at, p.updated_at";

#[derive(sqlx::FromRow)]
struct PlanRow {
    id: PlanId,
    name: String,
    display_name: String,
    description: String,
    price: Price,
    max_products: i32,
    max_collections: i32,
    features: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PlanRow> for Plan {
    fn from(row: PlanRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
            description: row.description,
            price: row.price,
            max_products: PlanLimit::from_raw(row.max_products),
            max_collections: PlanLimit::from_raw(row.max_collections),
            features: row.features,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Outcome of reconciling the `plans` table against a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Plans inserted or refreshed.
    pub upserted: usize,
    /// Stale plans removed.
    pub removed: u64,
}

/// Repository for plan database operations.
pub struct PlanRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PlanRepository<'a> {
    /// Create a new plan repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active plans, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Plan>, RepositoryError> {
        let rows: Vec<PlanRow> = sqlx::query_as(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans p WHERE p.is_active ORDER BY p.price, p.id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Plan::from).collect())
    }

    /// List every plan, active or not, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Plan>, RepositoryError> {
        let rows: Vec<PlanRow> = sqlx::query_as(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans p ORDER BY p.price, p.id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Plan::from).collect())
    }

    /// Get a plan by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: PlanId) -> Result<Option<Plan>, RepositoryError> {
        let row: Option<PlanRow> =
            sqlx::query_as(&format!("SELECT {PLAN_COLUMNS} FROM plans p WHERE p.id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Plan::from))
    }

    /// Get the plan explicitly assigned to a user, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(&self, user_id: UserId) -> Result<Option<Plan>, RepositoryError> {
        let row: Option<PlanRow> = sqlx::query_as(&format!(
            "SELECT {PLAN_COLUMNS} FROM users u JOIN plans p ON p.id = u.plan_id WHERE u.id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Plan::from))
    }

    /// Get the tier applied to users without an explicit plan.
    ///
    /// Prefers the plan named `free`, falling back to the cheapest active plan.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no active plan exists.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_default(&self) -> Result<Plan, RepositoryError> {
        let row: Option<PlanRow> = sqlx::query_as(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans p
             WHERE p.is_active
             ORDER BY (p.name = $1) DESC, p.price, p.id
             LIMIT 1"
        ))
        .bind(DEFAULT_PLAN_NAME)
        .fetch_optional(self.pool)
        .await?;

        row.map(Plan::from).ok_or(RepositoryError::NotFound)
    }

    /// Make the `plans` table match `catalog` exactly.
    ///
    /// Inserts missing plans, refreshes existing ones by name, and deletes
    /// plans whose name is not in the catalog. Users on a deleted plan fall
    /// back to the default tier via `ON DELETE SET NULL`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// committed in that case.
    pub async fn reconcile(
        &self,
        catalog: &[PlanDefinition],
    ) -> Result<ReconcileSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for plan in catalog {
            sqlx::query(
                "INSERT INTO plans
                    (name, display_name, description, price, max_products, max_collections, features, is_active)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
                 ON CONFLICT (name) DO UPDATE SET
                    display_name = EXCLUDED.display_name,
                    description = EXCLUDED.description,
                    price = EXCLUDED.price,
                    max_products = EXCLUDED.max_products,
                    max_collections = EXCLUDED.max_collections,
                    features = EXCLUDED.features,
                    is_active = TRUE,
                    updated_at = NOW()",
            )
            .bind(plan.name)
            .bind(plan.display_name)
            .bind(plan.description)
            .bind(plan.price)
            .bind(plan.max_products.as_raw())
            .bind(plan.max_collections.as_raw())
            .bind(plan.features)
            .execute(&mut *tx)
            .await?;
        }

        let names: Vec<&str> = catalog.iter().map(|plan| plan.name).collect();
        let removed = sqlx::query("DELETE FROM plans WHERE name <> ALL($1)")
            .bind(&names)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(ReconcileSummary {
            upserted: catalog.len(),
            removed,
        })
    }
}
