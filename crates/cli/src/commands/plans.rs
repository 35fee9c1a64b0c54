//! Plan catalog commands.
//!
//! The server reconciles the catalog on every start; `sync` does the same
//! without starting it, e.g. right after `migrate`.

use vitrine_server::db::PlanRepository;
use vitrine_server::models::plan::CATALOG;

use super::{CommandError, connect};

/// Reconcile the stored plans with the built-in catalog.
pub async fn sync() -> Result<(), CommandError> {
    let pool = connect().await?;

    let summary = PlanRepository::new(&pool).reconcile(CATALOG).await?;

    tracing::info!(
        "Plan catalog synced: {} upserted, {} removed",
        summary.upserted,
        summary.removed
    );
    Ok(())
}

/// Log every stored plan.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;

    let plans = PlanRepository::new(&pool).list_all().await?;
    if plans.is_empty() {
        tracing::warn!("No plans stored; run `vitrine-cli plans sync`");
    }

    for plan in plans {
        tracing::info!(
            "#{} {} ({}) price={} products={} collections={} active={}",
            plan.id,
            plan.name,
            plan.display_name,
            plan.price,
            plan.max_products,
            plan.max_collections,
            plan.is_active
        );
    }
    Ok(())
}
