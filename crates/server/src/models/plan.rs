//! Subscription plans and the built-in plan catalog.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vitrine_core::{PlanId, PlanLimit, Price, ResourceKind};

/// A subscription tier as stored in the database.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub price: Price,
    pub max_products: PlanLimit,
    pub max_collections: PlanLimit,
    pub features: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// The ceiling this plan puts on the given resource kind.
    #[must_use]
    pub const fn limit_for(&self, kind: ResourceKind) -> PlanLimit {
        match kind {
            ResourceKind::Product => self.max_products,
            ResourceKind::Collection => self.max_collections,
        }
    }
}

/// A user's plan together with their current usage.
#[derive(Debug, Clone, Serialize)]
pub struct UserPlanInfo {
    pub plan: Plan,
    pub product_count: i64,
    pub collection_count: i64,
    pub can_create_product: bool,
    pub can_create_collection: bool,
}

impl UserPlanInfo {
    #[must_use]
    pub fn new(plan: Plan, product_count: i64, collection_count: i64) -> Self {
        Self {
            can_create_product: plan.max_products.allows(product_count),
            can_create_collection: plan.max_collections.allows(collection_count),
            plan,
            product_count,
            collection_count,
        }
    }
}

/// A built-in tier definition, reconciled into the `plans` table.
#[derive(Debug, Clone, Copy)]
pub struct PlanDefinition {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub price: Price,
    pub max_products: PlanLimit,
    pub max_collections: PlanLimit,
    pub features: &'static [&'static str],
}

/// Name of the tier users without an explicit plan fall back to.
pub const DEFAULT_PLAN_NAME: &str = "free";

/// The fixed set of tiers. This is the source of truth for the `plans` table.
pub const CATALOG: &[PlanDefinition] = &[
    PlanDefinition {
        name: "free",
        display_name: "Free",
        description: "Perfect for getting started",
        price: Price::ZERO,
        max_products: PlanLimit::Limited(10),
        max_collections: PlanLimit::Limited(2),
        features: &[
            "Up to 10 products",
            "Up to 2 showcases",
            "Link sharing",
            "Email support",
        ],
    },
    PlanDefinition {
        name: "basic",
        display_name: "Basic",
        description: "For small businesses",
        price: Price::from_cents(2990),
        max_products: PlanLimit::Limited(30),
        max_collections: PlanLimit::Limited(3),
        features: &[
            "Up to 30 products",
            "Up to 3 showcases",
            "Link sharing",
            "Email support",
        ],
    },
    PlanDefinition {
        name: "plus",
        display_name: "Plus",
        description: "For growing businesses",
        price: Price::from_cents(5990),
        max_products: PlanLimit::Limited(50),
        max_collections: PlanLimit::Limited(5),
        features: &[
            "Up to 50 products",
            "Up to 5 showcases",
            "Link sharing",
            "Priority support",
        ],
    },
    PlanDefinition {
        name: "pro",
        display_name: "Professional",
        description: "For established businesses",
        price: Price::from_cents(8990),
        max_products: PlanLimit::Limited(100),
        max_collections: PlanLimit::Limited(10),
        features: &[
            "Up to 100 products",
            "Up to 10 showcases",
            "Link sharing",
            "24/7 support",
            "Custom domain",
            "Advanced analytics",
        ],
    },
    PlanDefinition {
        name: "enterprise",
        display_name: "Enterprise",
        description: "For large operations",
        price: Price::from_cents(12990),
        max_products: PlanLimit::Unlimited,
        max_collections: PlanLimit::Unlimited,
        features: &[
            "Unlimited products",
            "Unlimited showcases",
            "Link sharing",
            "Dedicated support",
            "Custom domain",
            "Advanced analytics",
            "API access",
            "White label",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_unique() {
        let mut names: Vec<_> = CATALOG.iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn test_catalog_contains_default_plan() {
        let free = CATALOG.iter().find(|p| p.name == DEFAULT_PLAN_NAME);
        assert!(free.is_some_and(|p| p.price == Price::ZERO));
    }

    #[test]
    fn test_catalog_sorted_by_price() {
        assert!(CATALOG.windows(2).all(|w| matches!(w, [a, b] if a.price < b.price)));
    }

    #[test]
    fn test_enterprise_is_unlimited() {
        let enterprise = CATALOG.iter().find(|p| p.name == "enterprise");
        assert!(enterprise.is_some_and(|p| {
            p.max_products == PlanLimit::Unlimited && p.max_collections == PlanLimit::Unlimited
        }));
    }

    #[test]
    fn test_user_plan_info_flags() {
        let plan = Plan {
            id: PlanId::new(1),
            name: "free".to_string(),
            display_name: "Free".to_string(),
            description: String::new(),
            price: Price::ZERO,
            max_products: PlanLimit::Limited(10),
            max_collections: PlanLimit::Limited(2),
            features: vec![],
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let info = UserPlanInfo::new(plan, 3, 2);
        assert!(info.can_create_product);
        assert!(!info.can_create_collection);
        assert_eq!(info.plan.limit_for(ResourceKind::Collection), PlanLimit::Limited(2));
    }
}
