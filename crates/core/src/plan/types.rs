//! Plan and limit types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the fallback plan every unknown tenant resolves to.
pub const FREE_PLAN: &str = "free";

/// A subscription plan as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan name, the catalog key.
    pub name: String,
    /// Human-readable price label.
    pub price_label: String,
    /// Storage cap in bytes; `None` means unlimited.
    pub storage_limit_bytes: Option<i64>,
    /// Largest single file accepted.
    pub max_file_size_bytes: i64,
    /// Requests allowed per rolling 24-hour window; `None` means
    /// unlimited.
    pub max_requests_per_day: Option<i64>,
    /// Longest signed-reference validity this plan grants, in seconds.
    pub max_reference_ttl_secs: i64,
    /// Set for bespoke plans managed outside the seeded catalog.
    pub is_custom: bool,
}

impl Plan {
    /// Built-in free plan, used when the store has no `free` row at all.
    #[must_use]
    pub fn default_free() -> Self {
        Self {
            name: FREE_PLAN.to_string(),
            price_label: "Free".to_string(),
            storage_limit_bytes: Some(5 * 1024 * 1024 * 1024),
            max_file_size_bytes: 10 * 1024 * 1024,
            max_requests_per_day: Some(500),
            max_reference_ttl_secs: 7 * 24 * 3600,
            is_custom: false,
        }
    }
}

/// Per-tenant plan override. A `None` field inherits the base plan; a
/// `Some` field wins. At most one override exists per tenant and the
/// merge always yields a full plan, never a partial one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOverride {
    /// Tenant this override belongs to.
    pub tenant_id: Uuid,
    /// Overridden price label.
    pub price_label: Option<String>,
    /// Overridden storage cap.
    pub storage_limit_bytes: Option<i64>,
    /// Overridden max file size.
    pub max_file_size_bytes: Option<i64>,
    /// Overridden request allowance.
    pub max_requests_per_day: Option<i64>,
    /// Overridden signed-reference ceiling.
    pub max_reference_ttl_secs: Option<i64>,
}

/// The limits a request is actually judged against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveLimits {
    /// Base plan name the limits were derived from.
    pub plan_name: String,
    /// Human-readable price label.
    pub price_label: String,
    /// Storage cap in bytes; `None` means unlimited.
    pub storage_limit_bytes: Option<i64>,
    /// Largest single file accepted.
    pub max_file_size_bytes: i64,
    /// Requests per rolling day; `None` means unlimited.
    pub max_requests_per_day: Option<i64>,
    /// Longest signed-reference validity, in seconds.
    pub max_reference_ttl_secs: i64,
}

impl EffectiveLimits {
    /// Limits of a plan with no override applied.
    #[must_use]
    pub fn from_plan(plan: &Plan) -> Self {
        Self {
            plan_name: plan.name.clone(),
            price_label: plan.price_label.clone(),
            storage_limit_bytes: plan.storage_limit_bytes,
            max_file_size_bytes: plan.max_file_size_bytes,
            max_requests_per_day: plan.max_requests_per_day,
            max_reference_ttl_secs: plan.max_reference_ttl_secs,
        }
    }

    /// Merge an override onto a base plan, field-wise.
    #[must_use]
    pub fn merged(plan: &Plan, overrides: &PlanOverride) -> Self {
        Self {
            plan_name: plan.name.clone(),
            price_label: overrides
                .price_label
                .clone()
                .unwrap_or_else(|| plan.price_label.clone()),
            storage_limit_bytes: overrides.storage_limit_bytes.or(plan.storage_limit_bytes),
            max_file_size_bytes: overrides
                .max_file_size_bytes
                .unwrap_or(plan.max_file_size_bytes),
            max_requests_per_day: overrides.max_requests_per_day.or(plan.max_requests_per_day),
            max_reference_ttl_secs: overrides
                .max_reference_ttl_secs
                .unwrap_or(plan.max_reference_ttl_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_plan() -> Plan {
        Plan {
            name: "paid".to_string(),
            price_label: "Monthly".to_string(),
            storage_limit_bytes: Some(1000),
            max_file_size_bytes: 100,
            max_requests_per_day: Some(50),
            max_reference_ttl_secs: 3600,
            is_custom: false,
        }
    }

    fn empty_override() -> PlanOverride {
        PlanOverride {
            tenant_id: Uuid::new_v4(),
            price_label: None,
            storage_limit_bytes: None,
            max_file_size_bytes: None,
            max_requests_per_day: None,
            max_reference_ttl_secs: None,
        }
    }

    #[test]
    fn test_empty_override_inherits_everything() {
        let plan = base_plan();
        let merged = EffectiveLimits::merged(&plan, &empty_override());
        assert_eq!(merged, EffectiveLimits::from_plan(&plan));
    }

    #[test]
    fn test_non_null_override_fields_win() {
        let plan = base_plan();
        let overrides = PlanOverride {
            storage_limit_bytes: Some(5000),
            max_requests_per_day: Some(10),
            ..empty_override()
        };
        let merged = EffectiveLimits::merged(&plan, &overrides);
        assert_eq!(merged.storage_limit_bytes, Some(5000));
        assert_eq!(merged.max_requests_per_day, Some(10));
        // untouched fields inherit
        assert_eq!(merged.max_file_size_bytes, 100);
        assert_eq!(merged.max_reference_ttl_secs, 3600);
        assert_eq!(merged.price_label, "Monthly");
    }

    #[test]
    fn test_merge_keeps_plan_name() {
        let plan = base_plan();
        let overrides = PlanOverride {
            price_label: Some("Negotiated".to_string()),
            ..empty_override()
        };
        let merged = EffectiveLimits::merged(&plan, &overrides);
        assert_eq!(merged.plan_name, "paid");
        assert_eq!(merged.price_label, "Negotiated");
    }

    #[test]
    fn test_default_free_plan_constants() {
        let free = Plan::default_free();
        assert_eq!(free.name, FREE_PLAN);
        assert_eq!(free.storage_limit_bytes, Some(5 * 1024 * 1024 * 1024));
        assert_eq!(free.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(free.max_requests_per_day, Some(500));
        assert_eq!(free.max_reference_ttl_secs, 604_800);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_plan() -> impl Strategy<Value = Plan> {
        (
            proptest::option::of(0i64..1_000_000),
            1i64..1_000_000,
            proptest::option::of(0i64..100_000),
            1i64..1_000_000,
        )
            .prop_map(|(storage, file, requests, ttl)| Plan {
                name: "base".to_string(),
                price_label: "Base".to_string(),
                storage_limit_bytes: storage,
                max_file_size_bytes: file,
                max_requests_per_day: requests,
                max_reference_ttl_secs: ttl,
                is_custom: false,
            })
    }

    fn arb_override() -> impl Strategy<Value = PlanOverride> {
        (
            proptest::option::of(0i64..1_000_000),
            proptest::option::of(1i64..1_000_000),
            proptest::option::of(0i64..100_000),
            proptest::option::of(1i64..1_000_000),
        )
            .prop_map(|(storage, file, requests, ttl)| PlanOverride {
                tenant_id: Uuid::nil(),
                price_label: None,
                storage_limit_bytes: storage,
                max_file_size_bytes: file,
                max_requests_per_day: requests,
                max_reference_ttl_secs: ttl,
            })
    }

    proptest! {
        // Property 1: every overridden field appears verbatim in the
        // merge; every inherited field matches the base plan.
        #[test]
        fn prop_merge_is_field_wise(plan in arb_plan(), ovr in arb_override()) {
            let merged = EffectiveLimits::merged(&plan, &ovr);

            match ovr.storage_limit_bytes {
                Some(v) => prop_assert_eq!(merged.storage_limit_bytes, Some(v)),
                None => prop_assert_eq!(merged.storage_limit_bytes, plan.storage_limit_bytes),
            }
            match ovr.max_file_size_bytes {
                Some(v) => prop_assert_eq!(merged.max_file_size_bytes, v),
                None => prop_assert_eq!(merged.max_file_size_bytes, plan.max_file_size_bytes),
            }
            match ovr.max_requests_per_day {
                Some(v) => prop_assert_eq!(merged.max_requests_per_day, Some(v)),
                None => prop_assert_eq!(merged.max_requests_per_day, plan.max_requests_per_day),
            }
            match ovr.max_reference_ttl_secs {
                Some(v) => prop_assert_eq!(merged.max_reference_ttl_secs, v),
                None => prop_assert_eq!(merged.max_reference_ttl_secs, plan.max_reference_ttl_secs),
            }
        }

        // Property 2: merging never produces a partial plan; the result
        // always carries the base plan's name.
        #[test]
        fn prop_merge_keeps_identity(plan in arb_plan(), ovr in arb_override()) {
            let merged = EffectiveLimits::merged(&plan, &ovr);
            prop_assert_eq!(merged.plan_name, plan.name);
        }
    }
}
