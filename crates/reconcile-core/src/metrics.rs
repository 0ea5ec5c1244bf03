//! Prometheus metrics for the entitlement engine.
//!
//! Metrics register with the default registry on first access.

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

/// Lifecycle transitions by source and target tier
pub static LIFECYCLE_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "reconcile_lifecycle_transitions_total",
        "Total number of subscription lifecycle transitions",
        &["from", "to"]
    )
    .expect("Failed to register lifecycle transition counter")
});

/// Entitlement resolutions by outcome (resolved, missing_caps)
pub static ENTITLEMENT_RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "reconcile_entitlement_resolutions_total",
        "Total number of entitlement resolutions",
        &["outcome"]
    )
    .expect("Failed to register entitlement resolution counter")
});

/// Swap consumption attempts by status (consumed, exhausted, denied)
pub static SWAP_CONSUMPTION: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "reconcile_swap_consumption_total",
        "Total number of provider swap attempts",
        &["status"]
    )
    .expect("Failed to register swap consumption counter")
});

/// Malformed trial timestamps encountered during evaluation
pub static MALFORMED_TRIAL_DATES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "reconcile_malformed_trial_dates_total",
        "Total number of evaluations held back by malformed trial dates",
        &["field"]
    )
    .expect("Failed to register malformed trial date counter")
});
