//! Entitlement resolution
//!
//! A pure function of subscription state, caller role and `now`. Safe to
//! call on every request; nothing is cached and nothing is written.

use chrono::{DateTime, Utc};
use reconcile_core::metrics::ENTITLEMENT_RESOLUTIONS;
use reconcile_core::{CoreResult, EngineConfig, Role, SubscriptionState, Tier, TierCaps};
use serde::{Deserialize, Serialize};

use crate::catalog::TierCatalog;
use crate::trial::TrialClock;

/// Capabilities available to a tenant right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEntitlement {
    pub provider_slots: u32,
    pub swaps_remaining: u32,
    pub router_enabled: bool,
    /// Role-based; does not depend on the tier.
    pub export_allowed: bool,
    pub is_trial_expired: bool,
    /// Only set while the tier is `Expired (Trial)`.
    pub days_until_inactive: Option<i64>,
}

impl ResolvedEntitlement {
    /// Whether one more provider fits.
    #[must_use]
    pub fn can_add_provider(&self, current_providers: u32) -> bool {
        current_providers < self.provider_slots
    }

    #[must_use]
    pub fn can_swap(&self) -> bool {
        self.swaps_remaining > 0
    }
}

/// Combines the tier catalog, trial clock and add-on sizing.
#[derive(Debug, Clone)]
pub struct EntitlementResolver {
    catalog: TierCatalog,
    trial_clock: TrialClock,
    provider_block_size: u32,
    export_allowed_roles: Vec<Role>,
}

impl EntitlementResolver {
    #[must_use]
    pub fn new(
        catalog: TierCatalog,
        trial_clock: TrialClock,
        provider_block_size: u32,
        export_allowed_roles: Vec<Role>,
    ) -> Self {
        Self {
            catalog,
            trial_clock,
            provider_block_size,
            export_allowed_roles,
        }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            TierCatalog::from_config(config),
            TrialClock::from_config(&config.trial),
            config.quota.provider_block_size,
            config.export.allowed_roles.clone(),
        )
    }

    #[must_use]
    pub fn catalog(&self) -> &TierCatalog {
        &self.catalog
    }

    /// Caps for the state's base tier.
    pub fn caps(&self, state: &SubscriptionState) -> CoreResult<TierCaps> {
        self.catalog.caps_for(state.tier)
    }

    /// Included slots plus purchased blocks.
    #[must_use]
    pub fn provider_slots(&self, caps: &TierCaps, extra_provider_blocks: u32) -> u32 {
        caps.provider_slots
            .saturating_add(extra_provider_blocks.saturating_mul(self.provider_block_size))
    }

    /// Swaps left this quarter, floored at zero.
    #[must_use]
    pub fn swaps_remaining(caps: &TierCaps, swaps_used: u32) -> u32 {
        caps.swaps_per_quarter.saturating_sub(swaps_used)
    }

    /// Export is decided by role alone.
    #[must_use]
    pub fn export_allowed(&self, role: Role) -> bool {
        self.export_allowed_roles.contains(&role)
    }

    /// Resolves the entitlement for `state` as seen by `role` at `now`.
    ///
    /// # Errors
    ///
    /// [`reconcile_core::CoreError::MissingTierCaps`] when the base tier is not
    /// in the catalog. Callers deny quota-gated actions on this error.
    pub fn resolve(
        &self,
        state: &SubscriptionState,
        role: Role,
        now: DateTime<Utc>,
    ) -> CoreResult<ResolvedEntitlement> {
        let caps = match self.caps(state) {
            Ok(caps) => caps,
            Err(e) => {
                ENTITLEMENT_RESOLUTIONS
                    .with_label_values(&["missing_caps"])
                    .inc();
                tracing::warn!(
                    tenant_id = %state.tenant_id,
                    tier = %state.tier,
                    error = %e,
                    "Entitlement resolution denied"
                );
                return Err(e);
            }
        };

        let days_until_inactive = match (state.tier, state.trial_start.started_at()) {
            (Tier::ExpiredTrial, Some(start)) => {
                Some(self.trial_clock.days_until_inactive(start, now))
            }
            _ => None,
        };

        let resolved = ResolvedEntitlement {
            provider_slots: self.provider_slots(&caps, state.extra_provider_blocks),
            swaps_remaining: Self::swaps_remaining(&caps, state.swaps_used),
            router_enabled: caps.router_enabled,
            export_allowed: self.export_allowed(role),
            is_trial_expired: state.tier.is_trial_ended(),
            days_until_inactive,
        };

        ENTITLEMENT_RESOLUTIONS.with_label_values(&["resolved"]).inc();
        tracing::debug!(
            tenant_id = %state.tenant_id,
            tier = %state.tier,
            provider_slots = resolved.provider_slots,
            swaps_remaining = resolved.swaps_remaining,
            "Resolved entitlement"
        );

        Ok(resolved)
    }
}

impl Default for EntitlementResolver {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
