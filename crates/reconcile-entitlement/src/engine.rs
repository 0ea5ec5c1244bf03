//! Entitlement engine
//!
//! Wires configuration, the injected clock, the audit sink and (optionally)
//! a subscription store around the pure trial, lifecycle and resolver logic.
//! State is always passed in explicitly; the engine keeps none of its own.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reconcile_core::metrics::SWAP_CONSUMPTION;
use reconcile_core::{
    AuditSink, Clock, CoreError, CoreResult, EngineConfig, Role, SubscriptionRecord,
    SubscriptionState, SubscriptionStore, TenantId, Tier, TrialStart,
};

use crate::audit_log::TracingAuditSink;
use crate::clock::SystemClock;
use crate::lifecycle::{LifecycleMachine, LifecycleTransition};
use crate::quarter;
use crate::resolver::{EntitlementResolver, ResolvedEntitlement};
use crate::trial::TrialClock;

/// Facade over the trial clock, lifecycle machine and resolver.
///
/// Holds configuration and collaborators only. Every operation takes the
/// tenant's [`SubscriptionState`] explicitly, and reads the time from the
/// injected [`Clock`].
pub struct EntitlementEngine {
    trial_clock: TrialClock,
    lifecycle: LifecycleMachine,
    resolver: EntitlementResolver,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditSink>,
    store: Option<Arc<dyn SubscriptionStore>>,
}

impl EntitlementEngine {
    /// Engine over `config` with an injected clock and audit sink.
    #[must_use]
    pub fn new(config: &EngineConfig, clock: Arc<dyn Clock>, audit: Arc<dyn AuditSink>) -> Self {
        let trial_clock = TrialClock::from_config(&config.trial);
        Self {
            trial_clock,
            lifecycle: LifecycleMachine::new(trial_clock),
            resolver: EntitlementResolver::from_config(config),
            clock,
            audit,
            store: None,
        }
    }

    /// Engine on the wall clock, auditing through `tracing`.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config, Arc::new(SystemClock), Arc::new(TracingAuditSink))
    }

    /// Attaches a persistence collaborator for [`Self::refresh`] and [`Self::save`].
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn SubscriptionStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn trial_clock(&self) -> &TrialClock {
        &self.trial_clock
    }

    #[must_use]
    pub fn resolver(&self) -> &EntitlementResolver {
        &self.resolver
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Builds state from a persisted record, migrating the legacy end date.
    ///
    /// Never fails: unparseable dates are carried as
    /// [`TrialStart::Malformed`] and surface during evaluation.
    #[must_use]
    pub fn load(&self, record: &SubscriptionRecord) -> SubscriptionState {
        let trial_start = self.trial_clock.load_trial_start(
            record.trial_start_date.as_deref(),
            record.trial_end_date.as_deref(),
        );

        if record.trial_start_date.is_none() && matches!(trial_start, TrialStart::Started(_)) {
            tracing::info!(
                tenant_id = %record.tenant_id,
                "Derived trial start from legacy trial end date"
            );
        }

        SubscriptionState {
            tenant_id: record.tenant_id,
            tier: record.tier,
            trial_start,
            swaps_used: record.swaps_used,
            extra_provider_blocks: record.extra_provider_blocks,
            legacy_trial_end: record.trial_end_date.clone(),
        }
    }

    /// Runs the lifecycle rules against the current time.
    pub fn evaluate(&self, state: &mut SubscriptionState) -> Vec<LifecycleTransition> {
        self.lifecycle
            .evaluate(state, self.clock.now(), self.audit.as_ref())
    }

    /// Resolves the entitlement `role` sees right now.
    pub fn resolve(&self, state: &SubscriptionState, role: Role) -> CoreResult<ResolvedEntitlement> {
        self.resolver.resolve(state, role, self.clock.now())
    }

    #[must_use]
    pub fn is_trial_active(&self, state: &SubscriptionState) -> bool {
        self.trial_clock
            .is_trial_active(&state.trial_start, self.clock.now())
    }

    #[must_use]
    pub fn trial_days_remaining(&self, state: &SubscriptionState) -> i64 {
        self.trial_clock
            .trial_days_remaining(&state.trial_start, self.clock.now())
    }

    #[must_use]
    pub fn next_quarter_reset(&self) -> DateTime<Utc> {
        quarter::next_quarter_reset(self.clock.now())
    }

    #[must_use]
    pub fn days_until_quarter_reset(&self) -> i64 {
        quarter::days_until_quarter_reset(self.clock.now())
    }

    /// Starts the trial on first use.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the tenant is not on `Trial` or a start date is
    /// already recorded; the start date is write-once.
    pub fn start_trial(&self, state: &mut SubscriptionState) -> CoreResult<DateTime<Utc>> {
        if state.tier != Tier::Trial {
            return Err(CoreError::invalid_state(format!(
                "cannot start a trial on tier {}",
                state.tier
            )));
        }
        if !state.trial_start.is_unset() {
            return Err(CoreError::invalid_state("trial start date is already set"));
        }

        let now = self.clock.now();
        state.trial_start = TrialStart::Started(now);
        tracing::info!(tenant_id = %state.tenant_id, started_at = %now, "Trial started");
        Ok(now)
    }

    /// Explicit tier change from billing (upgrade, downgrade, re-subscription).
    ///
    /// # Errors
    ///
    /// - `ValidationError` for lifecycle-only tiers.
    /// - `InvalidState` when moving back onto `Trial` after a trial began.
    pub fn change_tier(&self, state: &mut SubscriptionState, tier: Tier) -> CoreResult<()> {
        if !tier.is_base() {
            return Err(CoreError::ValidationError(format!(
                "{tier} is a lifecycle state and cannot be assigned"
            )));
        }
        if tier == Tier::Trial && state.tier != Tier::Trial && !state.trial_start.is_unset() {
            return Err(CoreError::invalid_state("trial has already been used"));
        }

        let from = state.tier;
        state.tier = tier;
        tracing::info!(tenant_id = %state.tenant_id, from = %from, to = %tier, "Tier changed");
        Ok(())
    }

    /// Consumes one provider swap; returns the swaps left afterwards.
    ///
    /// # Errors
    ///
    /// - `MissingTierCaps` when the tier has no catalog entry (denied).
    /// - `QuotaExceeded` when the quarter's swaps are used up.
    pub fn consume_swap(&self, state: &mut SubscriptionState) -> CoreResult<u32> {
        let caps = self.resolver.caps(state).map_err(|e| {
            SWAP_CONSUMPTION.with_label_values(&["denied"]).inc();
            e
        })?;

        let remaining = EntitlementResolver::swaps_remaining(&caps, state.swaps_used);
        if remaining == 0 {
            SWAP_CONSUMPTION.with_label_values(&["exhausted"]).inc();
            tracing::warn!(
                tenant_id = %state.tenant_id,
                swaps_used = state.swaps_used,
                swaps_per_quarter = caps.swaps_per_quarter,
                "Swap quota exhausted"
            );
            return Err(CoreError::quota_exceeded(format!(
                "{} of {} swaps used this quarter",
                state.swaps_used, caps.swaps_per_quarter
            )));
        }

        state.swaps_used += 1;
        SWAP_CONSUMPTION.with_label_values(&["consumed"]).inc();
        Ok(remaining - 1)
    }

    /// Adds purchased provider blocks; returns the new block count.
    ///
    /// # Errors
    ///
    /// `ValidationError` for zero blocks or counter overflow.
    pub fn purchase_provider_blocks(
        &self,
        state: &mut SubscriptionState,
        blocks: u32,
    ) -> CoreResult<u32> {
        if blocks == 0 {
            return Err(CoreError::ValidationError(
                "must purchase at least one provider block".to_string(),
            ));
        }

        state.extra_provider_blocks = state
            .extra_provider_blocks
            .checked_add(blocks)
            .ok_or_else(|| CoreError::ValidationError("provider block count overflow".to_string()))?;

        tracing::info!(
            tenant_id = %state.tenant_id,
            purchased = blocks,
            total_blocks = state.extra_provider_blocks,
            "Provider blocks purchased"
        );
        Ok(state.extra_provider_blocks)
    }

    /// Zeroes the quarter's swap usage. Invoked by the external reset job.
    pub fn reset_quarter_usage(&self, state: &mut SubscriptionState) {
        tracing::info!(
            tenant_id = %state.tenant_id,
            swaps_used = state.swaps_used,
            "Resetting quarterly swap usage"
        );
        state.swaps_used = 0;
    }

    /// Gate for adding a provider. Denies when the tier has no caps.
    #[must_use]
    pub fn can_add_provider(&self, state: &SubscriptionState, current_providers: u32) -> bool {
        match self.resolver.caps(state) {
            Ok(caps) => {
                current_providers < self.resolver.provider_slots(&caps, state.extra_provider_blocks)
            }
            Err(e) => {
                tracing::warn!(tenant_id = %state.tenant_id, error = %e, "Denying provider add");
                false
            }
        }
    }

    fn store(&self) -> CoreResult<&Arc<dyn SubscriptionStore>> {
        self.store
            .as_ref()
            .ok_or_else(|| CoreError::invalid_state("no subscription store configured"))
    }

    /// Persists a provisioned record for a new tenant.
    ///
    /// # Errors
    ///
    /// - `InvalidState` when no store is attached.
    /// - Any error the store returns from `put`.
    pub fn provision(&self, tenant_id: TenantId) -> CoreResult<SubscriptionState> {
        let store = self.store()?;
        let state = SubscriptionState::provisioned(tenant_id);
        store.put(&state.to_record())?;
        tracing::info!(tenant_id = %tenant_id, "Subscription provisioned");
        Ok(state)
    }

    /// Writes `state` back to the store.
    ///
    /// # Errors
    ///
    /// - `InvalidState` when no store is attached.
    /// - Any error the store returns from `put`.
    pub fn save(&self, state: &SubscriptionState) -> CoreResult<()> {
        self.store()?.put(&state.to_record())
    }

    /// Loads a tenant, evaluates its lifecycle and persists any change.
    ///
    /// A change is a transition or a completed legacy-date migration.
    ///
    /// # Errors
    ///
    /// - `InvalidState` when no store is attached.
    /// - `NotFound` when the store has no record for `tenant_id`.
    /// - Any error the store returns from `get` or `put`.
    pub fn refresh(&self, tenant_id: TenantId) -> CoreResult<SubscriptionState> {
        let store = self.store()?;
        let record = store
            .get(tenant_id)?
            .ok_or_else(|| CoreError::not_found("subscription", tenant_id.to_string()))?;

        let mut state = self.load(&record);
        let transitions = self.evaluate(&mut state);

        let migrated = record.trial_start_date.is_none()
            && record.trial_end_date.is_some()
            && matches!(state.trial_start, TrialStart::Started(_));

        if !transitions.is_empty() || migrated {
            store.put(&state.to_record())?;
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit_log::InMemoryAuditLog;
    use crate::clock::FixedClock;
    use crate::store::InMemorySubscriptionStore;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn engine_at(now: DateTime<Utc>) -> (EntitlementEngine, Arc<FixedClock>, Arc<InMemoryAuditLog>) {
        let clock = Arc::new(FixedClock::new(now));
        let audit = Arc::new(InMemoryAuditLog::with_clock(clock.clone()));
        let engine = EntitlementEngine::new(&EngineConfig::default(), clock.clone(), audit.clone());
        (engine, clock, audit)
    }

    #[test]
    fn start_trial_is_write_once() {
        let (engine, _, _) = engine_at(at(2025, 1, 1));
        let mut state = SubscriptionState::provisioned(TenantId::new());

        assert_eq!(engine.start_trial(&mut state).unwrap(), at(2025, 1, 1));
        assert!(engine.is_trial_active(&state));
        assert_eq!(engine.trial_days_remaining(&state), 14);
        assert!(matches!(
            engine.start_trial(&mut state),
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[test]
    fn start_trial_rejects_paid_tier() {
        let (engine, _, _) = engine_at(at(2025, 1, 1));
        let mut state = SubscriptionState::provisioned(TenantId::new());
        state.tier = Tier::Enterprise;
        assert!(engine.start_trial(&mut state).is_err());
        assert!(state.trial_start.is_unset());
    }

    #[test]
    fn swaps_run_out_then_reset() {
        let (engine, _, _) = engine_at(at(2025, 2, 1));
        let mut state = SubscriptionState::provisioned(TenantId::new());
        state.tier = Tier::Solo;

        assert_eq!(engine.consume_swap(&mut state).unwrap(), 2);
        assert_eq!(engine.consume_swap(&mut state).unwrap(), 1);
        assert_eq!(engine.consume_swap(&mut state).unwrap(), 0);
        assert!(matches!(
            engine.consume_swap(&mut state),
            Err(CoreError::QuotaExceeded { .. })
        ));
        assert_eq!(state.swaps_used, 3);

        engine.reset_quarter_usage(&mut state);
        assert_eq!(state.swaps_used, 0);
        assert_eq!(engine.consume_swap(&mut state).unwrap(), 2);
    }

    #[test]
    fn swap_denied_without_caps() {
        let mut config = EngineConfig::default();
        config.tiers.remove("solo");
        let clock = Arc::new(FixedClock::new(at(2025, 2, 1)));
        let engine = EntitlementEngine::new(&config, clock, Arc::new(InMemoryAuditLog::new()));
        let mut state = SubscriptionState::provisioned(TenantId::new());
        state.tier = Tier::Solo;

        assert!(matches!(
            engine.consume_swap(&mut state),
            Err(CoreError::MissingTierCaps { .. })
        ));
        assert_eq!(state.swaps_used, 0);
        assert!(!engine.can_add_provider(&state, 0));
    }

    #[test]
    fn purchased_blocks_open_provider_slots() {
        let (engine, _, _) = engine_at(at(2025, 2, 1));
        let mut state = SubscriptionState::provisioned(TenantId::new());
        state.tier = Tier::Basic;

        assert!(!engine.can_add_provider(&state, 10));
        assert_eq!(engine.purchase_provider_blocks(&mut state, 1).unwrap(), 1);
        assert!(engine.can_add_provider(&state, 10));
        assert!(!engine.can_add_provider(&state, 20));
        assert!(engine.purchase_provider_blocks(&mut state, 0).is_err());
    }

    #[test]
    fn change_tier_guards_lifecycle_states_and_reused_trials() {
        let (engine, _, _) = engine_at(at(2025, 3, 1));
        let mut state = SubscriptionState::provisioned(TenantId::new());
        state.trial_start = TrialStart::Started(at(2025, 1, 1));
        state.tier = Tier::Inactive;

        assert!(matches!(
            engine.change_tier(&mut state, Tier::ExpiredTrial),
            Err(CoreError::ValidationError(_))
        ));
        assert!(matches!(
            engine.change_tier(&mut state, Tier::Trial),
            Err(CoreError::InvalidState { .. })
        ));

        engine.change_tier(&mut state, Tier::MidSized).unwrap();
        assert_eq!(state.tier, Tier::MidSized);
        assert!(engine.evaluate(&mut state).is_empty());
    }

    #[test]
    fn evaluate_uses_injected_clock() {
        let (engine, clock, audit) = engine_at(at(2025, 1, 10));
        let mut state = SubscriptionState::provisioned(TenantId::new());
        state.trial_start = TrialStart::Started(at(2025, 1, 1));

        assert!(engine.evaluate(&mut state).is_empty());
        clock.set(at(2025, 1, 15));
        assert_eq!(engine.evaluate(&mut state).len(), 1);
        assert_eq!(state.tier, Tier::ExpiredTrial);
        assert_eq!(audit.entries()[0].created_at, at(2025, 1, 15));
    }

    #[test]
    fn quarter_helpers_follow_clock() {
        let (engine, _, _) = engine_at(at(2025, 3, 30));
        assert_eq!(engine.next_quarter_reset(), at(2025, 4, 1));
        assert_eq!(engine.days_until_quarter_reset(), 2);
    }

    #[test]
    fn refresh_requires_store() {
        let (engine, _, _) = engine_at(at(2025, 1, 1));
        assert!(matches!(
            engine.refresh(TenantId::new()),
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[test]
    fn refresh_unknown_tenant_is_not_found() {
        let (engine, _, _) = engine_at(at(2025, 1, 1));
        let engine = engine.with_store(Arc::new(InMemorySubscriptionStore::new()));
        assert!(matches!(
            engine.refresh(TenantId::new()),
            Err(CoreError::NotFound { .. })
        ));
    }
}
