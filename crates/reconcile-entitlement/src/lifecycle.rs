//! Trial lifecycle state machine
//!
//! ```text
//! Trial ──(trial over)──▶ Expired (Trial) ──(grace over)──▶ Inactive
//! ```
//!
//! Level-triggered: every evaluation looks at the state and the time as they
//! are now, so a tenant that was away for months walks through every state
//! it missed, in order, in a single call. Nothing here ever moves a tenant
//! back to `Trial`; that takes an explicit tier change.

use chrono::{DateTime, Utc};
use reconcile_core::metrics::{LIFECYCLE_TRANSITIONS, MALFORMED_TRIAL_DATES};
use reconcile_core::{AuditAction, AuditSink, Role, SubscriptionState, Tier, TrialStart};
use serde::Serialize;

use crate::trial::TrialClock;

/// One tier change made by the lifecycle machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LifecycleTransition {
    pub from: Tier,
    pub to: Tier,
    pub action: AuditAction,
    pub at: DateTime<Utc>,
}

/// Applies the trial expiry and inactivity rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleMachine {
    trial_clock: TrialClock,
}

impl LifecycleMachine {
    #[must_use]
    pub fn new(trial_clock: TrialClock) -> Self {
        Self { trial_clock }
    }

    /// Next state reachable from `tier` at `now`, if any rule fires.
    #[must_use]
    pub fn next_transition(
        &self,
        tier: Tier,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<(Tier, AuditAction)> {
        match tier {
            Tier::Trial if !self.trial_clock.is_trial_active(&TrialStart::Started(start), now) => {
                Some((Tier::ExpiredTrial, AuditAction::TrialExpired))
            }
            Tier::ExpiredTrial if self.trial_clock.is_grace_elapsed(start, now) => {
                Some((Tier::Inactive, AuditAction::TrialInactive))
            }
            _ => None,
        }
    }

    /// Brings `state.tier` up to date and audits every transition.
    ///
    /// Tenants on a paid tier, tenants whose trial never started, and tenants
    /// whose trial date cannot be parsed are left alone. The last case is
    /// reported to `audit` as a warning and never fails the caller.
    pub fn evaluate(
        &self,
        state: &mut SubscriptionState,
        now: DateTime<Utc>,
        audit: &dyn AuditSink,
    ) -> Vec<LifecycleTransition> {
        if !state.tier.is_trial_lifecycle() {
            return Vec::new();
        }

        let start = match &state.trial_start {
            TrialStart::Started(start) => *start,
            TrialStart::Unset => return Vec::new(),
            TrialStart::Malformed { field, raw } => {
                let field: &str = field;
                MALFORMED_TRIAL_DATES.with_label_values(&[field]).inc();
                tracing::warn!(
                    tenant_id = %state.tenant_id,
                    tier = %state.tier,
                    field,
                    value = %raw,
                    "Holding lifecycle state: malformed trial date"
                );
                audit.warn(
                    state.tenant_id,
                    &format!("{field} is not a valid timestamp: {raw:?}; lifecycle held at {}", state.tier),
                );
                return Vec::new();
            }
        };

        let mut transitions = Vec::new();
        while let Some((to, action)) = self.next_transition(state.tier, start, now) {
            let from = state.tier;
            state.tier = to;

            LIFECYCLE_TRANSITIONS
                .with_label_values(&[from.as_str(), to.as_str()])
                .inc();
            tracing::info!(
                tenant_id = %state.tenant_id,
                from = %from,
                to = %to,
                action = action.as_str(),
                "Subscription lifecycle transition"
            );
            audit.log(action, state.tenant_id, Role::System.as_str());

            transitions.push(LifecycleTransition {
                from,
                to,
                action,
                at: now,
            });
        }

        transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit_log::InMemoryAuditLog;
    use chrono::TimeZone;
    use reconcile_core::{TenantId, TRIAL_START_FIELD};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn trial_state() -> SubscriptionState {
        let mut state = SubscriptionState::provisioned(TenantId::new());
        state.trial_start = TrialStart::Started(at(2025, 1, 1));
        state
    }

    #[test]
    fn active_trial_does_not_move() {
        let machine = LifecycleMachine::default();
        let log = InMemoryAuditLog::new();
        let mut state = trial_state();

        assert!(machine.evaluate(&mut state, at(2025, 1, 10), &log).is_empty());
        assert_eq!(state.tier, Tier::Trial);
        assert!(log.is_empty());
    }

    #[test]
    fn unstarted_trial_does_not_move() {
        let machine = LifecycleMachine::default();
        let log = InMemoryAuditLog::new();
        let mut state = SubscriptionState::provisioned(TenantId::new());

        assert!(machine.evaluate(&mut state, at(2030, 1, 1), &log).is_empty());
        assert_eq!(state.tier, Tier::Trial);
        assert!(log.is_empty());
    }

    #[test]
    fn paid_tiers_are_ignored_even_with_old_trial() {
        let machine = LifecycleMachine::default();
        let log = InMemoryAuditLog::new();
        let mut state = trial_state();
        state.tier = Tier::Solo;

        assert!(machine.evaluate(&mut state, at(2026, 1, 1), &log).is_empty());
        assert_eq!(state.tier, Tier::Solo);
    }

    #[test]
    fn inactive_is_terminal() {
        let machine = LifecycleMachine::default();
        let log = InMemoryAuditLog::new();
        let mut state = trial_state();
        state.tier = Tier::Inactive;

        assert!(machine.evaluate(&mut state, at(2030, 1, 1), &log).is_empty());
        assert_eq!(state.tier, Tier::Inactive);
    }

    #[test]
    fn stale_trial_walks_through_every_state() {
        let machine = LifecycleMachine::default();
        let log = InMemoryAuditLog::new();
        let mut state = trial_state();

        let transitions = machine.evaluate(&mut state, at(2025, 6, 1), &log);
        let path: Vec<_> = transitions.iter().map(|t| (t.from, t.to)).collect();
        assert_eq!(
            path,
            vec![
                (Tier::Trial, Tier::ExpiredTrial),
                (Tier::ExpiredTrial, Tier::Inactive)
            ]
        );
        assert_eq!(log.action_codes(), vec!["TRIAL_EXPIRED", "TRIAL_INACTIVE"]);
        assert_eq!(log.entries()[0].actor_role, "SYSTEM");
    }

    #[test]
    fn evaluation_is_idempotent_once_settled() {
        let machine = LifecycleMachine::default();
        let log = InMemoryAuditLog::new();
        let mut state = trial_state();

        assert_eq!(machine.evaluate(&mut state, at(2025, 1, 20), &log).len(), 1);
        assert!(machine.evaluate(&mut state, at(2025, 1, 20), &log).is_empty());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn malformed_start_holds_and_warns() {
        let machine = LifecycleMachine::default();
        let log = InMemoryAuditLog::new();
        let mut state = SubscriptionState::provisioned(TenantId::new());
        state.trial_start = TrialStart::Malformed {
            field: TRIAL_START_FIELD,
            raw: "yesterday-ish".into(),
        };

        assert!(machine.evaluate(&mut state, at(2030, 1, 1), &log).is_empty());
        assert_eq!(state.tier, Tier::Trial);
        assert!(log.action_codes().is_empty());
        let warnings = log.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("trialStartDate"));
        assert!(warnings[0].contains("yesterday-ish"));
    }

    #[test]
    fn next_transition_rules() {
        let machine = LifecycleMachine::default();
        let start = at(2025, 1, 1);

        assert_eq!(machine.next_transition(Tier::Trial, start, at(2025, 1, 14)), None);
        assert_eq!(
            machine.next_transition(Tier::Trial, start, at(2025, 1, 15)),
            Some((Tier::ExpiredTrial, AuditAction::TrialExpired))
        );
        assert_eq!(machine.next_transition(Tier::ExpiredTrial, start, at(2025, 2, 13)), None);
        assert_eq!(
            machine.next_transition(Tier::ExpiredTrial, start, at(2025, 2, 14)),
            Some((Tier::Inactive, AuditAction::TrialInactive))
        );
        assert_eq!(machine.next_transition(Tier::Enterprise, start, at(2030, 1, 1)), None);
    }
}
