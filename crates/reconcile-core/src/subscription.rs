//! Tenant subscription state and its persisted record shape.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::TenantId;
use crate::tier::Tier;

/// When the tenant's trial began, as far as the stored data can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialStart {
    /// Trial has not started yet.
    Unset,
    /// Trial started at the given instant.
    Started(DateTime<Utc>),
    /// Stored value could not be parsed; kept verbatim so it round-trips.
    Malformed {
        /// Record field the value came from.
        field: &'static str,
        raw: String,
    },
}

/// Record field holding the trial start.
pub const TRIAL_START_FIELD: &str = "trialStartDate";
/// Legacy record field holding the trial end.
pub const TRIAL_END_FIELD: &str = "trialEndDate";

impl TrialStart {
    /// Returns the start instant when it is known.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Started(at) => Some(*at),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }

    /// Writes the start into the record fields it belongs to.
    ///
    /// Started trials become RFC 3339; malformed text goes back to the field
    /// it was read from.
    fn write_into(&self, record: &mut SubscriptionRecord) {
        match self {
            Self::Unset => {}
            Self::Started(at) => {
                record.trial_start_date = Some(at.to_rfc3339_opts(SecondsFormat::Millis, true));
            }
            Self::Malformed { field, raw } if *field == TRIAL_END_FIELD => {
                record.trial_end_date = Some(raw.clone());
            }
            Self::Malformed { raw, .. } => {
                record.trial_start_date = Some(raw.clone());
            }
        }
    }
}

impl Default for TrialStart {
    fn default() -> Self {
        Self::Unset
    }
}

/// In-memory subscription state for one tenant.
///
/// Exactly one session owns a given state at a time; every engine operation
/// takes it by reference rather than reaching for shared context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionState {
    pub tenant_id: TenantId,
    pub tier: Tier,
    pub trial_start: TrialStart,
    /// Swaps consumed in the current quarter.
    pub swaps_used: u32,
    /// Purchased provider-slot blocks. Never reset.
    pub extra_provider_blocks: u32,
    /// Legacy end-date text carried unread while the start date is malformed.
    pub legacy_trial_end: Option<String>,
}

impl SubscriptionState {
    /// State of a freshly provisioned tenant: `Trial`, not yet started.
    #[must_use]
    pub fn provisioned(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            tier: Tier::Trial,
            trial_start: TrialStart::Unset,
            swaps_used: 0,
            extra_provider_blocks: 0,
            legacy_trial_end: None,
        }
    }

    /// Converts the state back into its persisted shape.
    ///
    /// A parsed legacy end date is not written back; the coerced start date
    /// replaces it. While the start date is malformed the legacy text is kept.
    #[must_use]
    pub fn to_record(&self) -> SubscriptionRecord {
        let trial_end_date = if self.trial_start.is_malformed() {
            self.legacy_trial_end.clone()
        } else {
            None
        };
        let mut record = SubscriptionRecord {
            tenant_id: self.tenant_id,
            tier: self.tier,
            trial_start_date: None,
            trial_end_date,
            swaps_used: self.swaps_used,
            extra_provider_blocks: self.extra_provider_blocks,
        };
        self.trial_start.write_into(&mut record);
        record
    }
}

/// Row shape exchanged with the host data platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub tenant_id: TenantId,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trial_start_date: Option<String>,
    /// Legacy field written by older clients; read once for migration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trial_end_date: Option<String>,
    #[serde(default)]
    pub swaps_used: u32,
    #[serde(default)]
    pub extra_provider_blocks: u32,
}

impl SubscriptionRecord {
    /// Record of a freshly provisioned tenant.
    #[must_use]
    pub fn provisioned(tenant_id: TenantId) -> Self {
        SubscriptionState::provisioned(tenant_id).to_record()
    }
}
