//! Subscription tiers and the lifecycle states layered on top of them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Subscription tier recorded for a tenant.
///
/// `ExpiredTrial` and `Inactive` are not purchasable plans; they are lifecycle
/// states derived from an ended `Trial` and borrow the `Trial` caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "Trial")]
    Trial,
    #[serde(rename = "Basic")]
    Basic,
    #[serde(rename = "Solo")]
    Solo,
    #[serde(rename = "Mid-Sized")]
    MidSized,
    #[serde(rename = "Enterprise")]
    Enterprise,
    #[serde(rename = "Expired (Trial)")]
    ExpiredTrial,
    #[serde(rename = "Inactive")]
    Inactive,
}

impl Tier {
    /// Tiers that carry their own catalog entry.
    pub const BASE_TIERS: [Tier; 5] = [
        Tier::Trial,
        Tier::Basic,
        Tier::Solo,
        Tier::MidSized,
        Tier::Enterprise,
    ];

    /// Display name, identical to the persisted form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "Trial",
            Self::Basic => "Basic",
            Self::Solo => "Solo",
            Self::MidSized => "Mid-Sized",
            Self::Enterprise => "Enterprise",
            Self::ExpiredTrial => "Expired (Trial)",
            Self::Inactive => "Inactive",
        }
    }

    /// Key of this tier in the `tiers` configuration table.
    #[must_use]
    pub const fn catalog_key(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Basic => "basic",
            Self::Solo => "solo",
            Self::MidSized => "mid_sized",
            Self::Enterprise => "enterprise",
            Self::ExpiredTrial => "expired_trial",
            Self::Inactive => "inactive",
        }
    }

    /// Tier whose catalog entry supplies the caps for `self`.
    ///
    /// Ended trials keep resolving against the `Trial` entry.
    #[must_use]
    pub const fn base_tier(&self) -> Tier {
        match self {
            Self::ExpiredTrial | Self::Inactive => Self::Trial,
            other => *other,
        }
    }

    /// Returns `true` for the states the trial lifecycle machine drives.
    #[must_use]
    pub const fn is_trial_lifecycle(&self) -> bool {
        matches!(self, Self::Trial | Self::ExpiredTrial)
    }

    /// Returns `true` when the tier is derived from an ended trial.
    #[must_use]
    pub const fn is_trial_ended(&self) -> bool {
        matches!(self, Self::ExpiredTrial | Self::Inactive)
    }

    /// Returns `true` when the tier can be assigned directly by billing.
    #[must_use]
    pub const fn is_base(&self) -> bool {
        !self.is_trial_ended()
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self::Trial
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Trial" => Ok(Self::Trial),
            "Basic" => Ok(Self::Basic),
            "Solo" => Ok(Self::Solo),
            "Mid-Sized" => Ok(Self::MidSized),
            "Enterprise" => Ok(Self::Enterprise),
            "Expired (Trial)" => Ok(Self::ExpiredTrial),
            "Inactive" => Ok(Self::Inactive),
            _ => Err(format!("invalid tier: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ended_trials_fall_back_to_trial_caps() {
        assert_eq!(Tier::ExpiredTrial.base_tier(), Tier::Trial);
        assert_eq!(Tier::Inactive.base_tier(), Tier::Trial);
        for tier in Tier::BASE_TIERS {
            assert_eq!(tier.base_tier(), tier);
        }
    }

    #[test]
    fn persisted_names_match_display() {
        for tier in [
            Tier::Trial,
            Tier::Basic,
            Tier::Solo,
            Tier::MidSized,
            Tier::Enterprise,
            Tier::ExpiredTrial,
            Tier::Inactive,
        ] {
            let json = serde_json::to_string(&tier).unwrap();
            assert_eq!(json, format!("\"{}\"", tier.as_str()));
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
    }

    #[test]
    fn unknown_tier_is_rejected() {
        assert!("Platinum".parse::<Tier>().is_err());
        assert!(serde_json::from_str::<Tier>("\"Platinum\"").is_err());
    }

    #[test]
    fn only_trial_states_are_lifecycle_driven() {
        assert!(Tier::Trial.is_trial_lifecycle());
        assert!(Tier::ExpiredTrial.is_trial_lifecycle());
        assert!(!Tier::Inactive.is_trial_lifecycle());
        assert!(!Tier::Solo.is_trial_lifecycle());
    }
}
