use std::collections::HashMap;

use reconcile_core::{CoreError, CoreResult, EngineConfig, Tier, TierCaps};

/// Capability caps keyed by base tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierCatalog {
    caps: HashMap<String, TierCaps>,
}

impl TierCatalog {
    /// Catalog from raw `catalog_key -> caps` pairs.
    #[must_use]
    pub fn new(caps: HashMap<String, TierCaps>) -> Self {
        Self { caps }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.tiers.clone())
    }

    /// Adds or replaces the caps for a base tier.
    #[must_use]
    pub fn with_caps(mut self, tier: Tier, caps: TierCaps) -> Self {
        self.caps.insert(tier.base_tier().catalog_key().to_string(), caps);
        self
    }

    /// Drops the caps for a base tier.
    #[must_use]
    pub fn without(mut self, tier: Tier) -> Self {
        self.caps.remove(tier.base_tier().catalog_key());
        self
    }

    /// Caps for `tier`, resolved through its base tier.
    ///
    /// # Errors
    ///
    /// [`CoreError::MissingTierCaps`] when the base tier has no entry. This is
    /// never papered over with zero or unlimited caps.
    pub fn caps_for(&self, tier: Tier) -> CoreResult<TierCaps> {
        let base = tier.base_tier();
        self.caps
            .get(base.catalog_key())
            .copied()
            .ok_or_else(|| CoreError::missing_tier_caps(base.as_str()))
    }

    /// Base tiers without an entry.
    #[must_use]
    pub fn missing_tiers(&self) -> Vec<Tier> {
        Tier::BASE_TIERS
            .into_iter()
            .filter(|tier| !self.caps.contains_key(tier.catalog_key()))
            .collect()
    }
}

impl Default for TierCatalog {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_states_use_trial_caps() {
        let catalog = TierCatalog::default();
        let trial = catalog.caps_for(Tier::Trial).unwrap();
        assert_eq!(catalog.caps_for(Tier::ExpiredTrial).unwrap(), trial);
        assert_eq!(catalog.caps_for(Tier::Inactive).unwrap(), trial);
    }

    #[test]
    fn solo_allows_three_swaps() {
        let catalog = TierCatalog::default();
        assert_eq!(catalog.caps_for(Tier::Solo).unwrap().swaps_per_quarter, 3);
    }

    #[test]
    fn missing_entry_is_a_distinct_error() {
        let catalog = TierCatalog::default().without(Tier::MidSized);
        let err = catalog.caps_for(Tier::MidSized).unwrap_err();
        assert!(matches!(err, CoreError::MissingTierCaps { ref tier } if tier == "Mid-Sized"));
        assert_eq!(catalog.missing_tiers(), vec![Tier::MidSized]);
    }

    #[test]
    fn removing_trial_breaks_ended_trials_too() {
        let catalog = TierCatalog::default().without(Tier::Inactive);
        assert!(catalog.caps_for(Tier::Trial).is_err());
        assert!(catalog.caps_for(Tier::ExpiredTrial).is_err());
    }

    #[test]
    fn zero_caps_are_distinct_from_missing_caps() {
        let catalog = TierCatalog::default().with_caps(Tier::Basic, TierCaps::new(0, 0, false));
        assert_eq!(catalog.caps_for(Tier::Basic).unwrap().provider_slots, 0);
    }
}
