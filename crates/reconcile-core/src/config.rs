//! Configuration management for the entitlement engine
//!
//! Sources, lowest precedence first:
//! - Hardcoded defaults
//! - `/etc/reconcile/reconcile.{yaml,toml,json}`
//! - `./config/reconcile.{yaml,toml,json}`
//! - File named by `RECONCILE_CONFIG`
//! - `RECONCILE_*` environment variables (`__` separates sections)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::role::Role;
use crate::tier::Tier;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub trial: TrialConfig,

    #[serde(default)]
    pub quota: QuotaConfig,

    #[serde(default)]
    pub export: ExportConfig,

    /// Capability caps keyed by [`Tier::catalog_key`].
    #[serde(default = "default_tier_caps")]
    pub tiers: HashMap<String, TierCaps>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trial: TrialConfig::default(),
            quota: QuotaConfig::default(),
            export: ExportConfig::default(),
            tiers: default_tier_caps(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from every source, environment variables last.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::set_defaults(Config::builder())?;

        builder = builder
            .add_source(File::with_name("/etc/reconcile/reconcile").required(false))
            .add_source(File::with_name("./config/reconcile").required(false));

        if let Ok(config_path) = std::env::var("RECONCILE_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(false));
        }

        // Example: RECONCILE_TRIAL__DURATION_DAYS=30
        builder = builder.add_source(
            Environment::with_prefix("RECONCILE")
                .separator("__")
                .try_parsing(true),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file, on top of the defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: EngineConfig = Self::set_defaults(Config::builder())?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let mut builder = builder
            .set_default("trial.duration_days", i64::from(TrialConfig::DEFAULT_DURATION_DAYS))?
            .set_default("trial.grace_days", i64::from(TrialConfig::DEFAULT_GRACE_DAYS))?
            .set_default(
                "quota.provider_block_size",
                i64::from(QuotaConfig::DEFAULT_BLOCK_SIZE),
            )?
            .set_default(
                "export.allowed_roles",
                ExportConfig::default()
                    .allowed_roles
                    .iter()
                    .map(|role| role.as_str())
                    .collect::<Vec<_>>(),
            )?;

        for (key, caps) in default_tier_caps() {
            builder = builder
                .set_default(
                    format!("tiers.{key}.provider_slots"),
                    i64::from(caps.provider_slots),
                )?
                .set_default(
                    format!("tiers.{key}.swaps_per_quarter"),
                    i64::from(caps.swaps_per_quarter),
                )?
                .set_default(format!("tiers.{key}.router_enabled"), caps.router_enabled)?;
        }

        Ok(builder)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trial.duration_days == 0 {
            return Err(ConfigError::Message(
                "trial.duration_days must be > 0".to_string(),
            ));
        }

        if self.quota.provider_block_size == 0 {
            return Err(ConfigError::Message(
                "quota.provider_block_size must be > 0".to_string(),
            ));
        }

        // Gaps are tolerated here; resolution denies quota-gated actions for them.
        for tier in Tier::BASE_TIERS {
            if !self.tiers.contains_key(tier.catalog_key()) {
                tracing::warn!(tier = %tier, "No capability caps configured for tier");
            }
        }

        Ok(())
    }
}

/// Trial timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrialConfig {
    /// Length of a trial in days (process-wide, not per tenant)
    pub duration_days: u32,

    /// Days after trial end before an expired trial goes inactive
    pub grace_days: u32,
}

impl TrialConfig {
    pub const DEFAULT_DURATION_DAYS: u32 = 14;
    pub const DEFAULT_GRACE_DAYS: u32 = 30;
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            duration_days: Self::DEFAULT_DURATION_DAYS,
            grace_days: Self::DEFAULT_GRACE_DAYS,
        }
    }
}

/// Quota add-ons
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuotaConfig {
    /// Provider slots granted by each purchased block
    pub provider_block_size: u32,
}

impl QuotaConfig {
    pub const DEFAULT_BLOCK_SIZE: u32 = 10;
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            provider_block_size: Self::DEFAULT_BLOCK_SIZE,
        }
    }
}

/// Role allow-list for case exports. Independent of the subscription tier.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    pub allowed_roles: Vec<Role>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            allowed_roles: vec![Role::Attorney, Role::RnCaseManager, Role::SuperAdmin],
        }
    }
}

/// Capability caps for one base tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TierCaps {
    /// Provider slots included in the plan
    pub provider_slots: u32,

    /// Provider swaps allowed per calendar quarter
    pub swaps_per_quarter: u32,

    /// Whether the referral router is available
    pub router_enabled: bool,
}

impl TierCaps {
    #[must_use]
    pub const fn new(provider_slots: u32, swaps_per_quarter: u32, router_enabled: bool) -> Self {
        Self {
            provider_slots,
            swaps_per_quarter,
            router_enabled,
        }
    }
}

/// Built-in tier catalog.
///
/// | Tier       | Slots | Swaps/quarter | Router |
/// |------------|-------|---------------|--------|
/// | Trial      | 10    | 1             | no     |
/// | Basic      | 10    | 1             | no     |
/// | Solo       | 25    | 3             | yes    |
/// | Mid-Sized  | 50    | 6             | yes    |
/// | Enterprise | 150   | 12            | yes    |
#[must_use]
pub fn default_tier_caps() -> HashMap<String, TierCaps> {
    [
        (Tier::Trial, TierCaps::new(10, 1, false)),
        (Tier::Basic, TierCaps::new(10, 1, false)),
        (Tier::Solo, TierCaps::new(25, 3, true)),
        (Tier::MidSized, TierCaps::new(50, 6, true)),
        (Tier::Enterprise, TierCaps::new(150, 12, true)),
    ]
    .into_iter()
    .map(|(tier, caps)| (tier.catalog_key().to_string(), caps))
    .collect()
}
