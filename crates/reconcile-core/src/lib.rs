//! Core domain types and collaborator traits for the Reconcile C.A.R.E.
//! subscription entitlement engine.

pub mod audit;
pub mod config;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod role;
pub mod subscription;
pub mod tier;
pub mod traits;

pub use audit::{AuditAction, AuditLogEntry, AuditSeverity};
pub use config::{EngineConfig, ExportConfig, QuotaConfig, TierCaps, TrialConfig};
pub use error::{CoreError, CoreResult};
pub use ids::{AuditLogId, TenantId};
pub use role::Role;
pub use subscription::{
    SubscriptionRecord, SubscriptionState, TrialStart, TRIAL_END_FIELD, TRIAL_START_FIELD,
};
pub use tier::Tier;
pub use traits::{AuditSink, Clock, SubscriptionStore};
