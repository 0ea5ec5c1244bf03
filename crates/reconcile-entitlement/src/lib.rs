//! Trial lifecycle and quota entitlement engine for Reconcile C.A.R.E.
//!
//! - [`trial`]: trial activity, remaining days, legacy end-date coercion
//! - [`catalog`]: per-tier capability caps
//! - [`resolver`]: state + role + time → [`ResolvedEntitlement`]
//! - [`lifecycle`]: `Trial → Expired (Trial) → Inactive`
//! - [`quarter`]: quarterly swap-reset boundaries
//! - [`engine`]: the facade hosts call, with injected clock, audit sink and store

pub mod audit_log;
pub mod catalog;
pub mod clock;
pub mod engine;
pub mod lifecycle;
pub mod quarter;
pub mod resolver;
pub mod store;
pub mod trial;

pub use audit_log::{InMemoryAuditLog, TracingAuditSink};
pub use catalog::TierCatalog;
pub use clock::{FixedClock, SystemClock};
pub use engine::EntitlementEngine;
pub use lifecycle::{LifecycleMachine, LifecycleTransition};
pub use quarter::{days_until_quarter_reset, next_quarter_reset};
pub use resolver::{EntitlementResolver, ResolvedEntitlement};
pub use store::InMemorySubscriptionStore;
pub use trial::{parse_timestamp, TrialClock};
