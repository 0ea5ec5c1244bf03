use chrono::{DateTime, Utc};

use crate::audit::AuditAction;
use crate::error::CoreResult;
use crate::ids::TenantId;
use crate::subscription::SubscriptionRecord;

/// Source of wall-clock time, injectable for tests.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Sink that records lifecycle transitions and data warnings.
///
/// Implementations must not fail the caller; a sink that cannot record an
/// event is expected to report that through its own channel.
pub trait AuditSink: Send + Sync {
    /// Records a lifecycle action against `subject_id`.
    fn log(&self, action: AuditAction, subject_id: TenantId, actor_role: &str);

    /// Records a non-blocking warning about `subject_id`.
    fn warn(&self, subject_id: TenantId, message: &str);
}

/// Persistence collaborator for subscription records.
///
/// Writes are treated as atomic by the engine; retry and transaction
/// semantics belong to the implementation.
pub trait SubscriptionStore: Send + Sync {
    /// Fetches the record for a tenant.
    fn get(&self, tenant_id: TenantId) -> CoreResult<Option<SubscriptionRecord>>;

    /// Inserts or replaces the record for `record.tenant_id`.
    fn put(&self, record: &SubscriptionRecord) -> CoreResult<()>;
}
