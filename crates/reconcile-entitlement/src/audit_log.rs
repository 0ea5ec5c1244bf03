//! Audit sinks shipped with the engine.

use std::sync::Arc;

use parking_lot::Mutex;
use reconcile_core::{AuditAction, AuditLogEntry, AuditSink, Clock, TenantId};

use crate::clock::SystemClock;

/// Emits audit events as structured `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn log(&self, action: AuditAction, subject_id: TenantId, actor_role: &str) {
        tracing::info!(
            target: "reconcile::audit",
            action = action.as_str(),
            subject_id = %subject_id,
            actor_role,
            "Audit event"
        );
    }

    fn warn(&self, subject_id: TenantId, message: &str) {
        tracing::warn!(
            target: "reconcile::audit",
            subject_id = %subject_id,
            message,
            "Audit warning"
        );
    }
}

/// Keeps audit entries in memory, oldest first.
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditLogEntry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Stamps entries with `clock` instead of the wall clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            clock,
        }
    }

    #[must_use]
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.lock().clone()
    }

    /// Action codes in recording order, warnings skipped.
    #[must_use]
    pub fn action_codes(&self) -> Vec<&'static str> {
        self.entries
            .lock()
            .iter()
            .filter_map(AuditLogEntry::action_code)
            .collect()
    }

    /// Warning messages in recording order.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|entry| entry.message.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for InMemoryAuditLog {
    fn log(&self, action: AuditAction, subject_id: TenantId, actor_role: &str) {
        let entry = AuditLogEntry::transition(subject_id, action, actor_role, self.clock.now());
        self.entries.lock().push(entry);
    }

    fn warn(&self, subject_id: TenantId, message: &str) {
        let entry = AuditLogEntry::warning(subject_id, message, self.clock.now());
        self.entries.lock().push(entry);
    }
}
