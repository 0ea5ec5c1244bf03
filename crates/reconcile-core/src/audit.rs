//! Audit log domain model for subscription lifecycle events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::{AuditLogId, TenantId};

/// Action codes emitted by the lifecycle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// `Trial -> Expired (Trial)`.
    TrialExpired,
    /// `Expired (Trial) -> Inactive`.
    TrialInactive,
}

impl AuditAction {
    /// Wire action code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            AuditAction::TrialExpired => "TRIAL_EXPIRED",
            AuditAction::TrialInactive => "TRIAL_INACTIVE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRIAL_EXPIRED" => Ok(AuditAction::TrialExpired),
            "TRIAL_INACTIVE" => Ok(AuditAction::TrialInactive),
            _ => Err(format!("invalid audit action: {s}")),
        }
    }
}

/// Severity of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
}

/// One recorded audit event.
///
/// Lifecycle transitions carry an `action`; data-quality warnings carry only
/// a `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub audit_log_id: AuditLogId,
    pub subject_id: TenantId,
    pub action: Option<AuditAction>,
    pub actor_role: String,
    pub severity: AuditSeverity,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Entry for a lifecycle transition.
    #[must_use]
    pub fn transition(
        subject_id: TenantId,
        action: AuditAction,
        actor_role: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            audit_log_id: AuditLogId::new(),
            subject_id,
            action: Some(action),
            actor_role: actor_role.into(),
            severity: AuditSeverity::Info,
            message: None,
            created_at,
        }
    }

    /// Entry for a non-blocking data warning.
    #[must_use]
    pub fn warning(
        subject_id: TenantId,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            audit_log_id: AuditLogId::new(),
            subject_id,
            action: None,
            actor_role: crate::Role::System.as_str().to_string(),
            severity: AuditSeverity::Warning,
            message: Some(message.into()),
            created_at,
        }
    }

    /// Action code, or `None` for warnings.
    #[must_use]
    pub fn action_code(&self) -> Option<&'static str> {
        self.action.map(|action| action.as_str())
    }
}
