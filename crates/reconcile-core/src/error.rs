use thiserror::Error;

/// Canonical error type for subscription and entitlement operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity was not found in the subscription store.
    #[error("{entity} `{id}` was not found")]
    NotFound {
        /// Entity type name (e.g. `"subscription"`).
        entity: &'static str,
        /// Identifier of the missing entity.
        id: String,
    },

    /// The resolved base tier has no entry in the tier catalog.
    ///
    /// Callers must deny every quota-gated action when they see this.
    #[error("no capability caps configured for tier `{tier}`")]
    MissingTierCaps {
        /// Base tier name that was looked up.
        tier: String,
    },

    /// A persisted timestamp could not be parsed.
    #[error("malformed timestamp in `{field}`: `{value}`")]
    MalformedTimestamp {
        /// Record field holding the timestamp.
        field: &'static str,
        /// Raw value as stored.
        value: String,
    },

    /// Resource quotas prohibit the attempted operation.
    #[error("quota exceeded: {message}")]
    QuotaExceeded {
        /// Human-readable quota violation message.
        message: String,
    },

    /// Operation violates current state machine rules.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Human-readable explanation of the invalid state.
        message: String,
    },

    /// Validation error for input data.
    #[error("validation error: {0}")]
    ValidationError(String),
}

impl CoreError {
    /// Creates a `NotFound` variant.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a `MissingTierCaps` variant.
    #[must_use]
    pub fn missing_tier_caps(tier: impl Into<String>) -> Self {
        Self::MissingTierCaps { tier: tier.into() }
    }

    /// Creates a `MalformedTimestamp` variant.
    #[must_use]
    pub fn malformed_timestamp(field: &'static str, value: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            field,
            value: value.into(),
        }
    }

    /// Creates a `QuotaExceeded` variant.
    #[must_use]
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::QuotaExceeded {
            message: message.into(),
        }
    }

    /// Creates an `InvalidState` variant.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}

/// Convenient result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
