//! Error types
//!
//! Almost everything in the loop is a policy no-op rather than an error
//! (triggering a control on cooldown, releasing a key that isn't active,
//! double start/stop). What remains is bad configuration and bad frame time.

use thiserror::Error;

/// Failure to load or validate [`crate::Settings`]
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl SettingsError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// A frame delta that must never reach an updatable
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DeltaError {
    #[error("frame delta is not finite: {0}")]
    NonFinite(f64),

    #[error("frame delta is negative: {0}s")]
    Negative(f64),
}
