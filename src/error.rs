//! Error types for Keyize

use crate::property::PropertyKind;
use thiserror::Error;

/// Why a property name was rejected by the codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("unknown kind code '{0}'")]
    UnknownKind(String),

    #[error("missing '.' after kind code")]
    MissingSeparator,

    #[error("{kind} takes {expected} key(s)")]
    ArityMismatch { kind: PropertyKind, expected: usize },

    #[error("key segment '{0}' is not exactly one character")]
    MalformedKey(String),
}

/// Why a V1 recording token was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("unknown event kind '{0}'")]
    UnknownEventKind(char),

    #[error("token ends before its subject")]
    MissingSubject,

    #[error("token has no timestamp")]
    MissingTimestamp,
}

/// Errors that can occur while building or importing keystroke data
#[derive(Debug, Error)]
pub enum KeyizeError {
    #[error("Invalid property name '{name}': {reason}")]
    InvalidPropertyName { name: String, reason: NameError },

    #[error("Invalid recording token at offset {offset}: {reason}")]
    InvalidToken { offset: usize, reason: TokenError },

    #[error("Invalid timestamp '{value}' at offset {offset}")]
    InvalidTimestamp { offset: usize, value: String },

    #[error("Timestamp out of order at event {index}: {current} after {previous}")]
    TimestampOutOfOrder {
        index: usize,
        previous: u64,
        current: u64,
    },

    #[error("Invalid scale {scale} for {kind}: must be positive and finite")]
    InvalidScale { kind: PropertyKind, scale: f64 },

    #[error("Invalid match calibration: same ({same}) must be below other ({other})")]
    InvalidCalibration { same: f64, other: f64 },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl KeyizeError {
    pub(crate) fn name(name: &str, reason: NameError) -> Self {
        KeyizeError::InvalidPropertyName {
            name: name.to_string(),
            reason,
        }
    }
}
