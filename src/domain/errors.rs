//! Error types for the case domain.

use std::fmt::{Display, Formatter};

/// Errors that can occur while handling case and session commands.
///
/// Every variant is detected before any state is mutated; callers surface
/// them unchanged and never retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseError {
    /// The case or the session inside it does not exist.
    NotFound { message: String },
    /// The caller does not hold the role required for the action.
    Forbidden { message: String },
    /// A new session was requested while another one is still open.
    SequenceViolation { message: String },
    /// The session is closed to draft-lawyer edits.
    SessionLocked { message: String },
    /// The session or memorandum is in the wrong state for the action.
    InvalidState { message: String },
    /// The request payload is malformed.
    Validation { message: String },
    /// Storage/persistence failure.
    StorageFailure { message: String },
    /// Optimistic lock failure (concurrent modification detected).
    ConcurrencyConflict { message: String },
}

impl CaseError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::SequenceViolation { .. } => "SEQUENCE_VIOLATION",
            Self::SessionLocked { .. } => "SESSION_LOCKED",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::Validation { .. } => "VALIDATION",
            Self::StorageFailure { .. } => "STORAGE_FAILURE",
            Self::ConcurrencyConflict { .. } => "CONCURRENCY_CONFLICT",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message }
            | Self::Forbidden { message }
            | Self::SequenceViolation { message }
            | Self::SessionLocked { message }
            | Self::InvalidState { message }
            | Self::Validation { message }
            | Self::StorageFailure { message }
            | Self::ConcurrencyConflict { message } => message,
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl Display for CaseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { message } => write!(f, "not found: {}", message),
            Self::Forbidden { message } => write!(f, "forbidden: {}", message),
            Self::SequenceViolation { message } => write!(f, "sequence violation: {}", message),
            Self::SessionLocked { message } => write!(f, "session locked: {}", message),
            Self::InvalidState { message } => write!(f, "invalid state: {}", message),
            Self::Validation { message } => write!(f, "validation failed: {}", message),
            Self::StorageFailure { message } => write!(f, "storage failure: {}", message),
            Self::ConcurrencyConflict { message } => write!(f, "concurrency conflict: {}", message),
        }
    }
}

impl std::error::Error for CaseError {}
