//! External services for the case aggregate.
//!
//! Services provide external dependencies (time, firm policy) to the aggregate
//! without coupling it to specific implementations.

use crate::domain::types::TimestampUtc;
use serde::{Deserialize, Serialize};

/// Services injected into the case aggregate for command handling.
#[derive(Debug, Clone, Default)]
pub struct CaseServices {
    pub clock: CaseClock,
    pub policy: WorkflowPolicy,
}

impl CaseServices {
    pub fn with_policy(policy: WorkflowPolicy) -> Self {
        Self {
            clock: CaseClock::default(),
            policy,
        }
    }
}

/// Clock service for timestamp generation.
#[derive(Debug, Clone, Default)]
pub enum CaseClock {
    #[default]
    System,
    /// Always reports the same instant.
    Fixed(TimestampUtc),
}

impl CaseClock {
    /// Returns the current UTC timestamp.
    pub fn now(&self) -> TimestampUtc {
        match self {
            Self::System => TimestampUtc::now(),
            Self::Fixed(at) => *at,
        }
    }
}

/// Firm-level knobs for the session workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowPolicy {
    /// Whether the secretary may delete a completed or cancelled session.
    #[serde(default = "default_allow_terminal_session_deletion")]
    pub allow_terminal_session_deletion: bool,
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        Self {
            allow_terminal_session_deletion: default_allow_terminal_session_deletion(),
        }
    }
}

fn default_allow_terminal_session_deletion() -> bool {
    true
}
