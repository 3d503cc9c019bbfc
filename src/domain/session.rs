//! Court session entity model.
//!
//! A [`Session`] lives inside its case's ordered session list and carries the
//! memorandum and director-approval sub-records. All mutation goes through
//! [`crate::domain::lifecycle`]; this module only describes shape and the
//! derived predicates that the worklists and the engine share.

use crate::domain::types::{DocumentUrl, SessionId, SessionNumber, TimestampUtc, UserId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Normalizes user input such as `in-progress` to `IN_PROGRESS`.
fn normalize(s: &str) -> String {
    s.trim().to_ascii_uppercase().replace('-', "_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Upcoming,
    InProgress,
    PendingSignature,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "UPCOMING",
            Self::InProgress => "IN_PROGRESS",
            Self::PendingSignature => "PENDING_SIGNATURE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "UPCOMING" => Ok(Self::Upcoming),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "PENDING_SIGNATURE" => Ok(Self::PendingSignature),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("unknown session status '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemorandumStatus {
    #[default]
    Pending,
    Submitted,
    Approved,
    Rejected,
}

impl MemorandumStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Submitted => "SUBMITTED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl FromStr for MemorandumStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "PENDING" => Ok(Self::Pending),
            "SUBMITTED" => Ok(Self::Submitted),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(format!("unknown memorandum status '{}'", s)),
        }
    }
}

/// How a session ended in court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionOutcome {
    Finalized,
    Adjourned,
    Postponed,
    Dismissed,
}

impl FromStr for SessionOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "FINALIZED" => Ok(Self::Finalized),
            "ADJOURNED" => Ok(Self::Adjourned),
            "POSTPONED" => Ok(Self::Postponed),
            "DISMISSED" => Ok(Self::Dismissed),
            _ => Err(format!("unknown session outcome '{}'", s)),
        }
    }
}

/// Draft memorandum prepared by the assigned lawyer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Memorandum {
    pub content: Option<String>,
    pub file_url: Option<DocumentUrl>,
    pub prepared_by: Option<UserId>,
    pub prepared_at: Option<TimestampUtc>,
    pub status: MemorandumStatus,
    pub feedback: Option<String>,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<TimestampUtc>,
}

/// Director sign-off. Present only once a director approved the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorApproval {
    pub approved_by: UserId,
    pub approved_at: TimestampUtc,
    #[serde(default)]
    pub signature_url: Option<DocumentUrl>,
    #[serde(default)]
    pub additional_documents: Vec<DocumentUrl>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Scheduling details maintained by the secretary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionDetails {
    pub scheduled_for: Option<TimestampUtc>,
    pub court: Option<String>,
    pub description: Option<String>,
}

/// A court session nested in a case.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub session_number: SessionNumber,
    #[serde(flatten)]
    pub details: SessionDetails,
    pub status: SessionStatus,

    pub memorandum_required: bool,
    pub supporting_documents_required: bool,
    pub memorandum: Memorandum,
    pub director_approval: Option<DirectorApproval>,
    pub is_ready_for_submission: bool,

    pub is_locked: bool,
    pub unlocked_for: Option<UserId>,

    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<TimestampUtc>,
    pub review_notes: Option<String>,
    pub pending_signature_at: Option<TimestampUtc>,

    pub outcome: Option<SessionOutcome>,
    pub reason_for_adjournment: Option<String>,
    pub next_session_date: Option<TimestampUtc>,
    pub completed_by: Option<UserId>,
    pub completed_at: Option<TimestampUtc>,

    pub created_by: Option<UserId>,
    pub created_at: Option<TimestampUtc>,
    pub updated_at: Option<TimestampUtc>,
}

impl Session {
    /// Returns true while `user` holds the exclusive edit right.
    ///
    /// A stale `unlocked_for` on a locked session grants nothing.
    pub fn is_open_to(&self, user: &UserId) -> bool {
        !self.is_locked && self.unlocked_for.as_ref() == Some(user)
    }

    /// Awaiting director attention: memorandum submitted or approved (or the
    /// session is waiting for signature) and no sign-off recorded yet.
    pub fn awaits_director(&self) -> bool {
        let memo_in_flight = matches!(
            self.memorandum.status,
            MemorandumStatus::Submitted | MemorandumStatus::Approved
        );
        (memo_in_flight || self.status == SessionStatus::PendingSignature)
            && !self.is_ready_for_submission
            && !self.status.is_terminal()
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
