//! Case events for the CQRS aggregate.
//!
//! Events represent facts that have happened. They are the single source of truth
//! for case and session state and are persisted to the event log. Every decision
//! the aggregate made (who the session was unlocked for, which number a session
//! received) is recorded in the event so replay never re-derives it.

use crate::domain::access::CaseRoles;
use crate::domain::lifecycle::{CompletionRequest, MemorandumUpload, ReviewRequest, SessionUpdate};
use crate::domain::session::{DirectorApproval, SessionDetails};
use crate::domain::types::{CaseId, CaseNumber, SessionId, SessionNumber, TimestampUtc, UserId};
use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

/// Events emitted by the case aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseEvent {
    CaseOpened {
        case_id: CaseId,
        case_number: CaseNumber,
        client: String,
        case_type: String,
        roles: CaseRoles,
        opened_at: TimestampUtc,
    },

    CaseArchived {
        archived_by: UserId,
        archived_at: TimestampUtc,
    },

    SessionCreated {
        session_id: SessionId,
        session_number: SessionNumber,
        details: SessionDetails,
        created_by: UserId,
        created_at: TimestampUtc,
    },

    SessionUpdated {
        session_id: SessionId,
        update: SessionUpdate,
        updated_at: TimestampUtc,
    },

    SessionDeleted {
        session_id: SessionId,
        deleted_by: UserId,
        deleted_at: TimestampUtc,
    },

    /// Approving lawyer set the requirements. `unlocked_for` is the assigned
    /// lawyer at review time.
    SessionReviewed {
        session_id: SessionId,
        review: ReviewRequest,
        reviewed_by: UserId,
        unlocked_for: Option<UserId>,
        reviewed_at: TimestampUtc,
    },

    MemorandumSubmitted {
        session_id: SessionId,
        upload: MemorandumUpload,
        prepared_by: UserId,
        prepared_at: TimestampUtc,
    },

    MemorandumApproved {
        session_id: SessionId,
        reviewed_by: UserId,
        feedback: Option<String>,
        reviewed_at: TimestampUtc,
    },

    MemorandumRejected {
        session_id: SessionId,
        reviewed_by: UserId,
        feedback: Option<String>,
        reviewed_at: TimestampUtc,
    },

    /// Director signed off. `unlocked_for` is `None` when the case had no
    /// assigned lawyer, in which case the lock is left untouched.
    SessionApprovedForSubmission {
        session_id: SessionId,
        approval: DirectorApproval,
        unlocked_for: Option<UserId>,
    },

    /// Completed or cancelled by the assigned lawyer.
    SessionClosed {
        session_id: SessionId,
        completion: CompletionRequest,
        closed_by: UserId,
        closed_at: TimestampUtc,
    },
}

impl CaseEvent {
    /// The session this event touches, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            Self::CaseOpened { .. } | Self::CaseArchived { .. } => None,
            Self::SessionCreated { session_id, .. }
            | Self::SessionUpdated { session_id, .. }
            | Self::SessionDeleted { session_id, .. }
            | Self::SessionReviewed { session_id, .. }
            | Self::MemorandumSubmitted { session_id, .. }
            | Self::MemorandumApproved { session_id, .. }
            | Self::MemorandumRejected { session_id, .. }
            | Self::SessionApprovedForSubmission { session_id, .. }
            | Self::SessionClosed { session_id, .. } => Some(*session_id),
        }
    }
}

impl DomainEvent for CaseEvent {
    fn event_type(&self) -> String {
        match self {
            Self::CaseOpened { .. } => "CaseOpened".to_string(),
            Self::CaseArchived { .. } => "CaseArchived".to_string(),
            Self::SessionCreated { .. } => "SessionCreated".to_string(),
            Self::SessionUpdated { .. } => "SessionUpdated".to_string(),
            Self::SessionDeleted { .. } => "SessionDeleted".to_string(),
            Self::SessionReviewed { .. } => "SessionReviewed".to_string(),
            Self::MemorandumSubmitted { .. } => "MemorandumSubmitted".to_string(),
            Self::MemorandumApproved { .. } => "MemorandumApproved".to_string(),
            Self::MemorandumRejected { .. } => "MemorandumRejected".to_string(),
            Self::SessionApprovedForSubmission { .. } => "SessionApprovedForSubmission".to_string(),
            Self::SessionClosed { .. } => "SessionClosed".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1".to_string()
    }
}
