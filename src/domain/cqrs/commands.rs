//! Case commands for the CQRS aggregate.
//!
//! Commands represent intent to change state. Every command carries the
//! verified caller; the aggregate authorizes it against the case's roles
//! before consulting the lifecycle engine.

use crate::domain::access::Actor;
use crate::domain::lifecycle::{
    ApprovalRequest, CompletionRequest, MemorandumDecision, MemorandumUpload, ReviewRequest,
    SessionUpdate,
};
use crate::domain::session::SessionDetails;
use crate::domain::types::{CaseId, CaseNumber, SessionId, UserId};
use serde::{Deserialize, Serialize};

/// Commands that can be executed against the case aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseCommand {
    /// Opens a new case; the caller becomes its secretary.
    OpenCase {
        actor: Actor,
        case_id: CaseId,
        case_number: CaseNumber,
        client: String,
        case_type: String,
        assigned_lawyer: Option<UserId>,
        approving_lawyer: Option<UserId>,
    },

    ArchiveCase {
        actor: Actor,
    },

    /// Schedules the next session. `session_id` is chosen by the caller so it
    /// can find the session afterwards.
    CreateSession {
        actor: Actor,
        session_id: SessionId,
        details: SessionDetails,
    },

    UpdateSession {
        actor: Actor,
        session_id: SessionId,
        update: SessionUpdate,
    },

    DeleteSession {
        actor: Actor,
        session_id: SessionId,
    },

    ReviewSession {
        actor: Actor,
        session_id: SessionId,
        review: ReviewRequest,
    },

    UploadMemorandum {
        actor: Actor,
        session_id: SessionId,
        upload: MemorandumUpload,
    },

    ReviewMemorandum {
        actor: Actor,
        session_id: SessionId,
        decision: MemorandumDecision,
    },

    ApproveForSubmission {
        actor: Actor,
        session_id: SessionId,
        approval: ApprovalRequest,
    },

    CompleteSession {
        actor: Actor,
        session_id: SessionId,
        completion: CompletionRequest,
    },
}

impl CaseCommand {
    pub fn actor(&self) -> &Actor {
        match self {
            Self::OpenCase { actor, .. }
            | Self::ArchiveCase { actor }
            | Self::CreateSession { actor, .. }
            | Self::UpdateSession { actor, .. }
            | Self::DeleteSession { actor, .. }
            | Self::ReviewSession { actor, .. }
            | Self::UploadMemorandum { actor, .. }
            | Self::ReviewMemorandum { actor, .. }
            | Self::ApproveForSubmission { actor, .. }
            | Self::CompleteSession { actor, .. } => actor,
        }
    }

    /// Short name used in log lines and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenCase { .. } => "OpenCase",
            Self::ArchiveCase { .. } => "ArchiveCase",
            Self::CreateSession { .. } => "CreateSession",
            Self::UpdateSession { .. } => "UpdateSession",
            Self::DeleteSession { .. } => "DeleteSession",
            Self::ReviewSession { .. } => "ReviewSession",
            Self::UploadMemorandum { .. } => "UploadMemorandum",
            Self::ReviewMemorandum { .. } => "ReviewMemorandum",
            Self::ApproveForSubmission { .. } => "ApproveForSubmission",
            Self::CompleteSession { .. } => "CompleteSession",
        }
    }
}
