//! Session desk: the operation surface of the docket.
//!
//! Each operation takes a verified caller, sends one command (or read) to the
//! docket actor and returns the affected session(s). Authorization and
//! lifecycle rules live in the aggregate; the desk only picks the right
//! session out of the resulting case.

use crate::domain::access::{can_act, Actor, Role, SessionAction};
use crate::domain::actor::{CommandOutcome, DocketMessage};
use crate::domain::case::Case;
use crate::domain::errors::CaseError;
use crate::domain::lifecycle::{
    ApprovalRequest, CompletionRequest, MemorandumDecision, MemorandumUpload, ReviewRequest,
    SessionUpdate,
};
use crate::domain::session::{Session, SessionDetails};
use crate::domain::types::{CaseId, CaseNumber, SessionId, UserId};
use crate::domain::view::{CaseDirectory, CaseRecord};
use crate::domain::worklist::{
    assigned_sessions_for_draft_lawyer, pending_sessions_for_director, SessionWorkItem,
};
use crate::domain::CaseCommand;
use ractor::ActorRef;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Payload for opening a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenCaseRequest {
    pub case_number: CaseNumber,
    pub client: String,
    pub case_type: String,
    pub assigned_lawyer: Option<UserId>,
    pub approving_lawyer: Option<UserId>,
}

/// Front door to the docket actor.
#[derive(Clone)]
pub struct SessionDesk {
    actor: ActorRef<DocketMessage>,
}

impl SessionDesk {
    pub fn new(actor: ActorRef<DocketMessage>) -> Self {
        Self { actor }
    }

    async fn execute(
        &self,
        case_id: CaseId,
        cmd: CaseCommand,
    ) -> Result<CommandOutcome, CaseError> {
        let (tx, rx) = oneshot::channel();
        self.actor
            .send_message(DocketMessage::Command(case_id, Box::new(cmd), tx))
            .map_err(|_| unavailable())?;
        rx.await.map_err(|_| unavailable())?
    }

    async fn load(&self, case_id: CaseId) -> Result<CaseRecord, CaseError> {
        let (tx, rx) = oneshot::channel();
        self.actor
            .send_message(DocketMessage::GetCase(case_id, tx))
            .map_err(|_| unavailable())?;
        rx.await
            .map_err(|_| unavailable())?
            .ok_or_else(|| CaseError::not_found(format!("case {} not found", case_id)))
    }

    async fn directory(&self) -> Result<CaseDirectory, CaseError> {
        let (tx, rx) = oneshot::channel();
        self.actor
            .send_message(DocketMessage::GetDirectory(tx))
            .map_err(|_| unavailable())?;
        rx.await.map_err(|_| unavailable())
    }

    /// Opens a new case with the caller as its secretary.
    pub async fn open_case(
        &self,
        caller: &Actor,
        request: OpenCaseRequest,
    ) -> Result<Case, CaseError> {
        let case_id = CaseId::new();
        let cmd = CaseCommand::OpenCase {
            actor: caller.clone(),
            case_id,
            case_number: request.case_number,
            client: request.client,
            case_type: request.case_type,
            assigned_lawyer: request.assigned_lawyer,
            approving_lawyer: request.approving_lawyer,
        };
        let outcome = self.execute(case_id, cmd).await?;
        Ok(outcome.after.case)
    }

    pub async fn archive_case(&self, caller: &Actor, case_id: CaseId) -> Result<Case, CaseError> {
        let cmd = CaseCommand::ArchiveCase {
            actor: caller.clone(),
        };
        let outcome = self.execute(case_id, cmd).await?;
        Ok(outcome.after.case)
    }

    pub async fn get_case(&self, caller: &Actor, case_id: CaseId) -> Result<Case, CaseError> {
        let record = self.load(case_id).await?;
        ensure_viewer(caller, &record.case)?;
        Ok(record.case)
    }

    /// Schedules the next session of a case.
    pub async fn create_session(
        &self,
        caller: &Actor,
        case_id: CaseId,
        details: SessionDetails,
    ) -> Result<Session, CaseError> {
        let session_id = SessionId::new();
        let cmd = CaseCommand::CreateSession {
            actor: caller.clone(),
            session_id,
            details,
        };
        let outcome = self.execute(case_id, cmd).await?;
        session_in(&outcome.after.case, session_id)
    }

    /// Lists a case's sessions in session-number order.
    pub async fn get_sessions(
        &self,
        caller: &Actor,
        case_id: CaseId,
    ) -> Result<Vec<Session>, CaseError> {
        let case = self.get_case(caller, case_id).await?;
        let mut sessions = case.sessions().to_vec();
        sessions.sort_by_key(|session| session.session_number);
        Ok(sessions)
    }

    pub async fn update_session(
        &self,
        caller: &Actor,
        case_id: CaseId,
        session_id: SessionId,
        update: SessionUpdate,
    ) -> Result<Session, CaseError> {
        let cmd = CaseCommand::UpdateSession {
            actor: caller.clone(),
            session_id,
            update,
        };
        let outcome = self.execute(case_id, cmd).await?;
        session_in(&outcome.after.case, session_id)
    }

    /// Removes a session and returns it as it was before removal.
    pub async fn delete_session(
        &self,
        caller: &Actor,
        case_id: CaseId,
        session_id: SessionId,
    ) -> Result<Session, CaseError> {
        let cmd = CaseCommand::DeleteSession {
            actor: caller.clone(),
            session_id,
        };
        let outcome = self.execute(case_id, cmd).await?;
        match outcome.before {
            Some(before) => session_in(&before.case, session_id),
            None => Err(CaseError::StorageFailure {
                message: format!("case {} had no prior state for deletion", case_id),
            }),
        }
    }

    pub async fn review_session(
        &self,
        caller: &Actor,
        case_id: CaseId,
        session_id: SessionId,
        review: ReviewRequest,
    ) -> Result<Session, CaseError> {
        let cmd = CaseCommand::ReviewSession {
            actor: caller.clone(),
            session_id,
            review,
        };
        let outcome = self.execute(case_id, cmd).await?;
        session_in(&outcome.after.case, session_id)
    }

    pub async fn upload_session_memorandum(
        &self,
        caller: &Actor,
        case_id: CaseId,
        session_id: SessionId,
        upload: MemorandumUpload,
    ) -> Result<Session, CaseError> {
        let cmd = CaseCommand::UploadMemorandum {
            actor: caller.clone(),
            session_id,
            upload,
        };
        let outcome = self.execute(case_id, cmd).await?;
        session_in(&outcome.after.case, session_id)
    }

    pub async fn review_memorandum(
        &self,
        caller: &Actor,
        case_id: CaseId,
        session_id: SessionId,
        decision: MemorandumDecision,
    ) -> Result<Session, CaseError> {
        let cmd = CaseCommand::ReviewMemorandum {
            actor: caller.clone(),
            session_id,
            decision,
        };
        let outcome = self.execute(case_id, cmd).await?;
        session_in(&outcome.after.case, session_id)
    }

    pub async fn approve_session_for_submission(
        &self,
        caller: &Actor,
        case_id: CaseId,
        session_id: SessionId,
        approval: ApprovalRequest,
    ) -> Result<Session, CaseError> {
        let cmd = CaseCommand::ApproveForSubmission {
            actor: caller.clone(),
            session_id,
            approval,
        };
        let outcome = self.execute(case_id, cmd).await?;
        session_in(&outcome.after.case, session_id)
    }

    pub async fn complete_session(
        &self,
        caller: &Actor,
        case_id: CaseId,
        session_id: SessionId,
        completion: CompletionRequest,
    ) -> Result<Session, CaseError> {
        let cmd = CaseCommand::CompleteSession {
            actor: caller.clone(),
            session_id,
            completion,
        };
        let outcome = self.execute(case_id, cmd).await?;
        session_in(&outcome.after.case, session_id)
    }

    /// Director worklist across all active cases.
    pub async fn get_pending_sessions(
        &self,
        caller: &Actor,
    ) -> Result<Vec<SessionWorkItem>, CaseError> {
        if caller.role != Role::Director {
            return Err(CaseError::forbidden(format!(
                "{} is not a director",
                caller.id
            )));
        }
        let directory = self.directory().await?;
        Ok(pending_sessions_for_director(&directory))
    }

    /// Sessions the caller can act on as the assigned lawyer.
    pub async fn get_my_assigned_sessions(
        &self,
        caller: &Actor,
    ) -> Result<Vec<SessionWorkItem>, CaseError> {
        let directory = self.directory().await?;
        Ok(assigned_sessions_for_draft_lawyer(&directory, &caller.id))
    }
}

fn ensure_viewer(caller: &Actor, case: &Case) -> Result<(), CaseError> {
    if can_act(caller, case.roles(), SessionAction::ViewCase) {
        Ok(())
    } else {
        Err(CaseError::forbidden(format!(
            "{} is not {}",
            caller.id,
            SessionAction::ViewCase.required_party()
        )))
    }
}

fn session_in(case: &Case, session_id: SessionId) -> Result<Session, CaseError> {
    case.session(session_id)
        .cloned()
        .ok_or_else(|| CaseError::not_found(format!("session {} not found", session_id)))
}

fn unavailable() -> CaseError {
    CaseError::StorageFailure {
        message: "docket actor is not running".to_string(),
    }
}

#[cfg(test)]
#[path = "tests/desk_tests.rs"]
mod tests;
