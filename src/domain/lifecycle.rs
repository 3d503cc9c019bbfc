//! Session lifecycle engine.
//!
//! Pure transition rules with no knowledge of who is calling. Each step is a
//! pair: a `check_*` function that validates preconditions without touching
//! the session, and an `apply_*` function that performs the mutation and cannot
//! fail. The aggregate runs the check while deciding which event to emit and
//! the apply when the event is replayed, so the read model and the aggregate
//! evolve identically.

use crate::domain::errors::CaseError;
use crate::domain::session::{
    DirectorApproval, MemorandumStatus, Session, SessionDetails, SessionOutcome, SessionStatus,
};
use crate::domain::types::{DocumentUrl, SessionId, SessionNumber, TimestampUtc, UserId};
use serde::{Deserialize, Serialize};

/// Secretary edits to an existing session. `None` fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub scheduled_for: Option<TimestampUtc>,
    pub court: Option<String>,
    pub description: Option<String>,
    pub status: Option<SessionStatus>,
}

/// Requirements set by the approving lawyer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub memorandum_required: bool,
    pub supporting_documents_required: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemorandumUpload {
    pub content: Option<String>,
    pub file_url: Option<DocumentUrl>,
}

/// The approving lawyer's verdict on a submitted memorandum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorandumDecision {
    pub status: MemorandumStatus,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub signature_url: Option<DocumentUrl>,
    pub additional_documents: Vec<DocumentUrl>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub status: SessionStatus,
    pub outcome: Option<SessionOutcome>,
    pub reason_for_adjournment: Option<String>,
    pub next_session_date: Option<TimestampUtc>,
}

/// Rejects any mutation of a completed or cancelled session.
pub fn ensure_open(session: &Session) -> Result<(), CaseError> {
    if session.status.is_terminal() {
        return Err(CaseError::invalid_state(format!(
            "session {} is already {}",
            session.session_number,
            session.status.as_str()
        )));
    }
    Ok(())
}

// ========== Creation ==========

/// At most one non-terminal session per case.
pub fn check_create(sessions: &[Session]) -> Result<(), CaseError> {
    if let Some(open) = sessions.iter().find(|s| !s.status.is_terminal()) {
        return Err(CaseError::SequenceViolation {
            message: format!(
                "previous session {} must be completed or cancelled first",
                open.session_number
            ),
        });
    }
    Ok(())
}

/// Builds a fresh session: upcoming, locked, not reviewed, memorandum pending.
pub fn open_session(
    id: SessionId,
    number: SessionNumber,
    details: SessionDetails,
    created_by: UserId,
    at: TimestampUtc,
) -> Session {
    Session {
        id,
        session_number: number,
        details,
        status: SessionStatus::Upcoming,
        is_locked: true,
        created_by: Some(created_by),
        created_at: Some(at),
        ..Session::default()
    }
}

// ========== Secretary edits ==========

pub fn check_update(session: &Session, update: &SessionUpdate) -> Result<(), CaseError> {
    ensure_open(session)?;
    if let Some(status) = update.status {
        if !matches!(status, SessionStatus::Upcoming | SessionStatus::InProgress) {
            return Err(CaseError::validation(format!(
                "status can only be set to UPCOMING or IN_PROGRESS, got {}",
                status.as_str()
            )));
        }
        if !matches!(
            session.status,
            SessionStatus::Upcoming | SessionStatus::InProgress
        ) {
            return Err(CaseError::invalid_state(format!(
                "cannot move a {} session back to {}",
                session.status.as_str(),
                status.as_str()
            )));
        }
    }
    Ok(())
}

pub fn apply_update(session: &mut Session, update: &SessionUpdate, at: TimestampUtc) {
    if let Some(scheduled_for) = update.scheduled_for {
        session.details.scheduled_for = Some(scheduled_for);
    }
    if let Some(court) = &update.court {
        session.details.court = Some(court.clone());
    }
    if let Some(description) = &update.description {
        session.details.description = Some(description.clone());
    }
    if let Some(status) = update.status {
        session.status = status;
    }
    session.updated_at = Some(at);
}

/// Deletion is a secretary override; closed sessions are protected only when
/// the policy says so.
pub fn check_delete(session: &Session, allow_terminal: bool) -> Result<(), CaseError> {
    if !allow_terminal && session.status.is_terminal() {
        return Err(CaseError::invalid_state(format!(
            "session {} is {} and cannot be deleted",
            session.session_number,
            session.status.as_str()
        )));
    }
    Ok(())
}

// ========== Review ==========

pub fn check_review(session: &Session) -> Result<(), CaseError> {
    ensure_open(session)
}

/// Records requirements. A required memorandum opens the session to the
/// draft lawyer; otherwise the lock is left as it was.
pub fn apply_review(
    session: &mut Session,
    review: &ReviewRequest,
    reviewer: &UserId,
    unlock_for: Option<&UserId>,
    at: TimestampUtc,
) {
    session.memorandum_required = review.memorandum_required;
    session.supporting_documents_required = review.supporting_documents_required;
    session.review_notes = review.notes.clone();
    session.reviewed_by = Some(reviewer.clone());
    session.reviewed_at = Some(at);
    if review.memorandum_required {
        session.is_locked = false;
        session.unlocked_for = unlock_for.cloned();
    }
}

// ========== Memorandum ==========

pub fn check_upload(session: &Session, uploader: &UserId) -> Result<(), CaseError> {
    ensure_open(session)?;
    if session.is_locked {
        return Err(CaseError::SessionLocked {
            message: format!("session {} is locked", session.session_number),
        });
    }
    if session.unlocked_for.as_ref() != Some(uploader) {
        return Err(CaseError::forbidden(format!(
            "session {} is not unlocked for {}",
            session.session_number, uploader
        )));
    }
    if session.memorandum.status == MemorandumStatus::Approved {
        return Err(CaseError::invalid_state(
            "memorandum is already approved and can no longer be replaced",
        ));
    }
    Ok(())
}

/// Stores the draft and marks it submitted. The session stays unlocked.
pub fn apply_upload(
    session: &mut Session,
    upload: &MemorandumUpload,
    uploader: &UserId,
    at: TimestampUtc,
) {
    let memo = &mut session.memorandum;
    memo.content = upload.content.clone();
    memo.file_url = upload.file_url.clone();
    memo.prepared_by = Some(uploader.clone());
    memo.prepared_at = Some(at);
    memo.status = MemorandumStatus::Submitted;
}

pub fn check_memorandum_review(
    session: &Session,
    decision: &MemorandumDecision,
) -> Result<(), CaseError> {
    ensure_open(session)?;
    if session.memorandum.status != MemorandumStatus::Submitted {
        return Err(CaseError::invalid_state(format!(
            "memorandum not yet submitted (status {})",
            session.memorandum.status.as_str()
        )));
    }
    match decision.status {
        MemorandumStatus::Approved | MemorandumStatus::Rejected => Ok(()),
        other => Err(CaseError::validation(format!(
            "memorandum review must be APPROVED or REJECTED, got {}",
            other.as_str()
        ))),
    }
}

/// Approval locks the session and moves it to pending signature.
pub fn apply_memorandum_approved(
    session: &mut Session,
    reviewer: &UserId,
    feedback: Option<&str>,
    at: TimestampUtc,
) {
    record_memorandum_verdict(session, MemorandumStatus::Approved, reviewer, feedback, at);
    session.is_locked = true;
    session.status = SessionStatus::PendingSignature;
    session.pending_signature_at = Some(at);
}

/// Rejection reopens the session to whoever it was unlocked for.
pub fn apply_memorandum_rejected(
    session: &mut Session,
    reviewer: &UserId,
    feedback: Option<&str>,
    at: TimestampUtc,
) {
    record_memorandum_verdict(session, MemorandumStatus::Rejected, reviewer, feedback, at);
    session.is_locked = false;
}

fn record_memorandum_verdict(
    session: &mut Session,
    status: MemorandumStatus,
    reviewer: &UserId,
    feedback: Option<&str>,
    at: TimestampUtc,
) {
    let memo = &mut session.memorandum;
    memo.status = status;
    memo.feedback = feedback.map(str::to_string);
    memo.reviewed_by = Some(reviewer.clone());
    memo.reviewed_at = Some(at);
}

// ========== Director sign-off ==========

pub fn check_director_approval(session: &Session) -> Result<(), CaseError> {
    ensure_open(session)?;
    if session.memorandum.status != MemorandumStatus::Approved {
        return Err(CaseError::invalid_state(
            "memorandum must be approved first",
        ));
    }
    Ok(())
}

/// Records the sign-off and hands the session to the draft lawyer for
/// submission. Without an assigned lawyer the lock is left untouched.
pub fn apply_director_approval(
    session: &mut Session,
    approval: DirectorApproval,
    unlock_for: Option<&UserId>,
) {
    session.director_approval = Some(approval);
    session.is_ready_for_submission = true;
    if let Some(lawyer) = unlock_for {
        session.is_locked = false;
        session.unlocked_for = Some(lawyer.clone());
    }
}

// ========== Completion ==========

pub fn check_completion(session: &Session, request: &CompletionRequest) -> Result<(), CaseError> {
    if !session.is_ready_for_submission {
        return Err(CaseError::forbidden(format!(
            "session {} must be director-approved first",
            session.session_number
        )));
    }
    if !request.status.is_terminal() {
        return Err(CaseError::validation(format!(
            "completion status must be COMPLETED or CANCELLED, got {}",
            request.status.as_str()
        )));
    }
    Ok(())
}

/// Closes the session for good.
pub fn apply_completion(
    session: &mut Session,
    request: &CompletionRequest,
    completed_by: &UserId,
    at: TimestampUtc,
) {
    session.status = request.status;
    session.outcome = request.outcome;
    session.reason_for_adjournment = request.reason_for_adjournment.clone();
    session.next_session_date = request.next_session_date;
    session.completed_by = Some(completed_by.clone());
    session.completed_at = Some(at);
    session.is_ready_for_submission = false;
    session.is_locked = true;
    session.unlocked_for = None;
}

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod tests;
