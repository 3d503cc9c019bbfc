//! CQRS core types for event sourcing.
//!
//! This module contains the core CQRS types:
//! - **Commands**: Intent to change state
//! - **Events**: Facts that have happened
//! - **Aggregate**: Authorization, lifecycle checks and event application
//! - **Query**: Read-side projection

pub mod commands;
pub mod events;
pub mod query;

pub use commands::CaseCommand;
pub use events::CaseEvent;
pub use query::CaseDirectoryQuery;

use crate::domain::access::{can_act, Actor, CaseRoles, Role, SessionAction};
use crate::domain::case::Case;
use crate::domain::errors::CaseError;
use crate::domain::lifecycle;
use crate::domain::services::CaseServices;
use crate::domain::session::{DirectorApproval, MemorandumStatus, Session};
use crate::domain::types::{SessionId, TimestampUtc};
use async_trait::async_trait;
use cqrs_es::{Aggregate, DomainEvent};
use serde::{Deserialize, Serialize};

/// Case aggregate state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub enum CaseState {
    /// No CaseOpened event yet.
    #[default]
    Unopened,
    /// Case is open (boxed for memory efficiency).
    Open(Box<Case>),
}

/// The case aggregate. One instance per case id.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CaseAggregate {
    pub state: CaseState,
}

impl CaseAggregate {
    pub fn case(&self) -> Option<&Case> {
        match &self.state {
            CaseState::Open(case) => Some(case),
            CaseState::Unopened => None,
        }
    }
}

#[async_trait]
impl Aggregate for CaseAggregate {
    type Command = CaseCommand;
    type Event = CaseEvent;
    type Error = CaseError;
    type Services = CaseServices;

    fn aggregate_type() -> String {
        "case".to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        let now = services.clock.now();

        match (&self.state, command) {
            (
                CaseState::Unopened,
                CaseCommand::OpenCase {
                    actor,
                    case_id,
                    case_number,
                    client,
                    case_type,
                    assigned_lawyer,
                    approving_lawyer,
                },
            ) => {
                if actor.role != Role::Secretary {
                    return Err(CaseError::forbidden("only a secretary can open a case"));
                }
                if case_number.as_str().trim().is_empty() {
                    return Err(CaseError::validation("case number must not be empty"));
                }
                if client.trim().is_empty() {
                    return Err(CaseError::validation("client must not be empty"));
                }
                Ok(vec![CaseEvent::CaseOpened {
                    case_id,
                    case_number,
                    client,
                    case_type,
                    roles: CaseRoles {
                        secretary: Some(actor.id),
                        assigned_lawyer,
                        approving_lawyer,
                    },
                    opened_at: now,
                }])
            }

            (CaseState::Open(case), CaseCommand::OpenCase { .. }) => {
                Err(CaseError::invalid_state(format!(
                    "case {} is already open",
                    case.case_number().as_str()
                )))
            }

            (CaseState::Unopened, _cmd) => Err(CaseError::not_found("case not found")),

            (CaseState::Open(case), cmd) => decide(case, cmd, services, now),
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match &mut self.state {
            CaseState::Unopened => match Case::opened(&event) {
                Some(case) => self.state = CaseState::Open(Box::new(case)),
                None => tracing::warn!(
                    "Ignoring {} on an unopened case",
                    event.event_type()
                ),
            },
            CaseState::Open(case) => case.apply(&event),
        }
    }
}

/// Rejects the command unless the caller holds the role it needs.
fn authorize(case: &Case, actor: &Actor, action: SessionAction) -> Result<(), CaseError> {
    if can_act(actor, case.roles(), action) {
        return Ok(());
    }
    Err(CaseError::forbidden(format!(
        "{} is not {}",
        actor.id,
        action.required_party()
    )))
}

fn find_session(case: &Case, session_id: SessionId) -> Result<&Session, CaseError> {
    case.session(session_id)
        .ok_or_else(|| CaseError::not_found(format!("session {} not found", session_id)))
}

/// Decides the events for a command on an open case.
///
/// Checks run in a fixed order: session lookup, caller authorization, then
/// the lifecycle preconditions.
fn decide(
    case: &Case,
    command: CaseCommand,
    services: &CaseServices,
    now: TimestampUtc,
) -> Result<Vec<CaseEvent>, CaseError> {
    match command {
        CaseCommand::OpenCase { .. } => Err(CaseError::invalid_state("case is already open")),

        CaseCommand::ArchiveCase { actor } => {
            authorize(case, &actor, SessionAction::ArchiveCase)?;
            if case.is_archived() {
                return Err(CaseError::invalid_state("case is already archived"));
            }
            Ok(vec![CaseEvent::CaseArchived {
                archived_by: actor.id,
                archived_at: now,
            }])
        }

        CaseCommand::CreateSession {
            actor,
            session_id,
            details,
        } => {
            authorize(case, &actor, SessionAction::CreateSession)?;
            lifecycle::check_create(case.sessions())?;
            if case.session(session_id).is_some() {
                return Err(CaseError::validation(format!(
                    "session id {} is already in use",
                    session_id
                )));
            }
            Ok(vec![CaseEvent::SessionCreated {
                session_id,
                session_number: case.next_session_number(),
                details,
                created_by: actor.id,
                created_at: now,
            }])
        }

        CaseCommand::UpdateSession {
            actor,
            session_id,
            update,
        } => {
            let session = find_session(case, session_id)?;
            authorize(case, &actor, SessionAction::UpdateSession)?;
            lifecycle::check_update(session, &update)?;
            Ok(vec![CaseEvent::SessionUpdated {
                session_id,
                update,
                updated_at: now,
            }])
        }

        CaseCommand::DeleteSession { actor, session_id } => {
            let session = find_session(case, session_id)?;
            authorize(case, &actor, SessionAction::DeleteSession)?;
            lifecycle::check_delete(session, services.policy.allow_terminal_session_deletion)?;
            Ok(vec![CaseEvent::SessionDeleted {
                session_id,
                deleted_by: actor.id,
                deleted_at: now,
            }])
        }

        CaseCommand::ReviewSession {
            actor,
            session_id,
            review,
        } => {
            let session = find_session(case, session_id)?;
            authorize(case, &actor, SessionAction::ReviewSession)?;
            lifecycle::check_review(session)?;
            Ok(vec![CaseEvent::SessionReviewed {
                session_id,
                review,
                reviewed_by: actor.id,
                unlocked_for: case.roles().assigned_lawyer.clone(),
                reviewed_at: now,
            }])
        }

        CaseCommand::UploadMemorandum {
            actor,
            session_id,
            upload,
        } => {
            let session = find_session(case, session_id)?;
            authorize(case, &actor, SessionAction::UploadMemorandum)?;
            lifecycle::check_upload(session, &actor.id)?;
            Ok(vec![CaseEvent::MemorandumSubmitted {
                session_id,
                upload,
                prepared_by: actor.id,
                prepared_at: now,
            }])
        }

        CaseCommand::ReviewMemorandum {
            actor,
            session_id,
            decision,
        } => {
            let session = find_session(case, session_id)?;
            authorize(case, &actor, SessionAction::ReviewMemorandum)?;
            lifecycle::check_memorandum_review(session, &decision)?;
            let event = if decision.status == MemorandumStatus::Approved {
                CaseEvent::MemorandumApproved {
                    session_id,
                    reviewed_by: actor.id,
                    feedback: decision.feedback,
                    reviewed_at: now,
                }
            } else {
                CaseEvent::MemorandumRejected {
                    session_id,
                    reviewed_by: actor.id,
                    feedback: decision.feedback,
                    reviewed_at: now,
                }
            };
            Ok(vec![event])
        }

        CaseCommand::ApproveForSubmission {
            actor,
            session_id,
            approval,
        } => {
            let session = find_session(case, session_id)?;
            authorize(case, &actor, SessionAction::ApproveForSubmission)?;
            lifecycle::check_director_approval(session)?;
            let unlocked_for = case.roles().assigned_lawyer.clone();
            if unlocked_for.is_none() {
                tracing::info!(
                    "Case {} has no assigned lawyer; session {} stays locked after sign-off",
                    case.id(),
                    session.session_number
                );
            }
            Ok(vec![CaseEvent::SessionApprovedForSubmission {
                session_id,
                approval: DirectorApproval {
                    approved_by: actor.id,
                    approved_at: now,
                    signature_url: approval.signature_url,
                    additional_documents: approval.additional_documents,
                    notes: approval.notes,
                },
                unlocked_for,
            }])
        }

        CaseCommand::CompleteSession {
            actor,
            session_id,
            completion,
        } => {
            let session = find_session(case, session_id)?;
            authorize(case, &actor, SessionAction::CompleteSession)?;
            lifecycle::check_completion(session, &completion)?;
            Ok(vec![CaseEvent::SessionClosed {
                session_id,
                completion,
                closed_by: actor.id,
                closed_at: now,
            }])
        }
    }
}

#[cfg(test)]
#[path = "../tests/aggregate_tests.rs"]
mod tests;
