//! Case data shared by the aggregate and the read model.
//!
//! `Case` is rebuilt purely from [`CaseEvent`]s. Both the write side
//! (`CaseAggregate`) and the read side (`CaseDirectory`) call [`Case::apply`],
//! so they cannot drift apart.

use crate::domain::access::CaseRoles;
use crate::domain::lifecycle;
use crate::domain::session::Session;
use crate::domain::types::{CaseId, CaseNumber, SessionId, SessionNumber, TimestampUtc};
use crate::domain::CaseEvent;
use serde::{Deserialize, Serialize};

/// Aggregate root: a case with its ordered sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    id: CaseId,
    case_number: CaseNumber,
    client: String,
    case_type: String,
    roles: CaseRoles,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    archived_at: Option<TimestampUtc>,
    #[serde(default)]
    sessions: Vec<Session>,
    /// Highest session number ever handed out. Deleted numbers are not reused.
    #[serde(default)]
    last_session_number: SessionNumber,
    opened_at: TimestampUtc,
}

impl Case {
    /// Builds a case from its opening event. Returns `None` for any other event.
    pub fn opened(event: &CaseEvent) -> Option<Self> {
        match event {
            CaseEvent::CaseOpened {
                case_id,
                case_number,
                client,
                case_type,
                roles,
                opened_at,
            } => Some(Self {
                id: *case_id,
                case_number: case_number.clone(),
                client: client.clone(),
                case_type: case_type.clone(),
                roles: roles.clone(),
                archived: false,
                archived_at: None,
                sessions: Vec::new(),
                last_session_number: SessionNumber::default(),
                opened_at: *opened_at,
            }),
            _ => None,
        }
    }

    // ========== Public Getters ==========

    pub fn id(&self) -> CaseId {
        self.id
    }

    pub fn case_number(&self) -> &CaseNumber {
        &self.case_number
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn case_type(&self) -> &str {
        &self.case_type
    }

    pub fn roles(&self) -> &CaseRoles {
        &self.roles
    }

    pub fn is_archived(&self) -> bool {
        self.archived
    }

    pub fn opened_at(&self) -> TimestampUtc {
        self.opened_at
    }

    /// Sessions in creation order (ascending session number).
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Number the next created session will receive.
    pub fn next_session_number(&self) -> SessionNumber {
        self.last_session_number.next()
    }

    fn session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Applies a post-opening event.
    pub fn apply(&mut self, event: &CaseEvent) {
        match event {
            CaseEvent::CaseOpened { .. } => {
                tracing::warn!("Ignoring repeated CaseOpened for case {}", self.id);
            }

            CaseEvent::CaseArchived { archived_at, .. } => {
                self.archived = true;
                self.archived_at = Some(*archived_at);
            }

            CaseEvent::SessionCreated {
                session_id,
                session_number,
                details,
                created_by,
                created_at,
            } => {
                self.sessions.push(lifecycle::open_session(
                    *session_id,
                    *session_number,
                    details.clone(),
                    created_by.clone(),
                    *created_at,
                ));
                self.last_session_number = self.last_session_number.max(*session_number);
            }

            CaseEvent::SessionDeleted { session_id, .. } => {
                self.sessions.retain(|s| s.id != *session_id);
            }

            _ => self.apply_to_session(event),
        }
    }

    fn apply_to_session(&mut self, event: &CaseEvent) {
        let Some(session_id) = event.session_id() else {
            return;
        };
        let case_id = self.id;
        let Some(session) = self.session_mut(session_id) else {
            tracing::warn!(
                "Event references unknown session {} in case {}",
                session_id,
                case_id
            );
            return;
        };

        match event {
            CaseEvent::SessionUpdated {
                update, updated_at, ..
            } => lifecycle::apply_update(session, update, *updated_at),

            CaseEvent::SessionReviewed {
                review,
                reviewed_by,
                unlocked_for,
                reviewed_at,
                ..
            } => lifecycle::apply_review(
                session,
                review,
                reviewed_by,
                unlocked_for.as_ref(),
                *reviewed_at,
            ),

            CaseEvent::MemorandumSubmitted {
                upload,
                prepared_by,
                prepared_at,
                ..
            } => lifecycle::apply_upload(session, upload, prepared_by, *prepared_at),

            CaseEvent::MemorandumApproved {
                reviewed_by,
                feedback,
                reviewed_at,
                ..
            } => lifecycle::apply_memorandum_approved(
                session,
                reviewed_by,
                feedback.as_deref(),
                *reviewed_at,
            ),

            CaseEvent::MemorandumRejected {
                reviewed_by,
                feedback,
                reviewed_at,
                ..
            } => lifecycle::apply_memorandum_rejected(
                session,
                reviewed_by,
                feedback.as_deref(),
                *reviewed_at,
            ),

            CaseEvent::SessionApprovedForSubmission {
                approval,
                unlocked_for,
                ..
            } => lifecycle::apply_director_approval(
                session,
                approval.clone(),
                unlocked_for.as_ref(),
            ),

            CaseEvent::SessionClosed {
                completion,
                closed_by,
                closed_at,
                ..
            } => lifecycle::apply_completion(session, completion, closed_by, *closed_at),

            CaseEvent::CaseOpened { .. }
            | CaseEvent::CaseArchived { .. }
            | CaseEvent::SessionCreated { .. }
            | CaseEvent::SessionDeleted { .. } => {}
        }
    }
}
