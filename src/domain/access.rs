//! Authorization rules for case and session actions.
//!
//! Who may do what is decided here and nowhere else. The lifecycle engine never
//! looks at identities; the aggregate asks [`can_act`] before running it.

use crate::domain::types::UserId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Global role assigned by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Secretary,
    Lawyer,
    ApprovingLawyer,
    Director,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "secretary" => Ok(Self::Secretary),
            "lawyer" => Ok(Self::Lawyer),
            "approvinglawyer" => Ok(Self::ApprovingLawyer),
            "director" => Ok(Self::Director),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// A verified caller: identity plus global role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<UserId>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn is_director(&self) -> bool {
        self.role == Role::Director
    }
}

/// Role assignments fixed on a case when it is opened.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRoles {
    pub secretary: Option<UserId>,
    /// The draft lawyer.
    pub assigned_lawyer: Option<UserId>,
    pub approving_lawyer: Option<UserId>,
}

impl CaseRoles {
    fn holds(slot: &Option<UserId>, actor: &Actor) -> bool {
        slot.as_ref().is_some_and(|id| *id == actor.id)
    }

    pub fn is_secretary(&self, actor: &Actor) -> bool {
        Self::holds(&self.secretary, actor)
    }

    pub fn is_assigned_lawyer(&self, actor: &Actor) -> bool {
        Self::holds(&self.assigned_lawyer, actor)
    }

    pub fn is_approving_lawyer(&self, actor: &Actor) -> bool {
        Self::holds(&self.approving_lawyer, actor)
    }
}

/// Actions a caller may attempt on a case or one of its sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    ArchiveCase,
    ViewCase,
    CreateSession,
    UpdateSession,
    DeleteSession,
    ReviewSession,
    UploadMemorandum,
    ReviewMemorandum,
    ApproveForSubmission,
    CompleteSession,
}

impl SessionAction {
    /// Human-readable name of the party allowed to perform the action.
    pub fn required_party(&self) -> &'static str {
        match self {
            Self::ArchiveCase
            | Self::CreateSession
            | Self::UpdateSession
            | Self::DeleteSession => "the case secretary",
            Self::ViewCase => "a participant of the case or a director",
            Self::ReviewSession | Self::ReviewMemorandum => "the approving lawyer",
            Self::UploadMemorandum | Self::CompleteSession => "the assigned lawyer",
            Self::ApproveForSubmission => "a director",
        }
    }
}

/// Returns whether `actor` may perform `action` on a case with `roles`.
///
/// Case-scoped actions compare the caller's identity to the case's role
/// fields; director sign-off checks the caller's global role.
pub fn can_act(actor: &Actor, roles: &CaseRoles, action: SessionAction) -> bool {
    match action {
        SessionAction::ArchiveCase
        | SessionAction::CreateSession
        | SessionAction::UpdateSession
        | SessionAction::DeleteSession => roles.is_secretary(actor),
        SessionAction::ReviewSession | SessionAction::ReviewMemorandum => {
            roles.is_approving_lawyer(actor)
        }
        SessionAction::UploadMemorandum | SessionAction::CompleteSession => {
            roles.is_assigned_lawyer(actor)
        }
        SessionAction::ApproveForSubmission => actor.is_director(),
        SessionAction::ViewCase => {
            actor.is_director()
                || roles.is_secretary(actor)
                || roles.is_assigned_lawyer(actor)
                || roles.is_approving_lawyer(actor)
        }
    }
}

#[cfg(test)]
#[path = "tests/access_tests.rs"]
mod tests;
