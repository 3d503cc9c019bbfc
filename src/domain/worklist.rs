//! Per-role worklists computed from the case directory.
//!
//! Both queries are read-only scans over non-archived cases. Results are
//! ordered by case number, then session number, so repeated calls on the same
//! directory return identical lists.

use crate::domain::case::Case;
use crate::domain::session::Session;
use crate::domain::types::{CaseId, CaseNumber, UserId};
use crate::domain::view::CaseDirectory;
use serde::{Deserialize, Serialize};

/// Case fields shown next to each session in a worklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSummary {
    pub case_id: CaseId,
    pub case_number: CaseNumber,
    pub case_type: String,
    pub client: String,
    pub assigned_lawyer: Option<UserId>,
    pub approving_lawyer: Option<UserId>,
}

impl From<&Case> for CaseSummary {
    fn from(case: &Case) -> Self {
        Self {
            case_id: case.id(),
            case_number: case.case_number().clone(),
            case_type: case.case_type().to_string(),
            client: case.client().to_string(),
            assigned_lawyer: case.roles().assigned_lawyer.clone(),
            approving_lawyer: case.roles().approving_lawyer.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionWorkItem {
    pub case: CaseSummary,
    pub session: Session,
}

fn collect<'a>(
    cases: impl Iterator<Item = &'a Case>,
    wanted: impl Fn(&Session) -> bool,
) -> Vec<SessionWorkItem> {
    let mut items = Vec::new();
    for case in cases {
        for session in case.sessions().iter().filter(|s| wanted(*s)) {
            items.push(SessionWorkItem {
                case: CaseSummary::from(case),
                session: session.clone(),
            });
        }
    }
    items.sort_by(|a, b| {
        a.case
            .case_number
            .cmp(&b.case.case_number)
            .then(a.session.session_number.cmp(&b.session.session_number))
    });
    items
}

/// Sessions waiting for director sign-off.
pub fn pending_sessions_for_director(directory: &CaseDirectory) -> Vec<SessionWorkItem> {
    collect(directory.active_cases(), Session::awaits_director)
}

/// Sessions the draft lawyer can act on right now: open for their edits, or
/// signed off and waiting to be filed.
pub fn assigned_sessions_for_draft_lawyer(
    directory: &CaseDirectory,
    lawyer: &UserId,
) -> Vec<SessionWorkItem> {
    let assigned = directory
        .active_cases()
        .filter(|case| case.roles().assigned_lawyer.as_ref() == Some(lawyer));
    collect(assigned, |session| {
        session.is_open_to(lawyer) || session.is_ready_for_submission
    })
}

#[cfg(test)]
#[path = "tests/worklist_tests.rs"]
mod tests;
