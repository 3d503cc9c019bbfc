use super::*;

fn roles() -> CaseRoles {
    CaseRoles {
        secretary: Some(UserId::from("sara")),
        assigned_lawyer: Some(UserId::from("lina")),
        approving_lawyer: Some(UserId::from("adam")),
    }
}

const ALL_ACTIONS: [SessionAction; 10] = [
    SessionAction::ArchiveCase,
    SessionAction::ViewCase,
    SessionAction::CreateSession,
    SessionAction::UpdateSession,
    SessionAction::DeleteSession,
    SessionAction::ReviewSession,
    SessionAction::UploadMemorandum,
    SessionAction::ReviewMemorandum,
    SessionAction::ApproveForSubmission,
    SessionAction::CompleteSession,
];

fn allowed(actor: &Actor) -> Vec<SessionAction> {
    ALL_ACTIONS
        .into_iter()
        .filter(|action| can_act(actor, &roles(), *action))
        .collect()
}

#[test]
fn test_secretary_manages_sessions_only() {
    let actor = Actor::new("sara", Role::Secretary);
    assert_eq!(
        allowed(&actor),
        vec![
            SessionAction::ArchiveCase,
            SessionAction::ViewCase,
            SessionAction::CreateSession,
            SessionAction::UpdateSession,
            SessionAction::DeleteSession,
        ]
    );
}

#[test]
fn test_approving_lawyer_reviews() {
    let actor = Actor::new("adam", Role::ApprovingLawyer);
    assert_eq!(
        allowed(&actor),
        vec![
            SessionAction::ViewCase,
            SessionAction::ReviewSession,
            SessionAction::ReviewMemorandum,
        ]
    );
}

#[test]
fn test_assigned_lawyer_uploads_and_completes() {
    let actor = Actor::new("lina", Role::Lawyer);
    assert_eq!(
        allowed(&actor),
        vec![
            SessionAction::ViewCase,
            SessionAction::UploadMemorandum,
            SessionAction::CompleteSession,
        ]
    );
}

#[test]
fn test_director_role_is_global() {
    let actor = Actor::new("dora", Role::Director);
    assert_eq!(
        allowed(&actor),
        vec![SessionAction::ViewCase, SessionAction::ApproveForSubmission]
    );
}

#[test]
fn test_identity_matters_not_role_label() {
    // Another secretary is not the secretary of this case.
    let outsider = Actor::new("sam", Role::Secretary);
    assert!(allowed(&outsider).is_empty());

    // The case's approving lawyer holding a director role may do both.
    let dual = Actor::new("adam", Role::Director);
    assert!(can_act(&dual, &roles(), SessionAction::ReviewSession));
    assert!(can_act(&dual, &roles(), SessionAction::ApproveForSubmission));
}

#[test]
fn test_unassigned_slot_matches_nobody() {
    let roles = CaseRoles {
        secretary: Some(UserId::from("sara")),
        assigned_lawyer: None,
        approving_lawyer: None,
    };
    let lawyer = Actor::new("lina", Role::Lawyer);
    assert!(!can_act(&lawyer, &roles, SessionAction::UploadMemorandum));
    assert!(!can_act(&lawyer, &roles, SessionAction::ViewCase));
}

#[test]
fn test_role_from_str_accepts_common_spellings() {
    assert_eq!("approvingLawyer".parse::<Role>(), Ok(Role::ApprovingLawyer));
    assert_eq!("approving_lawyer".parse::<Role>(), Ok(Role::ApprovingLawyer));
    assert_eq!("Director".parse::<Role>(), Ok(Role::Director));
    assert!("judge".parse::<Role>().is_err());
}

#[test]
fn test_role_serializes_camel_case() {
    let json = serde_json::to_string(&Role::ApprovingLawyer).unwrap();
    assert_eq!(json, "\"approvingLawyer\"");
}
