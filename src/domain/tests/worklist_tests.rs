use super::*;
use crate::domain::access::{Actor, Role};
use crate::domain::lifecycle::{
    ApprovalRequest, CompletionRequest, MemorandumDecision, MemorandumUpload, ReviewRequest,
};
use crate::domain::services::CaseServices;
use crate::domain::session::{MemorandumStatus, SessionDetails, SessionStatus};
use crate::domain::types::SessionId;
use crate::domain::{CaseAggregate, CaseCommand};
use cqrs_es::Aggregate;
use std::collections::HashMap;

/// Drives aggregates in memory and mirrors every event into a directory.
#[derive(Default)]
struct Desk {
    aggregates: HashMap<CaseId, (CaseAggregate, u64)>,
    directory: CaseDirectory,
}

impl Desk {
    async fn run(&mut self, case_id: CaseId, cmd: CaseCommand) {
        let (agg, seq) = self.aggregates.entry(case_id).or_default();
        let events = agg
            .handle(cmd, &CaseServices::default())
            .await
            .expect("command accepted");
        for event in events {
            *seq += 1;
            self.directory
                .apply_event(&case_id.to_string(), &event, *seq);
            agg.apply(event);
        }
    }

    async fn open(&mut self, number: &str, lawyer: &str) -> CaseId {
        let case_id = CaseId::new();
        self.run(
            case_id,
            CaseCommand::OpenCase {
                actor: sara(),
                case_id,
                case_number: number.into(),
                client: format!("client of {}", number),
                case_type: "civil".to_string(),
                assigned_lawyer: Some(UserId::from(lawyer)),
                approving_lawyer: Some(UserId::from("adam")),
            },
        )
        .await;
        case_id
    }

    async fn session(&mut self, case_id: CaseId) -> SessionId {
        let session_id = SessionId::new();
        self.run(
            case_id,
            CaseCommand::CreateSession {
                actor: sara(),
                session_id,
                details: SessionDetails::default(),
            },
        )
        .await;
        session_id
    }

    async fn review(&mut self, case_id: CaseId, session_id: SessionId) {
        self.run(
            case_id,
            CaseCommand::ReviewSession {
                actor: Actor::new("adam", Role::ApprovingLawyer),
                session_id,
                review: ReviewRequest {
                    memorandum_required: true,
                    ..ReviewRequest::default()
                },
            },
        )
        .await;
    }

    async fn upload(&mut self, case_id: CaseId, session_id: SessionId, lawyer: &str) {
        self.run(
            case_id,
            CaseCommand::UploadMemorandum {
                actor: Actor::new(lawyer, Role::Lawyer),
                session_id,
                upload: MemorandumUpload::default(),
            },
        )
        .await;
    }

    async fn decide(&mut self, case_id: CaseId, session_id: SessionId, status: MemorandumStatus) {
        self.run(
            case_id,
            CaseCommand::ReviewMemorandum {
                actor: Actor::new("adam", Role::ApprovingLawyer),
                session_id,
                decision: MemorandumDecision {
                    status,
                    feedback: None,
                },
            },
        )
        .await;
    }

    async fn sign(&mut self, case_id: CaseId, session_id: SessionId) {
        self.run(
            case_id,
            CaseCommand::ApproveForSubmission {
                actor: Actor::new("dora", Role::Director),
                session_id,
                approval: ApprovalRequest::default(),
            },
        )
        .await;
    }
}

fn sara() -> Actor {
    Actor::new("sara", Role::Secretary)
}

fn numbers(items: &[SessionWorkItem]) -> Vec<&str> {
    items.iter().map(|i| i.case.case_number.as_str()).collect()
}

#[tokio::test]
async fn test_director_sees_submitted_and_approved_memoranda() {
    let mut desk = Desk::default();

    let untouched = desk.open("C-1", "lina").await;
    desk.session(untouched).await;

    let submitted = desk.open("C-2", "lina").await;
    let s2 = desk.session(submitted).await;
    desk.review(submitted, s2).await;
    desk.upload(submitted, s2, "lina").await;

    let approved = desk.open("C-3", "lina").await;
    let s3 = desk.session(approved).await;
    desk.review(approved, s3).await;
    desk.upload(approved, s3, "lina").await;
    desk.decide(approved, s3, MemorandumStatus::Approved).await;

    let signed = desk.open("C-4", "lina").await;
    let s4 = desk.session(signed).await;
    desk.review(signed, s4).await;
    desk.upload(signed, s4, "lina").await;
    desk.decide(signed, s4, MemorandumStatus::Approved).await;
    desk.sign(signed, s4).await;

    let rejected = desk.open("C-5", "lina").await;
    let s5 = desk.session(rejected).await;
    desk.review(rejected, s5).await;
    desk.upload(rejected, s5, "lina").await;
    desk.decide(rejected, s5, MemorandumStatus::Rejected).await;

    let pending = pending_sessions_for_director(&desk.directory);
    assert_eq!(numbers(&pending), vec!["C-2", "C-3"]);
    assert_eq!(pending[1].session.status, SessionStatus::PendingSignature);
    assert_eq!(pending[0].case.assigned_lawyer, Some(UserId::from("lina")));
}

#[tokio::test]
async fn test_archived_cases_drop_out_of_worklists() {
    let mut desk = Desk::default();
    let case_id = desk.open("C-7", "lina").await;
    let session_id = desk.session(case_id).await;
    desk.review(case_id, session_id).await;
    desk.upload(case_id, session_id, "lina").await;
    assert_eq!(pending_sessions_for_director(&desk.directory).len(), 1);

    desk.run(case_id, CaseCommand::ArchiveCase { actor: sara() })
        .await;
    assert!(pending_sessions_for_director(&desk.directory).is_empty());
    assert!(assigned_sessions_for_draft_lawyer(&desk.directory, &UserId::from("lina")).is_empty());
}

#[tokio::test]
async fn test_lawyer_sees_open_and_signed_sessions_only() {
    let mut desk = Desk::default();
    let lina = UserId::from("lina");

    let locked = desk.open("L-1", "lina").await;
    desk.session(locked).await;

    let open = desk.open("L-2", "lina").await;
    let s2 = desk.session(open).await;
    desk.review(open, s2).await;

    let awaiting = desk.open("L-3", "lina").await;
    let s3 = desk.session(awaiting).await;
    desk.review(awaiting, s3).await;
    desk.upload(awaiting, s3, "lina").await;
    desk.decide(awaiting, s3, MemorandumStatus::Approved).await;

    let signed = desk.open("L-4", "lina").await;
    let s4 = desk.session(signed).await;
    desk.review(signed, s4).await;
    desk.upload(signed, s4, "lina").await;
    desk.decide(signed, s4, MemorandumStatus::Approved).await;
    desk.sign(signed, s4).await;

    let someone_else = desk.open("L-5", "omar").await;
    let s5 = desk.session(someone_else).await;
    desk.review(someone_else, s5).await;

    let mine = assigned_sessions_for_draft_lawyer(&desk.directory, &lina);
    assert_eq!(numbers(&mine), vec!["L-2", "L-4"]);
    assert!(mine[1].session.is_ready_for_submission);
}

#[tokio::test]
async fn test_completed_sessions_leave_lawyer_worklist() {
    let mut desk = Desk::default();
    let lina = UserId::from("lina");
    let case_id = desk.open("L-9", "lina").await;
    let session_id = desk.session(case_id).await;
    desk.review(case_id, session_id).await;
    desk.upload(case_id, session_id, "lina").await;
    desk.decide(case_id, session_id, MemorandumStatus::Approved).await;
    desk.sign(case_id, session_id).await;
    assert_eq!(assigned_sessions_for_draft_lawyer(&desk.directory, &lina).len(), 1);

    desk.run(
        case_id,
        CaseCommand::CompleteSession {
            actor: Actor::new("lina", Role::Lawyer),
            session_id,
            completion: CompletionRequest {
                status: SessionStatus::Completed,
                outcome: None,
                reason_for_adjournment: None,
                next_session_date: None,
            },
        },
    )
    .await;

    assert!(assigned_sessions_for_draft_lawyer(&desk.directory, &lina).is_empty());
    assert!(pending_sessions_for_director(&desk.directory).is_empty());
}

#[tokio::test]
async fn test_closed_sessions_never_await_the_director() {
    let mut desk = Desk::default();
    let case_id = desk.open("D-1", "lina").await;
    let session_id = desk.session(case_id).await;
    desk.review(case_id, session_id).await;
    desk.upload(case_id, session_id, "lina").await;
    desk.decide(case_id, session_id, MemorandumStatus::Approved).await;
    desk.sign(case_id, session_id).await;
    desk.run(
        case_id,
        CaseCommand::CompleteSession {
            actor: Actor::new("lina", Role::Lawyer),
            session_id,
            completion: CompletionRequest {
                status: SessionStatus::Completed,
                outcome: None,
                reason_for_adjournment: None,
                next_session_date: None,
            },
        },
    )
    .await;

    // Completion clears the ready flag but the memorandum still reads APPROVED.
    let record = desk.directory.get(case_id).expect("case");
    let session = record.case.session(session_id).expect("session");
    assert!(!session.is_ready_for_submission);
    assert_eq!(session.memorandum.status, MemorandumStatus::Approved);
    assert!(pending_sessions_for_director(&desk.directory).is_empty());
}
