//! Tests for docket actor.

use super::*;
use crate::domain::access::{Actor as Caller, Role};
use crate::domain::session::SessionDetails;
use crate::domain::types::{SessionId, UserId};
use tempfile::tempdir;

fn sara() -> Caller {
    Caller::new("sara", Role::Secretary)
}

fn open_case(case_id: CaseId) -> CaseCommand {
    CaseCommand::OpenCase {
        actor: sara(),
        case_id,
        case_number: "2024/55".into(),
        client: "Rawda Foods".to_string(),
        case_type: "commercial".to_string(),
        assigned_lawyer: Some(UserId::from("lina")),
        approving_lawyer: Some(UserId::from("adam")),
    }
}

async fn send(
    actor_ref: &ActorRef<DocketMessage>,
    case_id: CaseId,
    cmd: CaseCommand,
) -> Result<CommandOutcome, CaseError> {
    let (tx, rx) = oneshot::channel();
    actor_ref
        .send_message(DocketMessage::Command(case_id, Box::new(cmd), tx))
        .expect("send failed");
    rx.await.expect("receive failed")
}

#[tokio::test]
async fn test_actor_handles_command() {
    let dir = tempdir().expect("temp dir");
    let paths = DocketPaths::at(dir.path()).unwrap();
    let args = create_actor_args(&paths, 50, CaseServices::default());

    let (actor_ref, _handle) = DocketActor::spawn(None, DocketActor, args)
        .await
        .expect("actor spawn failed");

    let case_id = CaseId::new();
    let outcome = send(&actor_ref, case_id, open_case(case_id))
        .await
        .expect("open case");
    assert!(outcome.before.is_none());
    assert_eq!(outcome.after.case.client(), "Rawda Foods");
    assert_eq!(outcome.after.last_event_sequence, 1);

    let (tx, rx) = oneshot::channel();
    actor_ref
        .send_message(DocketMessage::GetCase(case_id, tx))
        .expect("send failed");
    assert!(rx.await.expect("receive failed").is_some());
}

#[tokio::test]
async fn test_actor_surfaces_domain_errors() {
    let dir = tempdir().expect("temp dir");
    let paths = DocketPaths::at(dir.path()).unwrap();
    let args = create_actor_args(&paths, 50, CaseServices::default());
    let (actor_ref, _handle) = DocketActor::spawn(None, DocketActor, args)
        .await
        .expect("actor spawn failed");

    let missing = CaseId::new();
    let cmd = CaseCommand::CreateSession {
        actor: sara(),
        session_id: SessionId::new(),
        details: SessionDetails::default(),
    };
    let err = send(&actor_ref, missing, cmd).await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_bootstrap_directory_from_events() {
    let dir = tempdir().expect("temp dir");
    let paths = DocketPaths::at(dir.path()).unwrap();
    let args = create_actor_args(&paths, 50, CaseServices::default());
    let log_path = args.log_path.clone();

    let (actor_ref, handle) = DocketActor::spawn(None, DocketActor, args)
        .await
        .expect("actor spawn failed");

    let case_id = CaseId::new();
    send(&actor_ref, case_id, open_case(case_id)).await.unwrap();
    send(
        &actor_ref,
        case_id,
        CaseCommand::CreateSession {
            actor: sara(),
            session_id: SessionId::new(),
            details: SessionDetails::default(),
        },
    )
    .await
    .unwrap();

    actor_ref.stop(None);
    handle.await.expect("actor stopped");

    let directory = bootstrap_directory_from_events(&log_path);
    let record = directory.get(case_id).expect("case replayed");
    assert_eq!(record.last_event_sequence, 2);
    assert_eq!(record.case.sessions().len(), 1);
}

#[test]
fn test_bootstrap_directory_nonexistent_log() {
    let dir = tempdir().expect("temp dir");
    let directory = bootstrap_directory_from_events(&dir.path().join("missing.jsonl"));
    assert!(directory.is_empty());
}

#[test]
fn test_bootstrap_skips_garbage_lines() {
    let dir = tempdir().expect("temp dir");
    let log_path = dir.path().join("events.jsonl");
    std::fs::write(&log_path, "not json\n\n{\"also\": \"not an event\"}\n").unwrap();
    let directory = bootstrap_directory_from_events(&log_path);
    assert!(directory.is_empty());
}

async fn get_case(actor_ref: &ActorRef<DocketMessage>, case_id: CaseId) -> Option<CaseRecord> {
    let (tx, rx) = oneshot::channel();
    actor_ref
        .send_message(DocketMessage::GetCase(case_id, tx))
        .expect("send failed");
    rx.await.expect("receive failed")
}

fn create_session() -> CaseCommand {
    CaseCommand::CreateSession {
        actor: sara(),
        session_id: SessionId::new(),
        details: SessionDetails::default(),
    }
}

#[tokio::test]
async fn test_two_actors_sharing_a_log_see_each_others_commits() {
    let dir = tempdir().expect("temp dir");
    let paths = DocketPaths::at(dir.path()).unwrap();
    let (first, _h1) = DocketActor::spawn(
        None,
        DocketActor,
        create_actor_args(&paths, 50, CaseServices::default()),
    )
    .await
    .expect("actor spawn failed");

    let case_id = CaseId::new();
    send(&first, case_id, open_case(case_id)).await.unwrap();

    // Started after the case was opened, so its directory knows the case.
    let (second, _h2) = DocketActor::spawn(
        None,
        DocketActor,
        create_actor_args(&paths, 50, CaseServices::default()),
    )
    .await
    .expect("actor spawn failed");

    send(&second, case_id, create_session()).await.unwrap();

    // The first actor commits on top of the second actor's event.
    let outcome = send(&first, case_id, CaseCommand::ArchiveCase { actor: sara() })
        .await
        .expect("archive after foreign commit");
    let before = outcome.before.expect("case existed");
    assert_eq!(before.last_event_sequence, 2);
    assert_eq!(before.case.sessions().len(), 1);
    assert_eq!(outcome.after.last_event_sequence, 3);
    assert!(outcome.after.case.is_archived());

    let seen = get_case(&second, case_id).await.expect("case visible");
    assert_eq!(seen.last_event_sequence, 3);
    assert!(seen.case.is_archived());
}

#[tokio::test]
async fn test_actor_started_before_the_case_picks_it_up() {
    let dir = tempdir().expect("temp dir");
    let paths = DocketPaths::at(dir.path()).unwrap();
    let (first, _h1) = DocketActor::spawn(
        None,
        DocketActor,
        create_actor_args(&paths, 50, CaseServices::default()),
    )
    .await
    .expect("actor spawn failed");
    let (second, _h2) = DocketActor::spawn(
        None,
        DocketActor,
        create_actor_args(&paths, 50, CaseServices::default()),
    )
    .await
    .expect("actor spawn failed");

    let case_id = CaseId::new();
    send(&first, case_id, open_case(case_id)).await.unwrap();

    let outcome = send(&second, case_id, create_session())
        .await
        .expect("create on a case opened elsewhere");
    assert!(outcome.before.is_some());
    assert_eq!(outcome.after.case.sessions().len(), 1);

    let seen = get_case(&first, case_id).await.expect("case visible");
    assert_eq!(seen.case.sessions().len(), 1);

    // The first actor's view now includes the open session.
    let err = send(&first, case_id, create_session()).await.unwrap_err();
    assert_eq!(err.code(), "SEQUENCE_VIOLATION");

    let (tx, rx) = oneshot::channel();
    first
        .send_message(DocketMessage::GetDirectory(tx))
        .expect("send failed");
    let directory = rx.await.expect("receive failed");
    assert_eq!(directory.get(case_id).map(|r| r.last_event_sequence), Some(2));
}
