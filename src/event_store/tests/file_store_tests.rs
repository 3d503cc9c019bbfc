use super::*;
use crate::domain::access::{Actor, Role};
use crate::domain::session::SessionDetails;
use crate::domain::types::{CaseId, SessionId, UserId};
use crate::domain::{CaseCommand, CaseServices};
use cqrs_es::CqrsFramework;
use tempfile::tempdir;

fn store_in(dir: &Path, snapshot_every: u64) -> FileEventStore {
    FileEventStore::new(
        dir.join("events.jsonl"),
        dir.join("snapshots"),
        snapshot_every,
    )
}

fn build_cqrs_for_test(
    snapshot_every: u64,
) -> (tempfile::TempDir, CqrsFramework<CaseAggregate, FileEventStore>) {
    let dir = tempdir().expect("temp dir");
    let store = store_in(dir.path(), snapshot_every);
    let queries: Vec<Box<dyn cqrs_es::Query<CaseAggregate>>> = Vec::new();
    (dir, CqrsFramework::new(store, queries, CaseServices::default()))
}

fn sara() -> Actor {
    Actor::new("sara", Role::Secretary)
}

fn open_case(case_id: CaseId) -> CaseCommand {
    CaseCommand::OpenCase {
        actor: sara(),
        case_id,
        case_number: "2024/300".into(),
        client: "Qasr Logistics".to_string(),
        case_type: "commercial".to_string(),
        assigned_lawyer: Some(UserId::from("lina")),
        approving_lawyer: Some(UserId::from("adam")),
    }
}

fn create_session() -> CaseCommand {
    CaseCommand::CreateSession {
        actor: sara(),
        session_id: SessionId::new(),
        details: SessionDetails::default(),
    }
}

#[tokio::test]
async fn test_commands_persist_and_reload() {
    let (dir, cqrs) = build_cqrs_for_test(50);
    let case_id = CaseId::new();
    let id = case_id.to_string();

    cqrs.execute(&id, open_case(case_id)).await.unwrap();
    cqrs.execute(&id, create_session()).await.unwrap();

    let store = store_in(dir.path(), 50);
    let ctx = store.load_aggregate(&id).await.unwrap();
    assert_eq!(ctx.current_sequence, 2);
    assert_eq!(ctx.aggregate.case().unwrap().sessions().len(), 1);

    let events = store.load_events(&id).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].payload.event_type(), "CaseOpened");
}

#[tokio::test]
async fn test_cases_are_isolated_in_shared_log() {
    let (dir, cqrs) = build_cqrs_for_test(50);
    let first = CaseId::new();
    let second = CaseId::new();

    cqrs.execute(&first.to_string(), open_case(first)).await.unwrap();
    cqrs.execute(&second.to_string(), open_case(second)).await.unwrap();
    cqrs.execute(&second.to_string(), create_session()).await.unwrap();

    let store = store_in(dir.path(), 50);
    let first_ctx = store.load_aggregate(&first.to_string()).await.unwrap();
    let second_ctx = store.load_aggregate(&second.to_string()).await.unwrap();
    assert_eq!(first_ctx.current_sequence, 1);
    assert_eq!(second_ctx.current_sequence, 2);
}

#[tokio::test]
async fn test_rejected_command_writes_nothing() {
    let (dir, cqrs) = build_cqrs_for_test(50);
    let case_id = CaseId::new();
    let id = case_id.to_string();

    cqrs.execute(&id, open_case(case_id)).await.unwrap();
    cqrs.execute(&id, create_session()).await.unwrap();
    let err = cqrs.execute(&id, create_session()).await.unwrap_err();
    match err {
        AggregateError::UserError(e) => assert_eq!(e.code(), "SEQUENCE_VIOLATION"),
        other => panic!("unexpected error: {}", other),
    }

    let store = store_in(dir.path(), 50);
    assert_eq!(store.load_events(&id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_stale_context_is_a_conflict() {
    let (dir, cqrs) = build_cqrs_for_test(50);
    let case_id = CaseId::new();
    let id = case_id.to_string();
    cqrs.execute(&id, open_case(case_id)).await.unwrap();

    let store = store_in(dir.path(), 50);
    let stale = store.load_aggregate(&id).await.unwrap();

    // Another writer commits first.
    cqrs.execute(&id, create_session()).await.unwrap();

    let event = CaseEvent::CaseArchived {
        archived_by: UserId::from("sara"),
        archived_at: TimestampUtc::now(),
    };
    let result = store.commit(vec![event], stale, HashMap::new()).await;
    assert!(matches!(result, Err(AggregateError::AggregateConflict)));
}

#[tokio::test]
async fn test_snapshot_written_and_used() {
    let (dir, cqrs) = build_cqrs_for_test(2);
    let case_id = CaseId::new();
    let id = case_id.to_string();

    cqrs.execute(&id, open_case(case_id)).await.unwrap();
    let store = store_in(dir.path(), 2);
    assert!(!store.snapshot_path(&id).exists());

    cqrs.execute(&id, create_session()).await.unwrap();
    assert!(store.snapshot_path(&id).exists());

    let snapshot = load_snapshot(&store.snapshot_path(&id)).unwrap().unwrap();
    assert_eq!(snapshot.sequence, 2);
    assert_eq!(snapshot.state.case().unwrap().sessions().len(), 1);

    // Rebuilding from snapshot plus tail matches a full replay.
    cqrs.execute(&id, CaseCommand::ArchiveCase { actor: sara() })
        .await
        .unwrap();
    let ctx = store.load_aggregate(&id).await.unwrap();
    assert_eq!(ctx.current_sequence, 3);
    assert!(ctx.aggregate.case().unwrap().is_archived());
}

fn append_raw(dir: &Path, text: &str) {
    let mut file = OpenOptions::new()
        .append(true)
        .open(dir.join("events.jsonl"))
        .expect("open log");
    file.write_all(text.as_bytes()).expect("append");
}

#[tokio::test]
async fn test_torn_line_of_another_case_does_not_block_commits() {
    let (dir, cqrs) = build_cqrs_for_test(50);
    let case_id = CaseId::new();
    let id = case_id.to_string();
    cqrs.execute(&id, open_case(case_id)).await.unwrap();

    // Interrupted write of some other case, without a trailing newline.
    append_raw(dir.path(), r#"{"aggregate_id":"other","seq"#);

    cqrs.execute(&id, create_session()).await.unwrap();

    let store = store_in(dir.path(), 50);
    let ctx = store.load_aggregate(&id).await.unwrap();
    assert_eq!(ctx.current_sequence, 2);
    assert_eq!(ctx.aggregate.case().unwrap().sessions().len(), 1);

    // The record after the torn fragment sits on its own line.
    let content = std::fs::read_to_string(dir.path().join("events.jsonl")).unwrap();
    let last = content.lines().last().unwrap();
    assert!(serde_json::from_str::<StoredEvent>(last).is_ok());
}

#[tokio::test]
async fn test_corrupt_line_of_requested_case_is_an_error() {
    let (dir, cqrs) = build_cqrs_for_test(50);
    let case_id = CaseId::new();
    let id = case_id.to_string();
    cqrs.execute(&id, open_case(case_id)).await.unwrap();

    append_raw(
        dir.path(),
        &format!("{{\"aggregate_id\":\"{}\",\"sequence\":\"two\"}}\n", id),
    );

    let store = store_in(dir.path(), 50);
    let result = store.load_events(&id).await;
    assert!(matches!(result, Err(AggregateError::DeserializationError(_))));

    // Other cases are unaffected.
    let other = CaseId::new();
    cqrs.execute(&other.to_string(), open_case(other))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_missing_log_loads_empty() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path(), 10);
    let ctx = store.load_aggregate(&CaseId::new().to_string()).await.unwrap();
    assert_eq!(ctx.current_sequence, 0);
    assert!(ctx.aggregate.case().is_none());
}

#[test]
fn test_crosses_snapshot_boundary() {
    assert!(!crosses_snapshot_boundary(48, 49, 50));
    assert!(crosses_snapshot_boundary(49, 50, 50));
    assert!(crosses_snapshot_boundary(48, 51, 50));
    assert!(!crosses_snapshot_boundary(50, 51, 50));
    assert!(!crosses_snapshot_boundary(0, 50, 0));
}
