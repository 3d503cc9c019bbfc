//! Docket actor for CQRS command handling.
//!
//! The DocketActor owns the CQRS framework and processes one message at a
//! time, so commands issued from this process never interleave. Reads are
//! answered from the shared `CaseDirectory`, which is brought up to date with
//! the event log first: other processes may append to the same log.

use crate::docket_paths::DocketPaths;
use crate::domain::cqrs::CaseAggregate;
use crate::domain::errors::CaseError;
use crate::domain::services::CaseServices;
use crate::domain::types::CaseId;
use crate::domain::view::{CaseDirectory, CaseRecord};
use crate::domain::CaseCommand;
use crate::domain::CaseDirectoryQuery;
use crate::event_store::{FileEventStore, StoredEvent};
use async_trait::async_trait;
use cqrs_es::{AggregateError, CqrsFramework, EventStore};
use ractor::{Actor, ActorProcessingErr, ActorRef};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};

/// Result of an accepted command: the case before and after it ran.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub before: Option<CaseRecord>,
    pub after: CaseRecord,
}

/// Messages that can be sent to the docket actor.
pub enum DocketMessage {
    /// Execute a command against one case and return the outcome (or error).
    Command(
        CaseId,
        Box<CaseCommand>,
        oneshot::Sender<Result<CommandOutcome, CaseError>>,
    ),
    /// Get one case from the directory.
    GetCase(CaseId, oneshot::Sender<Option<CaseRecord>>),
    /// Get a copy of the whole directory.
    GetDirectory(oneshot::Sender<CaseDirectory>),
}

/// Arguments for spawning a docket actor.
#[derive(Clone)]
pub struct DocketActorArgs {
    pub log_path: PathBuf,
    pub snapshots_dir: PathBuf,
    /// Snapshot after every N events of a case.
    pub snapshot_every: u64,
    /// Shared directory for projection.
    pub directory: Arc<RwLock<CaseDirectory>>,
    pub services: CaseServices,
}

/// State maintained by the docket actor.
pub struct DocketActorState {
    pub cqrs: CqrsFramework<CaseAggregate, FileEventStore>,
    /// Read handle on the same log the framework writes to.
    pub store: FileEventStore,
    pub log_path: PathBuf,
    pub directory: Arc<RwLock<CaseDirectory>>,
}

impl DocketActorState {
    /// Re-reads one case from the log and rebuilds its record when the log
    /// holds events the directory has not seen.
    async fn refresh_case(&self, case_id: CaseId) -> Result<Option<CaseRecord>, CaseError> {
        let events = self
            .store
            .load_events(&case_id.to_string())
            .await
            .map_err(map_aggregate_error)?;
        let stored = events.last().map(|envelope| envelope.sequence as u64);

        let mut directory = self.directory.write().await;
        let known = directory.get(case_id).map(|record| record.last_event_sequence);
        if stored != known {
            tracing::debug!(
                "Rebuilding case {} (directory at {:?}, log at {:?})",
                case_id,
                known,
                stored
            );
            directory.rebuild_case(case_id, &events);
        }
        Ok(directory.get(case_id).cloned())
    }
}

/// The docket actor.
pub struct DocketActor;

impl DocketActor {
    fn build_store(args: &DocketActorArgs) -> FileEventStore {
        FileEventStore::new(
            args.log_path.clone(),
            args.snapshots_dir.clone(),
            args.snapshot_every,
        )
    }

    /// Builds the CQRS framework from actor arguments.
    pub fn build_cqrs(args: &DocketActorArgs) -> CqrsFramework<CaseAggregate, FileEventStore> {
        let query = CaseDirectoryQuery::new(args.directory.clone());
        CqrsFramework::new(
            Self::build_store(args),
            vec![Box::new(query)],
            args.services.clone(),
        )
    }
}

#[async_trait]
impl Actor for DocketActor {
    type Msg = DocketMessage;
    type State = DocketActorState;
    type Arguments = DocketActorArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let cqrs = DocketActor::build_cqrs(&args);
        Ok(DocketActorState {
            cqrs,
            store: DocketActor::build_store(&args),
            log_path: args.log_path,
            directory: args.directory,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DocketMessage::Command(case_id, boxed_cmd, reply) => {
                let outcome = execute_command(state, case_id, *boxed_cmd).await;
                if reply.send(outcome).is_err() {
                    tracing::debug!("Command reply channel closed");
                }
            }
            DocketMessage::GetCase(case_id, reply) => {
                let record = match state.refresh_case(case_id).await {
                    Ok(record) => record,
                    Err(e) => {
                        tracing::warn!("Could not refresh case {}: {}", case_id, e);
                        state.directory.read().await.get(case_id).cloned()
                    }
                };
                if reply.send(record).is_err() {
                    tracing::debug!("GetCase reply channel closed");
                }
            }
            DocketMessage::GetDirectory(reply) => {
                let fresh = bootstrap_directory_from_events(&state.log_path);
                let directory = {
                    let mut shared = state.directory.write().await;
                    *shared = fresh;
                    shared.clone()
                };
                if reply.send(directory).is_err() {
                    tracing::debug!("GetDirectory reply channel closed");
                }
            }
        }

        Ok(())
    }
}

/// Runs one command with the case refreshed from the log before and after,
/// so the outcome reflects what is stored even when other processes write to
/// the same log.
async fn execute_command(
    state: &DocketActorState,
    case_id: CaseId,
    cmd: CaseCommand,
) -> Result<CommandOutcome, CaseError> {
    let name = cmd.name();
    let caller = cmd.actor().id.clone();

    let before = state.refresh_case(case_id).await?;
    let result = state.cqrs.execute(&case_id.to_string(), cmd).await;

    if let Err(err) = result {
        let err = map_aggregate_error(err);
        tracing::warn!(
            "{} on case {} from {} rejected: {}",
            name,
            case_id,
            caller,
            err
        );
        return Err(err);
    }

    tracing::info!("{} on case {} accepted from {}", name, case_id, caller);
    match state.refresh_case(case_id).await? {
        Some(after) => Ok(CommandOutcome { before, after }),
        None => Err(CaseError::StorageFailure {
            message: format!("case {} missing from the log after {}", case_id, name),
        }),
    }
}

fn map_aggregate_error(err: AggregateError<CaseError>) -> CaseError {
    match err {
        AggregateError::UserError(err) => err,
        AggregateError::AggregateConflict => CaseError::ConcurrencyConflict {
            message: "case was modified concurrently; reload and retry".to_string(),
        },
        other => CaseError::StorageFailure {
            message: other.to_string(),
        },
    }
}

/// Bootstraps a CaseDirectory by replaying every event in the log.
///
/// Returns an empty directory if the log file doesn't exist. Unparseable lines
/// are skipped with a warning.
pub fn bootstrap_directory_from_events(log_path: &Path) -> CaseDirectory {
    let mut directory = CaseDirectory::default();

    let file = match File::open(log_path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return directory,
        Err(e) => {
            tracing::warn!("Could not open event log {}: {}", log_path.display(), e);
            return directory;
        }
    };

    let mut skipped_lines = 0;
    for line in BufReader::new(file).lines().map_while(Result::ok) {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<StoredEvent>(&line) {
            Ok(stored) => {
                directory.apply_event(&stored.aggregate_id, &stored.event, stored.sequence)
            }
            Err(_) => skipped_lines += 1,
        }
    }

    if skipped_lines > 0 {
        tracing::warn!("Skipped {} unparseable lines in event log", skipped_lines);
    }

    directory
}

/// Builds actor arguments for a docket home, replaying the existing log.
pub fn create_actor_args(
    paths: &DocketPaths,
    snapshot_every: u64,
    services: CaseServices,
) -> DocketActorArgs {
    let log_path = paths.event_log_path();
    let initial = bootstrap_directory_from_events(&log_path);
    tracing::debug!(
        "Bootstrapped {} case(s) from {}",
        initial.len(),
        log_path.display()
    );

    DocketActorArgs {
        log_path,
        snapshots_dir: paths.snapshots_dir(),
        snapshot_every,
        directory: Arc::new(RwLock::new(initial)),
        services,
    }
}

#[cfg(test)]
#[path = "tests/actor_tests.rs"]
mod tests;
