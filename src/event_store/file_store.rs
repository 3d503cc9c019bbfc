//! File-based event store implementation.
//!
//! All cases share one JSONL log (one JSON object per line); each case gets its
//! own snapshot file. Supports:
//! - Optimistic concurrency via file locking and a per-case sequence check
//! - Snapshots for faster aggregate loading
//! - Atomic snapshot writes via temp file + rename

use crate::domain::errors::CaseError;
use crate::domain::types::TimestampUtc;
use crate::domain::{CaseAggregate, CaseEvent};
use async_trait::async_trait;
use cqrs_es::{
    Aggregate, AggregateContext, AggregateError, DomainEvent, EventEnvelope, EventStore,
};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

type StoreResult<T> = Result<T, AggregateError<CaseError>>;

fn io_err(e: std::io::Error) -> AggregateError<CaseError> {
    AggregateError::UnexpectedError(Box::new(e))
}

/// A stored event record in the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub aggregate_id: String,
    pub sequence: u64,
    pub recorded_at: TimestampUtc,
    pub event_type: String,
    pub event_version: String,
    pub event: CaseEvent,
    pub metadata: HashMap<String, String>,
}

/// A stored snapshot of one case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub aggregate_id: String,
    pub sequence: u64,
    pub snapshot_at: TimestampUtc,
    pub state: CaseAggregate,
}

/// File-based event store configuration.
#[derive(Debug, Clone)]
pub struct FileEventStore {
    /// Path to the shared JSONL event log.
    pub log_path: PathBuf,
    /// Directory holding `<case-id>.json` snapshots.
    pub snapshots_dir: PathBuf,
    /// Snapshot after every N events of a case (0 = disabled).
    pub snapshot_every: u64,
}

/// Aggregate context for file-based storage.
pub struct FileAggregateContext<A: Aggregate> {
    pub aggregate_id: String,
    pub aggregate: A,
    /// The current sequence number (last applied event).
    pub current_sequence: u64,
}

impl<A: Aggregate> AggregateContext<A> for FileAggregateContext<A> {
    fn aggregate(&self) -> &A {
        &self.aggregate
    }
}

impl FileEventStore {
    pub fn new(log_path: PathBuf, snapshots_dir: PathBuf, snapshot_every: u64) -> Self {
        Self {
            log_path,
            snapshots_dir,
            snapshot_every,
        }
    }

    /// Snapshot file for one case.
    pub fn snapshot_path(&self, aggregate_id: &str) -> PathBuf {
        self.snapshots_dir.join(format!("{}.json", aggregate_id))
    }
}

#[async_trait]
impl EventStore<CaseAggregate> for FileEventStore {
    type AC = FileAggregateContext<CaseAggregate>;

    async fn load_events(&self, aggregate_id: &str) -> StoreResult<Vec<EventEnvelope<CaseAggregate>>> {
        let file = match File::open(&self.log_path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e)),
        };
        file.lock_shared().map_err(io_err)?;

        let mut envelopes = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            let Some(stored) = parse_line(&line, aggregate_id)? else {
                continue;
            };
            if stored.aggregate_id != aggregate_id {
                continue;
            }

            if stored.event_type != stored.event.event_type()
                || stored.event_version != stored.event.event_version()
            {
                return Err(io_err(std::io::Error::new(
                    ErrorKind::InvalidData,
                    format!(
                        "event {} of {} has mismatched type/version",
                        stored.sequence, aggregate_id
                    ),
                )));
            }

            envelopes.push(EventEnvelope {
                aggregate_id: stored.aggregate_id,
                sequence: stored.sequence as usize,
                payload: stored.event,
                metadata: stored.metadata,
            });
        }

        Ok(envelopes)
    }

    async fn load_aggregate(&self, aggregate_id: &str) -> StoreResult<Self::AC> {
        let mut aggregate = CaseAggregate::default();
        let mut current_sequence = 0u64;

        if let Some(snapshot) = load_snapshot(&self.snapshot_path(aggregate_id))? {
            if snapshot.aggregate_id == aggregate_id {
                aggregate = snapshot.state;
                current_sequence = snapshot.sequence;
            }
        }

        for event in self.load_events(aggregate_id).await? {
            let seq = event.sequence as u64;
            if seq > current_sequence {
                current_sequence = seq;
                aggregate.apply(event.payload);
            }
        }

        Ok(FileAggregateContext {
            aggregate_id: aggregate_id.to_string(),
            aggregate,
            current_sequence,
        })
    }

    async fn commit(
        &self,
        events: Vec<CaseEvent>,
        context: Self::AC,
        metadata: HashMap<String, String>,
    ) -> StoreResult<Vec<EventEnvelope<CaseAggregate>>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.log_path)
            .map_err(io_err)?;
        file.lock_exclusive().map_err(io_err)?;

        let FileAggregateContext {
            aggregate_id,
            mut aggregate,
            current_sequence,
        } = context;

        terminate_torn_line(&mut file)?;
        let last_sequence = read_last_sequence(&file, &aggregate_id)?;
        if last_sequence != current_sequence {
            tracing::warn!(
                "Case {} moved from sequence {} to {} underneath this writer",
                aggregate_id,
                current_sequence,
                last_sequence
            );
            return Err(AggregateError::AggregateConflict);
        }

        let mut sequence = current_sequence;
        let mut envelopes: Vec<EventEnvelope<CaseAggregate>> = Vec::with_capacity(events.len());

        for event in events {
            sequence += 1;
            let record = StoredEvent {
                aggregate_id: aggregate_id.clone(),
                sequence,
                recorded_at: TimestampUtc::now(),
                event_type: event.event_type(),
                event_version: event.event_version(),
                event: event.clone(),
                metadata: metadata.clone(),
            };
            let line = serde_json::to_string(&record)
                .map_err(|e| AggregateError::UnexpectedError(Box::new(e)))?;
            writeln!(file, "{}", line).map_err(io_err)?;

            envelopes.push(EventEnvelope {
                aggregate_id: aggregate_id.clone(),
                sequence: sequence as usize,
                payload: event,
                metadata: metadata.clone(),
            });
        }

        file.flush().map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        tracing::debug!(
            "Committed {} event(s) for case {} up to sequence {}",
            envelopes.len(),
            aggregate_id,
            sequence
        );

        // Crossing a multiple of snapshot_every triggers a snapshot, even when
        // one commit writes several events.
        if crosses_snapshot_boundary(current_sequence, sequence, self.snapshot_every) {
            for envelope in &envelopes {
                aggregate.apply(envelope.payload.clone());
            }
            let path = self.snapshot_path(&aggregate_id);
            let snapshot = StoredSnapshot {
                aggregate_id,
                sequence,
                snapshot_at: TimestampUtc::now(),
                state: aggregate,
            };
            save_snapshot(&path, &snapshot)?;
        }

        Ok(envelopes)
    }
}

fn load_snapshot(path: &Path) -> StoreResult<Option<StoredSnapshot>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(e)),
    };

    let snapshot: StoredSnapshot = serde_json::from_str(&content)
        .map_err(|e| AggregateError::DeserializationError(Box::new(e)))?;
    Ok(Some(snapshot))
}

fn save_snapshot(path: &Path, snapshot: &StoredSnapshot) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let content = serde_json::to_string(snapshot)
        .map_err(|e| AggregateError::UnexpectedError(Box::new(e)))?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, content).map_err(io_err)?;
    std::fs::rename(&tmp_path, path).map_err(io_err)?;
    Ok(())
}

/// Just enough of a log line to tell which case it belongs to.
#[derive(Deserialize)]
struct LineHeader {
    aggregate_id: String,
}

/// Parses one log line. A line that cannot be parsed is skipped unless it
/// still names `aggregate_id`, in which case that case's history is unreadable.
fn parse_line(line: &str, aggregate_id: &str) -> StoreResult<Option<StoredEvent>> {
    match serde_json::from_str::<StoredEvent>(line) {
        Ok(stored) => Ok(Some(stored)),
        Err(e) => match serde_json::from_str::<LineHeader>(line) {
            Ok(header) if header.aggregate_id == aggregate_id => {
                Err(AggregateError::DeserializationError(Box::new(e)))
            }
            _ => {
                tracing::warn!("Skipping unparseable event log line: {}", e);
                Ok(None)
            }
        },
    }
}

/// Ends a partial last line (left by an interrupted write) so the next
/// appended record starts on a line of its own.
fn terminate_torn_line(file: &mut File) -> StoreResult<()> {
    let len = file.metadata().map_err(io_err)?.len();
    if len == 0 {
        return Ok(());
    }
    file.seek(SeekFrom::Start(len - 1)).map_err(io_err)?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).map_err(io_err)?;
    if last[0] != b'\n' {
        tracing::warn!("Event log ends with a partial line; terminating it");
        writeln!(file).map_err(io_err)?;
    }
    Ok(())
}

/// Reads the last sequence recorded for an aggregate in the (locked) log file.
fn read_last_sequence(file: &File, aggregate_id: &str) -> StoreResult<u64> {
    let mut reader = BufReader::new(file.try_clone().map_err(io_err)?);
    reader.seek(SeekFrom::Start(0)).map_err(io_err)?;

    let mut last_sequence = 0u64;
    for line in reader.lines() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(stored) = parse_line(&line, aggregate_id)? else {
            continue;
        };
        if stored.aggregate_id == aggregate_id {
            last_sequence = stored.sequence;
        }
    }

    Ok(last_sequence)
}

/// True when some multiple of `snapshot_every` lies in `(from, to]`.
fn crosses_snapshot_boundary(from: u64, to: u64, snapshot_every: u64) -> bool {
    if snapshot_every == 0 {
        return false;
    }
    to / snapshot_every > from / snapshot_every
}

#[cfg(test)]
#[path = "tests/file_store_tests.rs"]
mod tests;
