//! File-based event store for case event sourcing.
//!
//! This module provides a JSONL-based event store with per-case snapshot
//! support for the CQRS/ES case aggregate.

pub mod file_store;

pub use file_store::{FileAggregateContext, FileEventStore, StoredEvent, StoredSnapshot};
