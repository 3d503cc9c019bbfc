//! Court-session approval workflow for a legal case docket.
//!
//! Cases are event-sourced aggregates persisted to a JSONL log; sessions move
//! through secretary scheduling, lawyer review, memorandum drafting, director
//! sign-off and completion.

pub mod app;
pub mod config;
pub mod docket_paths;
pub mod domain;
pub mod event_store;
