//! Domain model for the event-sourced court-session workflow.
//!
//! A case is the aggregate; its sessions move through review, memorandum
//! drafting, director sign-off and completion.
//!
//! # Architecture
//!
//! - **Access** (`access.rs`): who may perform which action on a case
//! - **Lifecycle** (`lifecycle.rs`): pure session transition rules
//! - **Commands** / **Events** (`cqrs/`): intent and facts
//! - **Aggregate** (`cqrs/mod.rs`): authorization, checks, event application
//! - **View** (`view.rs`) and **Worklists** (`worklist.rs`): read side
//!
//! # Usage
//!
//! ```ignore
//! use crate::domain::{CaseCommand, DocketMessage};
//!
//! // Commands are dispatched through the actor
//! actor_ref.send_message(DocketMessage::Command(case_id, Box::new(cmd), reply_tx))?;
//!
//! // Events are applied to rebuild state
//! for event in events {
//!     directory.apply_event(aggregate_id, &event, sequence);
//! }
//! ```

pub mod access;
pub mod actor;
pub mod case;
pub mod cqrs;
pub mod errors;
pub mod lifecycle;
pub mod services;
pub mod session;
pub mod types;
pub mod view;
pub mod worklist;

// Re-export CQRS types
pub use cqrs::*;

pub use access::{can_act, Actor, CaseRoles, Role, SessionAction};
pub use actor::{
    bootstrap_directory_from_events, create_actor_args, CommandOutcome, DocketActor,
    DocketActorArgs, DocketMessage,
};
pub use case::Case;
pub use errors::CaseError;
pub use services::{CaseClock, CaseServices, WorkflowPolicy};
pub use session::{
    DirectorApproval, Memorandum, MemorandumStatus, Session, SessionDetails, SessionOutcome,
    SessionStatus,
};
pub use types::{CaseId, CaseNumber, DocumentUrl, SessionId, SessionNumber, TimestampUtc, UserId};
pub use view::{CaseDirectory, CaseRecord};
pub use worklist::{
    assigned_sessions_for_draft_lawyer, pending_sessions_for_director, CaseSummary,
    SessionWorkItem,
};
