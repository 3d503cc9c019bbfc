use crate::app::desk::{OpenCaseRequest, SessionDesk};
use crate::config::DocketConfig;
use crate::docket_paths::DocketPaths;
use crate::domain::access::Actor;
use crate::domain::actor::{create_actor_args, DocketActor};
use crate::domain::lifecycle::{
    ApprovalRequest, CompletionRequest, MemorandumDecision, MemorandumUpload, ReviewRequest,
    SessionUpdate,
};
use crate::domain::services::CaseServices;
use crate::domain::session::{MemorandumStatus, SessionDetails, SessionOutcome, SessionStatus};
use crate::domain::types::{CaseId, DocumentUrl, SessionId, TimestampUtc, UserId};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ractor::Actor as _;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docket")]
#[command(about = "Court-session approval workflow for legal cases")]
#[command(version, long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("DOCKET_GIT_SHA"), ")"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: <home>/docket.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Docket home directory (overrides DOCKET_HOME)
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Act as this configured user
    #[arg(long = "as", global = true, value_name = "USER")]
    pub as_user: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open, archive or show cases
    #[command(subcommand)]
    Case(CaseCommandArgs),

    /// Manage court sessions of a case
    #[command(subcommand)]
    Session(SessionCommandArgs),

    /// Per-role worklists
    #[command(subcommand)]
    Worklist(WorklistCommandArgs),
}

#[derive(Subcommand)]
pub enum CaseCommandArgs {
    /// Open a new case; the caller becomes its secretary
    Open {
        #[arg(long)]
        number: String,
        #[arg(long)]
        client: String,
        #[arg(long = "type", default_value = "general")]
        case_type: String,
        /// Assigned (draft) lawyer
        #[arg(long)]
        lawyer: Option<String>,
        /// Approving lawyer
        #[arg(long)]
        approver: Option<String>,
    },
    Archive {
        #[arg(value_parser = parse_case_id)]
        case_id: CaseId,
    },
    Show {
        #[arg(value_parser = parse_case_id)]
        case_id: CaseId,
    },
}

/// Case and session addressed by a session command.
#[derive(Args)]
pub struct SessionRef {
    #[arg(value_parser = parse_case_id)]
    pub case_id: CaseId,
    #[arg(value_parser = parse_session_id)]
    pub session_id: SessionId,
}

#[derive(Args)]
pub struct DetailsArgs {
    /// RFC 3339 date-time
    #[arg(long, value_parser = parse_timestamp)]
    pub scheduled_for: Option<TimestampUtc>,
    #[arg(long)]
    pub court: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Subcommand)]
pub enum SessionCommandArgs {
    Create {
        #[arg(value_parser = parse_case_id)]
        case_id: CaseId,
        #[command(flatten)]
        details: DetailsArgs,
    },
    List {
        #[arg(value_parser = parse_case_id)]
        case_id: CaseId,
    },
    Update {
        #[command(flatten)]
        target: SessionRef,
        #[command(flatten)]
        details: DetailsArgs,
        /// UPCOMING or IN_PROGRESS
        #[arg(long)]
        status: Option<SessionStatus>,
    },
    Delete {
        #[command(flatten)]
        target: SessionRef,
    },
    /// Record the approving lawyer's requirements
    Review {
        #[command(flatten)]
        target: SessionRef,
        #[arg(long)]
        memorandum_required: bool,
        #[arg(long)]
        supporting_documents_required: bool,
        #[arg(long)]
        notes: Option<String>,
    },
    UploadMemorandum {
        #[command(flatten)]
        target: SessionRef,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        file_url: Option<String>,
    },
    ReviewMemorandum {
        #[command(flatten)]
        target: SessionRef,
        /// APPROVED or REJECTED
        #[arg(long)]
        status: MemorandumStatus,
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Director sign-off
    Approve {
        #[command(flatten)]
        target: SessionRef,
        #[arg(long)]
        signature_url: Option<String>,
        /// Additional document URL (repeatable)
        #[arg(long = "document")]
        documents: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Complete {
        #[command(flatten)]
        target: SessionRef,
        /// COMPLETED or CANCELLED
        #[arg(long)]
        status: SessionStatus,
        #[arg(long)]
        outcome: Option<SessionOutcome>,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long, value_parser = parse_timestamp)]
        next_session_date: Option<TimestampUtc>,
    },
}

#[derive(Subcommand)]
pub enum WorklistCommandArgs {
    /// Sessions awaiting director sign-off
    Pending,
    /// Sessions the caller can act on as assigned lawyer
    Mine,
}

fn parse_case_id(s: &str) -> Result<CaseId, String> {
    CaseId::from_string(s).map_err(|e| format!("invalid case id: {}", e))
}

fn parse_session_id(s: &str) -> Result<SessionId, String> {
    SessionId::from_string(s).map_err(|e| format!("invalid session id: {}", e))
}

fn parse_timestamp(s: &str) -> Result<TimestampUtc, String> {
    TimestampUtc::parse_rfc3339(s).map_err(|e| format!("invalid RFC 3339 timestamp: {}", e))
}

impl From<DetailsArgs> for SessionDetails {
    fn from(args: DetailsArgs) -> Self {
        Self {
            scheduled_for: args.scheduled_for,
            court: args.court,
            description: args.description,
        }
    }
}

/// Loads config, resolves the caller and the docket home, and starts the actor.
pub async fn run(cli: Cli) -> Result<Value> {
    let bootstrap_paths = DocketPaths::resolve(cli.home.as_deref(), None)?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| bootstrap_paths.config_path());
    let config = DocketConfig::load_or_default(&config_path)?;
    let paths = DocketPaths::resolve(cli.home.as_deref(), config.storage.home.as_deref())?;

    let user = cli
        .as_user
        .as_deref()
        .context("No caller given; pass --as <user>")?;
    let caller = config.identity(user)?;

    let services = CaseServices::with_policy(config.workflow.clone());
    let args = create_actor_args(&paths, config.storage.snapshot_every, services);
    let (actor_ref, handle) = DocketActor::spawn(None, DocketActor, args)
        .await
        .context("Failed to start docket actor")?;

    let desk = SessionDesk::new(actor_ref.clone());
    let result = dispatch(&desk, &caller, cli.command).await;

    actor_ref.stop(None);
    if let Err(e) = handle.await {
        tracing::warn!("Docket actor did not shut down cleanly: {}", e);
    }
    result
}

async fn dispatch(desk: &SessionDesk, caller: &Actor, command: Command) -> Result<Value> {
    let value = match command {
        Command::Case(cmd) => match cmd {
            CaseCommandArgs::Open {
                number,
                client,
                case_type,
                lawyer,
                approver,
            } => {
                let request = OpenCaseRequest {
                    case_number: number.into(),
                    client,
                    case_type,
                    assigned_lawyer: lawyer.map(UserId::from),
                    approving_lawyer: approver.map(UserId::from),
                };
                serde_json::to_value(desk.open_case(caller, request).await?)?
            }
            CaseCommandArgs::Archive { case_id } => {
                serde_json::to_value(desk.archive_case(caller, case_id).await?)?
            }
            CaseCommandArgs::Show { case_id } => {
                serde_json::to_value(desk.get_case(caller, case_id).await?)?
            }
        },
        Command::Session(cmd) => dispatch_session(desk, caller, cmd).await?,
        Command::Worklist(cmd) => match cmd {
            WorklistCommandArgs::Pending => {
                serde_json::to_value(desk.get_pending_sessions(caller).await?)?
            }
            WorklistCommandArgs::Mine => {
                serde_json::to_value(desk.get_my_assigned_sessions(caller).await?)?
            }
        },
    };
    Ok(value)
}

async fn dispatch_session(
    desk: &SessionDesk,
    caller: &Actor,
    command: SessionCommandArgs,
) -> Result<Value> {
    let session = match command {
        SessionCommandArgs::List { case_id } => {
            return Ok(serde_json::to_value(
                desk.get_sessions(caller, case_id).await?,
            )?);
        }
        SessionCommandArgs::Create { case_id, details } => {
            desk.create_session(caller, case_id, details.into()).await?
        }
        SessionCommandArgs::Update {
            target,
            details,
            status,
        } => {
            let update = SessionUpdate {
                scheduled_for: details.scheduled_for,
                court: details.court,
                description: details.description,
                status,
            };
            desk.update_session(caller, target.case_id, target.session_id, update)
                .await?
        }
        SessionCommandArgs::Delete { target } => {
            desk.delete_session(caller, target.case_id, target.session_id)
                .await?
        }
        SessionCommandArgs::Review {
            target,
            memorandum_required,
            supporting_documents_required,
            notes,
        } => {
            let review = ReviewRequest {
                memorandum_required,
                supporting_documents_required,
                notes,
            };
            desk.review_session(caller, target.case_id, target.session_id, review)
                .await?
        }
        SessionCommandArgs::UploadMemorandum {
            target,
            content,
            file_url,
        } => {
            let upload = MemorandumUpload {
                content,
                file_url: file_url.map(DocumentUrl::from),
            };
            desk.upload_session_memorandum(caller, target.case_id, target.session_id, upload)
                .await?
        }
        SessionCommandArgs::ReviewMemorandum {
            target,
            status,
            feedback,
        } => {
            let decision = MemorandumDecision { status, feedback };
            desk.review_memorandum(caller, target.case_id, target.session_id, decision)
                .await?
        }
        SessionCommandArgs::Approve {
            target,
            signature_url,
            documents,
            notes,
        } => {
            let approval = ApprovalRequest {
                signature_url: signature_url.map(DocumentUrl::from),
                additional_documents: documents.into_iter().map(DocumentUrl::from).collect(),
                notes,
            };
            desk.approve_session_for_submission(caller, target.case_id, target.session_id, approval)
                .await?
        }
        SessionCommandArgs::Complete {
            target,
            status,
            outcome,
            reason,
            next_session_date,
        } => {
            let completion = CompletionRequest {
                status,
                outcome,
                reason_for_adjournment: reason,
                next_session_date,
            };
            desk.complete_session(caller, target.case_id, target.session_id, completion)
                .await?
        }
    };
    Ok(serde_json::to_value(session)?)
}

#[cfg(test)]
#[path = "tests/cli_tests.rs"]
mod tests;
