use std::process::ExitCode;

use clap::Parser;
use serde_json::json;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use docket::app::cli::{run, Cli};
use docket::domain::CaseError;

/// Environment variable holding the log filter (e.g. `docket=debug`).
const LOG_ENV: &str = "DOCKET_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(value) => {
            print_json(&value);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let body = match e.downcast_ref::<CaseError>() {
                Some(err) => json!({ "error": err.code(), "message": err.message() }),
                None => json!({ "error": "CONFIG_ERROR", "message": format!("{:#}", e) }),
            };
            print_json(&body);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to render output: {}", e),
    }
}
