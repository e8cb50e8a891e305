//! SkillTrainer CLI - command-line access to the interview-preparation platform.
//!
//! Logs in against the REST backend, keeps the credential pair in the
//! configured token store, and lists or manages interviews and resumes.

mod commands;
mod format;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use skilltrainer_core::auth::{LoginRedirect, Session};
use skilltrainer_core::{ApiClient, Config};

use commands::Command;

/// Directory for rolling log files; logs go to stderr when unset
const ENV_LOG_DIR: &str = "SKILLTRAINER_LOG_DIR";

/// Log file prefix inside the log directory
const LOG_FILE_PREFIX: &str = "skilltrainer.log";

/// Initialize the tracing subscriber for logging.
/// The returned guard must live until exit so buffered file logs are flushed.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    match std::env::var(ENV_LOG_DIR) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        _ => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

/// Terminal stand-in for navigating to the login page
struct TerminalRedirect;

impl LoginRedirect for TerminalRedirect {
    fn redirect(&self, login_path: &str) {
        info!(login_path = login_path, "Redirecting to login");
        eprintln!("Your session has ended. Run `skilltrainer login` to sign in again.");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            commands::print_usage();
            drop(log_guard);
            std::process::exit(2);
        }
    };
    if command == Command::Help {
        commands::print_usage();
        return Ok(());
    }

    let mut config = Config::load()?;
    let store = config.build_token_store()?;
    let session = Arc::new(Session::new(store, Arc::new(TerminalRedirect), config.login_path.clone()));
    let api = ApiClient::new(&config, session)?;

    info!(command = ?command, base_url = %config.api_base_url, "SkillTrainer CLI starting");

    let result = commands::run(command, &api, &mut config).await;
    info!("SkillTrainer CLI shutting down");
    drop(log_guard);

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
