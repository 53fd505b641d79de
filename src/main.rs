//! CLI entry point for the curly tool.

use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use curly_core::{TransferError, TransferOutcome, TransferSession, Watchdog};
use tracing::{debug, error};

mod cli;
mod exit_handler;
mod terminal;

use cli::Args;

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Transfer completed.
    Success,
    /// Transport or other runtime failure.
    Failure,
    /// Invalid input detected before or while building the request.
    Configuration,
    /// `--max-time` expired (curl's operation-timeout code).
    Timeout,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Configuration => 2,
            Self::Timeout => 28,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let Some(target) = args.url.clone() else {
        let _ = Args::command().print_help();
        return ProcessExit::Success.into();
    };

    let default_level = terminal::resolve_default_log_level(args.verbose, args.silent);
    terminal::init_tracing(default_level, args.silent);
    debug!(?args, "CLI arguments parsed");

    let watchdog = Watchdog::start(args.max_time);
    let _backstop = watchdog.spawn_backstop(|seconds| {
        error!(seconds, "maximum operation time expired while the transfer was blocked");
        exit_handler::exit_on_timeout(seconds);
    });

    match watchdog.guard(run(&args, &target)).await {
        Ok(outcome) => {
            debug!(status = %outcome.status, "exiting after successful transfer");
            ProcessExit::Success.into()
        }
        Err(error) => {
            if let Some(TransferError::MaxTimeExpired { seconds }) = error.downcast_ref() {
                exit_handler::exit_on_timeout(*seconds);
            }
            eprintln!("curly: {error}");
            exit_handler::determine_exit_outcome(&error).into()
        }
    }
}

async fn run(args: &Args, target: &str) -> Result<TransferOutcome> {
    let config = args.to_config(target)?;
    let session = TransferSession::new(&config).await?;
    let outcome = session.execute(&config).await?;
    Ok(outcome)
}
