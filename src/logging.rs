//! Log routing for the server and the command-line tool.
//!
//! The server writes compact lines to stdout and mirrors them, without ANSI colours, into a log
//! file: `POLICY_QA_LOG_FILE` when set, `logs/policy-qa.log` otherwise. The CLI writes to stderr
//! only so its JSON output on stdout stays clean.
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_ENV: &str = "POLICY_QA_LOG_FILE";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_NAME: &str = "policy-qa.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where the server mirrors its log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LogFile {
    /// Operator-chosen file, opened in append mode.
    Explicit(PathBuf),
    /// `logs/policy-qa.log` under the working directory.
    Default,
}

impl LogFile {
    fn from_env_value(value: Option<String>) -> Self {
        match value {
            Some(path) if !path.trim().is_empty() => Self::Explicit(PathBuf::from(path)),
            _ => Self::Default,
        }
    }

    fn open(&self) -> std::io::Result<NonBlocking> {
        let (writer, guard) = match self {
            Self::Explicit(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                tracing_appender::non_blocking(file)
            }
            Self::Default => {
                std::fs::create_dir_all(DEFAULT_LOG_DIR)?;
                tracing_appender::non_blocking(tracing_appender::rolling::never(
                    DEFAULT_LOG_DIR,
                    DEFAULT_LOG_NAME,
                ))
            }
        };
        let _ = LOG_GUARD.set(guard);
        Ok(writer)
    }
}

fn filter_or(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the server subscriber. `RUST_LOG` overrides the default `info` level.
///
/// A log file that cannot be opened is reported on stderr and the server keeps logging to stdout.
pub fn init_tracing() {
    let registry = tracing_subscriber::registry()
        .with(filter_or("info"))
        .with(fmt::layer().with_target(false).compact());

    let target = LogFile::from_env_value(std::env::var(LOG_FILE_ENV).ok());
    match target.open() {
        Ok(writer) => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_ansi(false)
                    .compact(),
            )
            .init(),
        Err(err) => {
            eprintln!("Log file {target:?} unavailable, logging to stdout only: {err}");
            registry.init();
        }
    }
}

/// Stderr-only subscriber for the command-line tool, defaulting to `warn`.
pub fn init_cli_tracing() {
    tracing_subscriber::registry()
        .with(filter_or("warn"))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
