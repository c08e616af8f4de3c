//! Logging infrastructure for tally.
//!
//! Structured logging using the `tracing` ecosystem.
//!
//! ## Features
//!
//! - JSON lines format for machine parsing
//! - File output to `~/.tally/logs/tally.log` (rolled daily)
//! - Console output with configurable verbosity
//!
//! ## Example
//!
//! ```no_run
//! use tally_core::logging;
//!
//! // Initialize logging (call once at startup)
//! let _guard = logging::init_logging(None, false).expect("logging init");
//!
//! tracing::info!("tally started");
//! tracing::debug!(path = "session.jsonl", "parsing transcript");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{Result, TallyError};

/// Guard that must be held to ensure log flushing on shutdown.
///
/// Dropping it flushes pending file log entries.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the tally logging system.
///
/// This sets up:
/// - File logging to `<log_dir>/tally.log` (JSON lines format)
/// - Console logging to stderr (human-readable format)
///
/// `RUST_LOG` takes precedence over `verbose` when set.
///
/// # Arguments
///
/// * `log_dir` - Directory for log files, `~/.tally/logs/` when `None`
/// * `verbose` - Raise the default level from `info` to `debug`
///
/// # Returns
///
/// A [`LogGuard`] that must be held for the lifetime of the program. Fails
/// if the log directory cannot be created or a global subscriber is already
/// installed.
///
/// # Example
///
/// ```no_run
/// use tally_core::init_logging;
///
/// let _guard = init_logging(Some("/tmp/tally-logs".into()), true)?;
/// tracing::debug!("verbose logging enabled");
/// # Ok::<(), tally_core::TallyError>(())
/// ```
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };

    std::fs::create_dir_all(&log_dir).map_err(|e| TallyError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "tally.log");
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("tally={default_level},tally_stats={default_level}"))
    });

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| TallyError::internal(format!("logging already initialized: {e}")))?;

    tracing::debug!(log_dir = %log_dir.display(), verbose, "logging initialized");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

/// Get the tally home directory (`~/.tally`).
pub fn tally_home() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".tally"))
        .ok_or_else(|| TallyError::internal("could not determine home directory"))
}

/// Get the default log directory path.
///
/// Returns `~/.tally/logs/`
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(tally_home()?.join("logs"))
}
