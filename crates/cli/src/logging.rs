//! Logging setup
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `autoexec=info`)
//! - `AUTOEXEC_LOG_FORMAT`: `pretty` (default), `compact` or `json`
//! - `AUTOEXEC_LOG_DIR`: also write JSON logs to a daily rolling
//!   `autoexec.log` in this directory
//!
//! Logs go to stderr; stdout is reserved for the run summary.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "autoexec=info";
const LOG_FILE_NAME: &str = "autoexec.log";

/// Keeps the background log writer alive; drop it last
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber
pub fn init_logging() -> Result<LogGuard> {
    let log_format =
        std::env::var("AUTOEXEC_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    let (file_layer, file_guard) = match std::env::var("AUTOEXEC_LOG_DIR") {
        Ok(dir) => {
            let dir = shellexpand::tilde(&dir).into_owned();
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir))?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    match log_format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        "compact" => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
        _ => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")?;

    Ok(LogGuard { _file: file_guard })
}
