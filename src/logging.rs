//! Tracing setup: a daily log file next to stderr output.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

pub const LOG_FILE: &str = "transmission-telegram.log";

const DEFAULT_FILTER: &str = "info,transmission_telegram=debug";

/// Owns the background file writer. Buffered lines are flushed on drop.
pub struct LogGuard {
    _worker: WorkerGuard,
    pub directory: PathBuf,
}

/// Install the global subscriber. Call once, before the bot starts.
pub fn init(config: &LoggingConfig) -> Result<LogGuard> {
    let directory = log_directory(config)?;
    std::fs::create_dir_all(&directory)
        .with_context(|| format!("Could not create log directory {}", directory.display()))?;

    let appender = tracing_appender::rolling::daily(&directory, LOG_FILE);
    let (writer, worker) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter(config.level.as_deref())?)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init()?;

    tracing::info!(directory = %directory.display(), "Logging initialized");

    Ok(LogGuard {
        _worker: worker,
        directory,
    })
}

/// `RUST_LOG` wins; otherwise the configured level, otherwise the default.
fn env_filter(level: Option<&str>) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = level.unwrap_or(DEFAULT_FILTER);
    EnvFilter::try_new(directives).with_context(|| format!("Invalid log level '{}'", directives))
}

fn log_directory(config: &LoggingConfig) -> Result<PathBuf> {
    if let Some(dir) = &config.directory {
        return Ok(dir.clone());
    }
    let dirs = directories::ProjectDirs::from("com", "transmission-telegram", "transmission-telegram")
        .context("Could not determine a data directory for logs")?;
    Ok(dirs.data_dir().join("logs"))
}
