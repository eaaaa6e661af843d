use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Overrides the configured level, e.g. `THREADVIEW_LOG=threadview=trace`.
pub const LOG_ENV: &str = "THREADVIEW_LOG";
pub const LOG_FILE_NAME: &str = "threadview.log";

/// Install the global subscriber.
///
/// The terminal belongs to the UI, so events go to a file only. The returned
/// guard flushes the background writer on drop and must be held until exit.
pub fn init(cfg: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    if !cfg.enabled {
        return Ok(None);
    }

    let dir = cfg
        .dir
        .clone()
        .or_else(default_log_dir)
        .context("logging: unable to determine log directory")?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("logging: failed to create directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(&dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("logging: failed to install subscriber")?;

    Ok(Some(guard))
}

pub fn default_log_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("threadview").join("logs"))
}
