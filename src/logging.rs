//! Subscriber setup for hosts that do not install their own.
//!
//! Stdout always; a daily rolling `recommender.log` under
//! [`RecommenderConfig::log_dir`] when [`RecommenderConfig::file_logs`] is on.

use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::RecommenderConfig;

const LOG_FILE_PREFIX: &str = "recommender.log";

/// Keeps the non-blocking file writer alive; drop it on shutdown to flush
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

#[derive(Debug, Error)]
pub enum LogSetupError {
    #[error("failed to create log directory: {0}")]
    Directory(#[from] std::io::Error),
    #[error("failed to open log file: {0}")]
    Appender(#[from] InitError),
}

/// Non-blocking writer for the daily rolling log file in `dir`
pub fn open_log_writer(dir: &Path) -> Result<(NonBlocking, WorkerGuard), LogSetupError> {
    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber described by `config`.
///
/// A second call is a no-op, so tests and embedding hosts that already
/// installed one are left alone. An unusable log directory falls back to
/// stdout only.
pub fn init_from_config(config: &RecommenderConfig) -> Option<FileLogGuard> {
    let log_dir = config.file_logs.then(|| Path::new(&config.log_dir));
    init_tracing(&config.log_level, log_dir)
}

pub fn init_tracing(log_level: &str, log_dir: Option<&Path>) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir.map(open_log_writer) {
        Some(Ok((writer, guard))) => {
            let layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(true);
            (Some(layer), Some(guard))
        }
        Some(Err(err)) => {
            eprintln!("file logging disabled: {err}");
            (None, None)
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .is_ok();

    guard
        .filter(|_| installed)
        .map(|guard| FileLogGuard { _guard: guard })
}
