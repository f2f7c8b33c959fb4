//! Logging setup for ModMail using tracing.
//!
//! Two sinks: human-readable lines on stderr and JSON lines in a daily
//! rolling file, so a ticket can be traced after the fact by user or channel
//! id.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;

/// Serenity is chatty at info.
pub const DEFAULT_FILTER: &str = "info,modmail=debug,serenity=warn";

const LOG_FILE_PREFIX: &str = "modmail.log";

/// Install the global subscriber.
///
/// Returns the file writer's guard and the directory logs go to. Dropping
/// the guard stops flushing, so `main` holds it until exit.
pub fn init(settings: &LoggingSettings) -> Result<(WorkerGuard, PathBuf)> {
    let log_dir = match &settings.directory {
        Some(dir) => dir.clone(),
        None => default_log_dir()?,
    };
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let directives = filter_directives(
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
        settings.filter.as_deref(),
    );
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter {:?}", directives))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_current_span(false),
        )
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init()?;

    tracing::info!(dir = %log_dir.display(), filter = %directives, "logging initialized");
    Ok((guard, log_dir))
}

/// Pick the filter: `RUST_LOG`, then the settings file, then the default.
fn filter_directives(from_env: Option<String>, configured: Option<&str>) -> String {
    from_env
        .filter(|v| !v.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn default_log_dir() -> Result<PathBuf> {
    directories::ProjectDirs::from("com", "modmail", "modmail")
        .map(|dirs| dirs.data_dir().join("logs"))
        .context("could not determine a data directory for logs")
}

/// Console-only subscriber for tests. Later calls are no-ops.
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with(fmt::layer().with_test_writer())
        .try_init();
}
