use std::path::Path;

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Rotated files kept on disk: the live one plus a week of backups.
const MAX_LOG_FILES: usize = 8;

/// Keeps the background log writers alive; drop it only at exit so buffered
/// lines reach the files.
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// Changes the global level after logging has been installed.
#[derive(Clone)]
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
}

impl LogHandle {
    pub fn set_level(&self, level: LevelFilter) -> Result<()> {
        self.filter
            .reload(build_filter(level))
            .context("Failed to update log level")
    }
}

/// `RUST_LOG` wins when set; otherwise `level` applies, with the HTTP stack
/// held back to warnings.
fn build_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(level.into())
            .parse_lossy("hyper=warn,hyper_util=warn,reqwest=warn")
    })
}

fn daily_file(logs_dir: &Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(logs_dir)
        .with_context(|| format!("Failed to open {} log in {}", prefix, logs_dir.display()))
}

/// Install the global subscriber: stdout at `level`, `app.*.log` with INFO
/// and above, `error.*.log` with errors only.
pub fn init(logs_dir: &Path, level: LevelFilter) -> Result<(LogHandle, LogGuards)> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;
    let (app_writer, app_guard) = tracing_appender::non_blocking(daily_file(logs_dir, "app")?);
    let (error_writer, error_guard) =
        tracing_appender::non_blocking(daily_file(logs_dir, "error")?);

    let (filter, handle) = reload::Layer::new(build_filter(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(app_writer)
                .with_filter(LevelFilter::INFO),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(error_writer)
                .with_filter(LevelFilter::ERROR),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok((
        LogHandle { filter: handle },
        LogGuards {
            _guards: vec![app_guard, error_guard],
        },
    ))
}

/// A handle bound to a subscriber that only covers the calling thread.
#[cfg(test)]
pub(crate) fn scoped(level: LevelFilter) -> (LogHandle, tracing::subscriber::DefaultGuard) {
    let (filter, handle) = reload::Layer::new(build_filter(level));
    let guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(filter));
    (LogHandle { filter: handle }, guard)
}

#[cfg(test)]
impl LogHandle {
    pub(crate) fn max_level(&self) -> Option<LevelFilter> {
        self.filter
            .with_current(|filter| filter.max_level_hint())
            .ok()
            .flatten()
    }
}
