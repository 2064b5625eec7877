//! Destinations for formatted request-log lines.
//!
//! Development mode writes lines synchronously to stdout. Production mode
//! hands them to a non-blocking writer backed by a daily-rotated file: a
//! bounded, lossy in-memory queue decouples the request path from disk I/O,
//! so a full queue drops lines instead of stalling requests.

use std::io::Write;

use anyhow::Context as _;
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::config::LogConfig;

/// Where formatted log lines go.
///
/// Writes are best-effort on every variant: a sink failure must never
/// surface as a request failure.
pub enum LogSink {
    /// Synchronous stdout, for development.
    Console,
    /// Asynchronous daily-rotated file, for production. The worker guard is
    /// owned here so dropping the sink flushes queued lines.
    File {
        writer: NonBlocking,
        _guard: WorkerGuard,
    },
}

impl LogSink {
    /// Synchronous console sink.
    #[must_use]
    pub fn console() -> Self {
        Self::Console
    }

    /// Asynchronous file sink rotating daily under `config.dir`, keeping
    /// `config.retention_days` files. The directory is created if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the log directory cannot be created or the
    /// rolling appender cannot be initialized.
    pub fn file(config: &LogConfig) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.dir)
            .with_context(|| format!("failed to create log directory {}", config.dir.display()))?;

        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(&config.file_prefix)
            .filename_suffix("log")
            .max_log_files(config.retention_days)
            .build(&config.dir)
            .context("failed to initialize rolling log file")?;

        let (writer, guard) = NonBlockingBuilder::default()
            .buffered_lines_limit(config.queue_capacity)
            .lossy(true)
            .finish(appender);

        Ok(Self::File {
            writer,
            _guard: guard,
        })
    }

    /// Writes one formatted line. Best-effort: errors are discarded.
    pub fn write_line(&self, line: &[u8]) {
        match self {
            Self::Console => {
                let _ = std::io::stdout().write_all(line);
            }
            Self::File { writer, .. } => {
                let mut writer = writer.clone();
                let _ = writer.write_all(line);
            }
        }
    }
}
