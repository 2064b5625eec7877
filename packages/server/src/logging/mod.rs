//! Request-log infrastructure: buffer pool, line sink, and tracing setup.
//!
//! The original design kept the pool and sink as process-wide globals with
//! implicit initialization. Here they are bundled into [`RequestLog`], built
//! once at startup inside [`AppState`](crate::state::AppState) and passed by
//! reference into the middleware, with explicit teardown: dropping the
//! bundle flushes and closes the file sink.

pub mod pool;
pub mod sink;

pub use pool::{BufferPool, PooledBuffer};
pub use sink::LogSink;

use crate::config::AppConfig;

/// Shared request-logging services: one buffer pool plus one line sink.
pub struct RequestLog {
    pub pool: BufferPool,
    pub sink: LogSink,
}

impl RequestLog {
    /// Selects the sink from the run mode: console in development, rotating
    /// file in production.
    ///
    /// # Errors
    ///
    /// Returns an error if the production file sink cannot be initialized.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let sink = if config.mode.is_dev() {
            LogSink::console()
        } else {
            LogSink::file(&config.log)?
        };
        Ok(Self {
            pool: BufferPool::new(),
            sink,
        })
    }
}

/// Installs the global tracing subscriber for operational logs.
///
/// Uses `RUST_LOG` when set, defaulting to `info`. Safe to call more than
/// once; later calls are no-ops.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
