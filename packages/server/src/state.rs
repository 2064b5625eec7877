//! Shared application state.
//!
//! The explicit service object replacing the original package-level
//! globals: every shared resource (buffer pool, log sink, site options,
//! compiled templates, token verifier) is allocated once here, before the
//! first request is served, and passed by reference into the middleware via
//! axum's `State` extraction. Teardown is Drop: releasing the state flushes
//! and closes the log sink.

use std::sync::Arc;

use anyhow::Context as _;

use crate::config::AppConfig;
use crate::logging::RequestLog;
use crate::middleware::auth::AuthVerifier;
use crate::render::{Renderer, SiteOptions};

/// Shared application state passed to all middleware and handlers via
/// `State` extraction. Holds `Arc` references so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Immutable runtime configuration.
    pub config: Arc<AppConfig>,
    /// Site options, read-only under load.
    pub site: Arc<SiteOptions>,
    /// Template renderer with the mode-selected engine strategy.
    pub renderer: Arc<Renderer>,
    /// Request-log services: buffer pool plus line sink.
    pub log: Arc<RequestLog>,
    /// Bearer-token verifier.
    pub auth: Arc<AuthVerifier>,
}

impl AppState {
    /// Builds every shared service from the configuration: opens the log
    /// sink (creating the log directory if absent), compiles the template
    /// set, and prepares the token verifier.
    ///
    /// Site options come from the caller, which loads them from its own
    /// storage before serving begins.
    ///
    /// # Errors
    ///
    /// Returns an error when the log sink cannot be opened or the template
    /// set fails to compile.
    pub fn new(config: AppConfig, site: SiteOptions) -> anyhow::Result<Self> {
        let site = Arc::new(site);
        let log = RequestLog::new(&config).context("failed to initialize request log")?;
        let renderer = Renderer::new(&config, Arc::clone(&site))
            .context("failed to compile template set")?;
        let auth = AuthVerifier::new(&config.auth.secret);

        Ok(Self {
            config: Arc::new(config),
            site,
            renderer: Arc::new(renderer),
            log: Arc::new(log),
            auth: Arc::new(auth),
        })
    }
}
