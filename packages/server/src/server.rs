//! Server lifecycle with deferred startup.
//!
//! `new()` takes the prepared [`AppState`], `start()` binds the TCP
//! listener, and `serve()` wraps the caller's routes in the middleware
//! stack and accepts connections until the shutdown future fires. The
//! separation lets the application finish loading site options and routes
//! between binding and serving.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware;
use crate::state::AppState;

/// Manages the HTTP server lifecycle around a caller-supplied router.
pub struct ServerModule {
    state: AppState,
    listener: Option<TcpListener>,
}

impl ServerModule {
    /// Creates a new server module without binding any port.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            listener: None,
        }
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let network = &self.state.config.network;
        let addr = format!("{}:{}", network.host, network.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", network.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Applies the middleware stack to `routes` and serves until the
    /// shutdown future resolves, then drains gracefully.
    ///
    /// Consumes `self` because the listener is moved into the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a fatal I/O error.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called before `serve()`.
    pub async fn serve(
        self,
        routes: Router<AppState>,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .expect("start() must be called before serve()");

        let app = middleware::apply(routes, &self.state).with_state(self.state);

        info!("Serving HTTP connections");
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;
        Ok(())
    }
}
