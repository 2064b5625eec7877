//! Quill server core — the request-processing pipeline of a content site.
//!
//! This crate provides the cross-cutting middleware chain (request logging,
//! panic containment, bearer-token authentication), the template-rendering
//! subsystem with site-option injection and development hot-reload, and the
//! central error responder that turns every failure into a uniform response.
//!
//! Route registration, business handlers, persistence, and CLI bootstrap are
//! external collaborators: callers build a [`Router`](axum::Router) of their
//! own routes, construct an [`AppState`] once at startup, and hand both to
//! [`ServerModule`] which applies the middleware stack and serves.

pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod render;
pub mod server;
pub mod state;

pub use config::{AppConfig, RunMode};
pub use error::{AppError, AppResult};
pub use middleware::{require_auth, require_role, Claims, UserId};
pub use render::{Page, Renderer, SiteOptions};
pub use server::ServerModule;
pub use state::AppState;
