//! Cross-cutting middleware for the request pipeline.
//!
//! Composition order, outermost to innermost:
//!
//! 1. Request logger -- times and logs every request, including those that
//!    fail further in
//! 2. Panic guard -- converts handler panics into error responses
//! 3. CORS -- cross-origin policy
//! 4. Token authenticator -- applied per protected route via `route_layer`,
//!    so authentication failures are still logged and panic-guarded
//!
//! [`apply`] installs layers 1-3 on a router; callers attach
//! [`require_auth`] (and optionally [`require_role`]) to the routes that
//! need them.

pub mod auth;
pub mod logger;
pub mod panic_guard;

pub use auth::{require_auth, require_role, AuthVerifier, Claims, UserId};
pub use logger::log_requests;
pub use panic_guard::catch_panics;

use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::state::AppState;

/// Applies the shared middleware stack to a router.
///
/// The first layer listed is the outermost: it sees the request first on
/// the way in and the response last on the way out.
pub fn apply(routes: Router<AppState>, state: &AppState) -> Router<AppState> {
    routes.layer(
        ServiceBuilder::new()
            .layer(from_fn_with_state(state.clone(), log_requests))
            .layer(from_fn(catch_panics))
            .layer(cors_layer(&state.config.network.cors_origins)),
    )
}

/// Builds the CORS layer from the configured list of allowed origins.
///
/// A wildcard `"*"` in the origins list allows any origin. Otherwise, each
/// origin string is parsed and added to an explicit allowlist. Permitted
/// request headers are origin, content-type, accept, and authorization.
#[must_use]
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers([ORIGIN, CONTENT_TYPE, ACCEPT, AUTHORIZATION])
}
