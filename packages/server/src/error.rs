//! Error taxonomy and the central error responder.
//!
//! Every failure in the pipeline converges on [`AppError`]. Its
//! [`IntoResponse`] impl is the single place response status and body are
//! decided, branching on the error kind rather than on error text:
//!
//! - `NotFound` -> 404 with an empty body
//! - `Auth` / `Forbidden` -> 401 / 403 with a `{"message", "detail"}`
//!   envelope (user-facing message plus diagnostic detail)
//! - everything else -> 500 with a `{"code", "message"}` envelope

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Convenience alias for handler results flowing into the central responder.
pub type AppResult<T> = Result<T, AppError>;

/// Unified error type for the middleware pipeline and renderer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The requested resource does not exist. Responds with an empty body.
    #[error("not found")]
    NotFound,

    /// Authentication failed: missing, malformed, badly signed, or expired
    /// credential. The protected handler is never invoked.
    #[error("authentication failed: {detail}")]
    Auth { message: String, detail: String },

    /// The verified identity lacks the required permission level.
    #[error("permission denied: {detail}")]
    Forbidden { message: String, detail: String },

    /// Template compilation or execution failed.
    #[error("template error: {0}")]
    Render(#[from] tera::Error),

    /// A handler fault (panic) or other unclassified server-side failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Authentication failure with a user-facing message and a diagnostic
    /// detail.
    pub fn auth(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            detail: detail.into(),
        }
    }

    /// Permission failure with a user-facing message and a diagnostic detail.
    pub fn forbidden(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
            detail: detail.into(),
        }
    }
}

/// JSON envelope for authentication and permission failures.
#[derive(Debug, Serialize)]
struct AuthErrorBody {
    message: String,
    detail: String,
}

/// JSON envelope for generic server-side failures.
#[derive(Debug, Serialize)]
struct ServerErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Auth { message, detail } => (
                StatusCode::UNAUTHORIZED,
                Json(AuthErrorBody { message, detail }),
            )
                .into_response(),
            Self::Forbidden { message, detail } => (
                StatusCode::FORBIDDEN,
                Json(AuthErrorBody { message, detail }),
            )
                .into_response(),
            Self::Render(err) => {
                tracing::error!(error = %err, "template rendering failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ServerErrorBody {
                        code: "server_error",
                        message: err.to_string(),
                    }),
                )
                    .into_response()
            }
            Self::Internal(message) => {
                tracing::error!(error = %message, "handler fault");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ServerErrorBody {
                        code: "server_error",
                        message,
                    }),
                )
                    .into_response()
            }
        }
    }
}
