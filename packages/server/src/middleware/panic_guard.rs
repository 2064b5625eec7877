//! Panic containment middleware.
//!
//! Sits between the request logger and the token authenticator: a panic in
//! any inner layer or handler is caught here, normalized into
//! [`AppError::Internal`], and answered through the central responder, so a
//! single faulty request can never take the serving process down. The
//! request logger above still sees a response and logs the request with the
//! usual line format.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::sync::Once;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;

use crate::error::AppError;

/// Upper bound on the stack trace written to stdout.
const MAX_TRACE_BYTES: usize = 1024;

thread_local! {
    /// Stack trace of the most recent panic on this thread, recorded by the
    /// panic hook while the faulting frames are still on the stack.
    static PANIC_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Installs a panic hook that stashes the trace for [`catch_panics`]. The
/// previous hook is chained, so default panic output is preserved. Called
/// lazily from the middleware; later calls are no-ops.
fn install_trace_hook() {
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            PANIC_TRACE.with(|slot| {
                *slot.borrow_mut() = Some(Backtrace::force_capture().to_string());
            });
            previous(info);
        }));
    });
}

/// Takes the trace recorded by the hook. The hook runs before the unwind,
/// on the panicking thread, so by the time `catch_unwind` observes the
/// failure the trace is waiting here and still shows the faulting frames.
fn take_panic_trace() -> Option<String> {
    PANIC_TRACE.with(|slot| slot.borrow_mut().take())
}

/// Catches unwinds from the wrapped handler, writes a bounded stack trace to
/// stdout, and responds with a server-error envelope.
pub async fn catch_panics(req: Request, next: Next) -> Response {
    install_trace_hook();
    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            let trace = take_panic_trace()
                .unwrap_or_else(|| Backtrace::force_capture().to_string());
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(truncate(&trace, MAX_TRACE_BYTES).as_bytes());
            let _ = stdout.write_all(b"\n");
            AppError::Internal(message).into_response()
        }
    }
}

/// Normalizes a panic payload into a message, wrapping non-string payloads
/// with a fixed description.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_owned()
    }
}

/// Truncates to at most `max` bytes without splitting a UTF-8 character.
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;

    async fn faulty() -> &'static str {
        panic!("post id out of range")
    }

    fn guarded_router() -> Router {
        Router::new()
            .route("/faulty", get(faulty))
            .route("/healthy", get(|| async { "still serving" }))
            .layer(from_fn(catch_panics))
    }

    #[tokio::test]
    async fn panic_becomes_single_error_response() {
        let response = guarded_router()
            .oneshot(Request::builder().uri("/faulty").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], "server_error");
        assert_eq!(json["message"], "post id out of range");
    }

    #[tokio::test]
    async fn process_keeps_serving_after_a_panic() {
        let app = guarded_router();

        let faulty = app
            .clone()
            .oneshot(Request::builder().uri("/faulty").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(faulty.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let healthy = app
            .oneshot(Request::builder().uri("/healthy").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(healthy.status(), StatusCode::OK);
    }

    #[test]
    fn panic_message_from_str_payload() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
    }

    #[test]
    fn panic_message_from_string_payload() {
        let payload: Box<dyn Any + Send> = Box::new("boom".to_string());
        assert_eq!(panic_message(payload.as_ref()), "boom");
    }

    #[test]
    fn panic_message_from_other_payload_is_wrapped() {
        let payload: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(payload.as_ref()), "panic with non-string payload");
    }

    #[test]
    fn trace_is_recorded_at_panic_time() {
        install_trace_hook();
        let result = std::panic::catch_unwind(|| {
            panic!("faulting frame");
        });
        assert!(result.is_err());
        let trace = take_panic_trace().expect("hook should have recorded a trace");
        assert!(!trace.is_empty());
        // The trace belongs to exactly one panic.
        assert!(take_panic_trace().is_none());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "ab\u{00e9}cd"; // é is two bytes, starting at index 2
        assert_eq!(truncate(text, 3), "ab");
        assert_eq!(truncate(text, 4), "ab\u{00e9}");
        assert_eq!(truncate(text, 100), text);
    }

    #[test]
    fn truncate_bounds_long_traces() {
        let text = "x".repeat(MAX_TRACE_BYTES * 4);
        assert_eq!(truncate(&text, MAX_TRACE_BYTES).len(), MAX_TRACE_BYTES);
    }
}
