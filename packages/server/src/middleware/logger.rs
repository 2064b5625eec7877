//! Request-logging middleware.
//!
//! Outermost layer of the pipeline: times the wrapped handler, formats one
//! log line into a pooled buffer, and hands the line to the configured sink.
//! Formatting and sink writes are best-effort; a logging failure never
//! becomes a request failure. Handler errors have already been converted to
//! responses by the central responder before they reach this layer, so the
//! logger observes and forwards them untouched.

use std::io::Write;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Local};

use crate::state::AppState;

/// Logs one line per request: bracketed timestamp, client IP, method, path,
/// full URI, and elapsed duration.
pub async fn log_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let started = Instant::now();
    let timestamp = Local::now();
    let ip = client_ip(&req);
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let uri = req.uri().to_string();

    let response = next.run(req).await;

    let mut buf = state.log.pool.acquire();
    if format_line(
        &mut buf,
        &timestamp,
        &ip,
        &method,
        &path,
        &uri,
        started.elapsed(),
    )
    .is_ok()
    {
        state.log.sink.write_line(&buf);
    }
    response
}

/// Formats the log line into `buf`. Field layout matches the operator-facing
/// format the file sink has always used.
fn format_line(
    buf: &mut impl Write,
    timestamp: &DateTime<Local>,
    ip: &str,
    method: &Method,
    path: &str,
    uri: &str,
    span: Duration,
) -> std::io::Result<()> {
    writeln!(
        buf,
        "[{}]\tip: {ip}\tmethod: {method}\tpath: {path}\turi: {uri}\tspan: {span:?}",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
    )
}

/// Resolves the client address: `x-forwarded-for` (first hop), then
/// `x-real-ip`, then the peer address, then `-`.
fn client_ip(req: &Request) -> String {
    if let Some(forwarded) = header_str(req, "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_owned();
            }
        }
    }
    if let Some(real_ip) = header_str(req, "x-real-ip") {
        return real_ip.trim().to_owned();
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "-".to_owned(), |info| info.0.ip().to_string())
}

fn header_str<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|value| value.to_str().ok())
}
