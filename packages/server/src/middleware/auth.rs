//! Bearer-token authentication middleware.
//!
//! Protects routes behind a signed-claims token. The credential is looked up
//! as a form field named `token` first (URL query, then an urlencoded body),
//! falling back to the `Authorization: Bearer <token>` header. Verification
//! uses an HMAC-SHA256 shared secret; the token-issuance side lives
//! elsewhere. On success the decoded [`Claims`] and a convenience [`UserId`]
//! are attached to the request extensions for downstream handlers, and the
//! response is stamped with a `Server` header naming the serving instance.

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, SERVER};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";
const TOKEN_FIELD: &str = "token";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Decoded identity carried by a verified token. Immutable once constructed;
/// lives for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id of the authenticated user.
    pub id: i64,
    /// Numeric permission level, checked by downstream guards.
    pub role: u32,
    /// Expiry as a unix timestamp, validated during verification.
    pub exp: i64,
}

impl Claims {
    /// Whether this identity meets a numeric permission threshold.
    #[must_use]
    pub fn role_at_least(&self, min: u32) -> bool {
        self.role >= min
    }
}

/// Identity id attached to the request alongside the full claims, for
/// handlers that only need the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub i64);

/// Verifies signed tokens against the shared secret.
pub struct AuthVerifier {
    decoding: DecodingKey,
    validation: Validation,
}

impl AuthVerifier {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Decodes and validates a token: signature, then standard claim
    /// validation including expiry.
    ///
    /// # Errors
    ///
    /// Returns the underlying decode error for malformed, badly signed, or
    /// expired tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        Ok(decode::<Claims>(token, &self.decoding, &self.validation)?.claims)
    }
}

/// Authentication middleware for protected routes.
///
/// Without a credential, or with one that fails verification, the wrapped
/// handler is never invoked and the response is a 401 envelope.
pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let (mut req, token) = match extract_token(req).await {
        Ok(found) => found,
        Err(err) => return err.into_response(),
    };
    let Some(token) = token else {
        return AppError::auth("please sign in again", "token not found").into_response();
    };

    match state.auth.verify(&token) {
        Ok(claims) => {
            req.extensions_mut().insert(UserId(claims.id));
            req.extensions_mut().insert(claims);
            let mut response = next.run(req).await;
            if let Ok(tag) = HeaderValue::from_str(&state.config.instance_tag) {
                response.headers_mut().insert(SERVER, tag);
            }
            response
        }
        Err(err) => AppError::auth(
            "please sign in again",
            format!("token verification failed: {err}"),
        )
        .into_response(),
    }
}

/// Permission guard for routes that additionally require a role level.
///
/// Layered inside [`require_auth`], which puts the verified [`Claims`] on
/// the request:
///
/// ```ignore
/// router.route_layer(from_fn(move |req: Request, next: Next| require_role(27, req, next)))
/// ```
pub async fn require_role(min: u32, req: Request, next: Next) -> Response {
    match req.extensions().get::<Claims>() {
        Some(claims) if claims.role_at_least(min) => next.run(req).await,
        Some(_) => {
            AppError::forbidden("operation not allowed", "insufficient permission level")
                .into_response()
        }
        None => AppError::auth("please sign in again", "no verified claims on request")
            .into_response(),
    }
}

/// Finds the credential: form field `token` first, then the bearer header.
///
/// Reading an urlencoded body consumes it, so the full body is buffered and
/// restored on the returned request before the inner handler runs. The body
/// size is not capped here; limiting request bodies is the router's concern
/// and a large form submission must still surrender its token.
///
/// # Errors
///
/// Returns a server error for an unreadable form body and an authentication
/// error for a malformed `Authorization` header.
async fn extract_token(req: Request) -> Result<(Request, Option<String>), AppError> {
    if let Some(token) = query_token(&req) {
        return Ok((req, Some(token)));
    }

    let req = if is_urlencoded_form(&req) {
        let (parts, body) = req.into_parts();
        let bytes = to_bytes(body, usize::MAX)
            .await
            .map_err(|err| AppError::Internal(format!("unreadable form body: {err}")))?;
        let token = form_field(&bytes, TOKEN_FIELD);
        let restored = Request::from_parts(parts, Body::from(bytes));
        if token.is_some() {
            return Ok((restored, token));
        }
        restored
    } else {
        req
    };

    let token = bearer_token(&req)?;
    Ok((req, token))
}

/// Extracts the token from the URL query string, if present and non-empty.
fn query_token(req: &Request) -> Option<String> {
    let query = req.uri().query()?;
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;
    pairs
        .into_iter()
        .find(|(key, value)| key == TOKEN_FIELD && !value.is_empty())
        .map(|(_, value)| value)
}

fn is_urlencoded_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

fn form_field(bytes: &[u8], field: &str) -> Option<String> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes).ok()?;
    pairs
        .into_iter()
        .find(|(key, value)| key == field && !value.is_empty())
        .map(|(_, value)| value)
}

/// Strips the `Bearer ` prefix from the `Authorization` header.
///
/// An absent header is simply no credential. A present header that is
/// shorter than the prefix, carries a different scheme, or has an empty
/// token is malformed and fails authentication outright; the prefix is
/// never stripped by a fixed offset.
fn bearer_token(req: &Request) -> Result<Option<String>, AppError> {
    let Some(value) = req.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| {
        AppError::auth("please sign in again", "malformed authorization header")
    })?;
    match value.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.is_empty() => Ok(Some(token.to_owned())),
        _ => Err(AppError::auth(
            "please sign in again",
            "malformed bearer credential",
        )),
    }
}
