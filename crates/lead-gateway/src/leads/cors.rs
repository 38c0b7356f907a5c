use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::AllowedOrigins;

const ALLOWED_METHODS: &str = "POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";

/// Cross-origin policy for the lead routes. Credentials are never allowed.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: AllowedOrigins,
}

impl CorsPolicy {
    pub fn new(origins: AllowedOrigins) -> Self {
        Self { origins }
    }

    /// Value for `Access-Control-Allow-Origin` given the request's `Origin` header.
    pub fn allow_origin(&self, request_origin: Option<&HeaderValue>) -> HeaderValue {
        match &self.origins {
            AllowedOrigins::Any => HeaderValue::from_static("*"),
            AllowedOrigins::Reflect => request_origin
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static("*")),
            AllowedOrigins::List(allowed) => {
                let listed = request_origin.filter(|origin| {
                    origin
                        .to_str()
                        .map(|value| allowed.iter().any(|entry| entry == value))
                        .unwrap_or(false)
                });

                match listed {
                    Some(origin) => origin.clone(),
                    None => allowed
                        .first()
                        .and_then(|entry| HeaderValue::from_str(entry).ok())
                        .unwrap_or_else(|| HeaderValue::from_static("null")),
                }
            }
        }
    }

    /// Writes the CORS headers onto an outgoing response.
    pub fn apply(&self, request_origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        headers.insert(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            self.allow_origin(request_origin),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );

        if !matches!(self.origins, AllowedOrigins::Any) {
            headers.insert(VARY, HeaderValue::from_static("origin"));
        }
    }

    /// `204 No Content` answer to a preflight request.
    pub fn preflight(&self, request_origin: Option<&HeaderValue>) -> Response {
        let mut response = StatusCode::NO_CONTENT.into_response();
        self.apply(request_origin, response.headers_mut());
        response
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new(AllowedOrigins::Any)
    }
}

/// Middleware stamping CORS headers on every response so browsers can read
/// error bodies as well as successes.
pub async fn apply_cors_headers(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request.headers().get(ORIGIN).cloned();
    let mut response = next.run(request).await;
    policy.apply(origin.as_ref(), response.headers_mut());
    response
}
