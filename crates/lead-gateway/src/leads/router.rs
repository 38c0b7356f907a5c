use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::header::ORIGIN;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde_json::{json, Value};

use super::cors::{apply_cors_headers, CorsPolicy};
use super::error::LeadError;
use super::forwarder::LeadForwarder;
use super::response::GatewayResponse;
use super::service::LeadGateway;

/// Paths accepting lead submissions: the site's API route and the worker-style path.
pub const LEAD_ROUTES: [&str; 2] = ["/api/lead", "/lead"];

pub(crate) struct LeadRouteState<F> {
    gateway: Arc<LeadGateway<F>>,
    cors: Arc<CorsPolicy>,
}

impl<F> Clone for LeadRouteState<F> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            cors: Arc::clone(&self.cors),
        }
    }
}

/// Router builder exposing the lead routes, with CORS headers on every response.
pub fn lead_router<F>(gateway: Arc<LeadGateway<F>>, cors: Arc<CorsPolicy>) -> Router
where
    F: LeadForwarder + 'static,
{
    let state = LeadRouteState {
        gateway,
        cors: Arc::clone(&cors),
    };

    LEAD_ROUTES
        .iter()
        .fold(Router::<LeadRouteState<F>>::new(), |router, path| {
            router.route(
                path,
                get(liveness_handler)
                    .post(submit_handler::<F>)
                    .options(preflight_handler::<F>),
            )
        })
        .with_state(state)
        .layer(middleware::from_fn_with_state(cors, apply_cors_headers))
}

pub(crate) async fn liveness_handler() -> Json<Value> {
    Json(json!({ "ok": true, "message": "Lead API ready" }))
}

pub(crate) async fn preflight_handler<F>(
    State(state): State<LeadRouteState<F>>,
    headers: HeaderMap,
) -> Response
where
    F: LeadForwarder + 'static,
{
    state.cors.preflight(headers.get(ORIGIN))
}

pub(crate) async fn submit_handler<F>(
    State(state): State<LeadRouteState<F>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> GatewayResponse
where
    F: LeadForwarder + 'static,
{
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            return state.gateway.reject_body(LeadError::Body {
                status: rejection.status(),
                reason: rejection.body_text(),
            })
        }
    };

    let origin = headers.get(ORIGIN).and_then(|value| value.to_str().ok());
    state.gateway.handle(&body, origin).await
}
