use crate::infra::{AppState, SERVICE_NAME};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::Utc;
use lead_gateway::leads::{lead_router, CorsPolicy, LeadForwarder, LeadGateway};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_lead_routes<F>(
    gateway: Arc<LeadGateway<F>>,
    cors: Arc<CorsPolicy>,
) -> axum::Router
where
    F: LeadForwarder + 'static,
{
    lead_router(gateway, cors)
        .route("/health", axum::routing::get(healthcheck))
        .route("/api/health", axum::routing::get(site_health))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn site_health() -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "source": SERVICE_NAME,
        "ts": Utc::now().timestamp_millis(),
    }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use lead_gateway::config::GatewayConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(ready: bool) -> (axum::Router, AppState) {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let gateway =
            crate::infra::build_gateway(&GatewayConfig::default()).expect("gateway builds");
        let router = with_lead_routes(gateway, Arc::new(CorsPolicy::default()))
            .layer(Extension(state.clone()));
        (router, state)
    }

    async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn site_health_reports_source_and_timestamp() {
        let Json(body) = site_health().await;
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["source"], json!(SERVICE_NAME));
        assert!(body["ts"].as_i64().expect("numeric ts") > 0);
    }

    #[tokio::test]
    async fn cors_headers_are_scoped_to_lead_routes() {
        let (router, _) = app(true);

        let lead = router
            .clone()
            .oneshot(Request::get("/lead").body(Body::empty()).unwrap())
            .await
            .expect("route executes");
        assert_eq!(lead.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let health = router
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .expect("route executes");
        assert_eq!(health.status(), StatusCode::OK);
        assert!(health
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn readiness_tracks_flag() {
        let (router, state) = app(false);

        let response = router
            .clone()
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json_body(response).await, json!({ "status": "ready" }));
    }

    #[tokio::test]
    async fn unconfigured_gateway_still_serves_liveness_and_rejects_posts() {
        let (router, _) = app(true);

        let response = router
            .clone()
            .oneshot(Request::get("/api/lead").body(Body::empty()).unwrap())
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(
                Request::post("/api/lead")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"Jo","email":"jo@x.com"}"#))
                    .unwrap(),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            read_json_body(response).await["error"],
            json!("Lead endpoint not configured")
        );
    }
}
