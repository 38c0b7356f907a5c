use crate::cli::ServeArgs;
use crate::infra::{build_gateway, AppState};
use crate::routes::with_lead_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use lead_gateway::config::{AppConfig, ConfigError};
use lead_gateway::error::AppError;
use lead_gateway::leads::{metrics, CorsPolicy};
use lead_gateway::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let endpoint_configured = config.gateway.lead_endpoint.is_some();
    if !endpoint_configured {
        if args.require_endpoint {
            return Err(ConfigError::MissingLeadEndpoint.into());
        }
        warn!("LEAD_ENDPOINT_URL is not set; every lead submission will be answered with 500");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    metrics::describe();

    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let gateway = build_gateway(&config.gateway)?;
    let cors = Arc::new(CorsPolicy::new(config.gateway.allowed_origins.clone()));

    let app = with_lead_routes(gateway, cors)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        environment = ?config.environment,
        %addr,
        endpoint_configured,
        cors = config.gateway.allowed_origins.mode_label(),
        timeout_secs = config.gateway.upstream_timeout.as_secs(),
        "lead intake gateway ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
