use lead_gateway::config::GatewayConfig;
use lead_gateway::error::AppError;
use lead_gateway::leads::{HttpLeadForwarder, LeadGateway};
use metrics_exporter_prometheus::PrometheusHandle;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) const SERVICE_NAME: &str = "lead-gateway";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_gateway(
    config: &GatewayConfig,
) -> Result<Arc<LeadGateway<HttpLeadForwarder>>, AppError> {
    let forwarder = HttpLeadForwarder::from_config(config)?;
    Ok(Arc::new(LeadGateway::new(Arc::new(forwarder))))
}

/// Reads a payload file, or standard input when the path is `-`.
pub(crate) fn read_payload(path: &Path) -> Result<Vec<u8>, AppError> {
    if path.as_os_str() == "-" {
        let mut buffer = Vec::new();
        std::io::stdin().read_to_end(&mut buffer)?;
        return Ok(buffer);
    }

    Ok(std::fs::read(path)?)
}
