use std::time::Instant;

use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::header::ORIGIN;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::domain::ValidatedLead;
use super::error::LeadError;
use crate::config::GatewayConfig;

/// A 2xx answer from the notification service.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Value,
}

/// Outbound hook delivering accepted leads (e-mail worker, CRM webhook, ...).
///
/// Implementations make exactly one attempt per call.
#[async_trait]
pub trait LeadForwarder: Send + Sync {
    /// Whether a destination is known. Unconfigured forwarders turn every
    /// submission into [`LeadError::NotConfigured`] before it is parsed.
    fn is_configured(&self) -> bool {
        true
    }

    async fn forward(
        &self,
        lead: &ValidatedLead,
        origin: Option<&str>,
    ) -> Result<UpstreamReply, LeadError>;
}

/// Forwards leads as JSON to a single HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpLeadForwarder {
    client: reqwest::Client,
    endpoint: Option<Url>,
    fallback_origin: Option<String>,
}

impl HttpLeadForwarder {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .user_agent(concat!("lead-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(
            client,
            config.lead_endpoint.clone(),
            config.fallback_origin.clone(),
        ))
    }

    pub fn with_client(
        client: reqwest::Client,
        endpoint: Option<Url>,
        fallback_origin: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint,
            fallback_origin,
        }
    }
}

#[async_trait]
impl LeadForwarder for HttpLeadForwarder {
    fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    async fn forward(
        &self,
        lead: &ValidatedLead,
        origin: Option<&str>,
    ) -> Result<UpstreamReply, LeadError> {
        let endpoint = self.endpoint.as_ref().ok_or(LeadError::NotConfigured)?;

        let mut request = self.client.post(endpoint.clone()).json(lead);
        if let Some(origin) = origin.or(self.fallback_origin.as_deref()) {
            request = request.header(ORIGIN, origin);
        }

        let started = Instant::now();
        let response = request.send().await.map_err(LeadError::Network)?;
        let status = response.status();
        let text = response.text().await.map_err(LeadError::Network)?;
        let body = parse_upstream_body(&text);

        debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream responded"
        );

        if status.is_success() {
            Ok(UpstreamReply { status, body })
        } else {
            Err(LeadError::Upstream { status, body })
        }
    }
}

/// JSON when the upstream sent JSON, `{ "raw": text }` otherwise.
pub fn parse_upstream_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text }))
}
