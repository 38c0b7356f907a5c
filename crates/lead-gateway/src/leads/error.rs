use axum::http::StatusCode;
use serde_json::Value;

/// Terminal failure of a single lead submission.
#[derive(Debug, thiserror::Error)]
pub enum LeadError {
    #[error("request body is not a JSON object: {0}")]
    Parse(String),
    #[error("request body could not be read: {reason}")]
    Body { status: StatusCode, reason: String },
    #[error("missing required fields: {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },
    #[error("lead endpoint not configured")]
    NotConfigured,
    #[error("upstream responded with status {status}")]
    Upstream { status: StatusCode, body: Value },
    #[error("network error contacting upstream: {0}")]
    Network(#[source] reqwest::Error),
}

impl LeadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LeadError::Parse(_) | LeadError::Validation { .. } => StatusCode::BAD_REQUEST,
            LeadError::Body { status, .. } => *status,
            LeadError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            LeadError::Upstream { .. } | LeadError::Network(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Metric label for the outcome this error represents.
    pub fn outcome(&self) -> &'static str {
        match self {
            LeadError::Parse(_) => "invalid_json",
            LeadError::Body { .. } => "unreadable_body",
            LeadError::Validation { .. } => "missing_fields",
            LeadError::NotConfigured => "not_configured",
            LeadError::Upstream { .. } => "upstream_error",
            LeadError::Network(_) => "network_error",
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}
