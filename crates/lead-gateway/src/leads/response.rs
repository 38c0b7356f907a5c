use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use super::error::LeadError;

const UPSTREAM_EXCERPT_CHARS: usize = 120;

/// The one envelope every lead route answers with. `status` mirrors the HTTP status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status: u16,
}

impl GatewayResponse {
    pub fn success(data: Option<Value>) -> Self {
        Self {
            ok: true,
            data,
            error: None,
            status: StatusCode::OK.as_u16(),
        }
    }

    fn failure(status: StatusCode, error: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            ok: false,
            data,
            error: Some(error.into()),
            status: status.as_u16(),
        }
    }

    /// Client-facing shape of a failure. Transport and configuration details stay in the logs.
    pub fn from_error(err: &LeadError) -> Self {
        let status = err.status_code();
        match err {
            LeadError::Parse(_) => Self::failure(status, "Invalid JSON", None),
            LeadError::Body { .. } if status == StatusCode::PAYLOAD_TOO_LARGE => {
                Self::failure(status, "Payload too large", None)
            }
            LeadError::Body { .. } => Self::failure(status, "Unreadable request body", None),
            LeadError::Validation { missing } => Self::failure(
                status,
                "Missing required fields",
                Some(json!({ "missing": missing })),
            ),
            LeadError::NotConfigured => Self::failure(status, "Lead endpoint not configured", None),
            LeadError::Upstream {
                status: upstream_status,
                body,
            } => Self::failure(
                status,
                upstream_failure_message(*upstream_status, body),
                Some(json!({
                    "upstream_status": upstream_status.as_u16(),
                    "body": body,
                })),
            ),
            LeadError::Network(_) => {
                Self::failure(status, "Network error contacting upstream", None)
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// `Upstream responded with status N`, followed by a short excerpt of the body when it has one.
fn upstream_failure_message(status: StatusCode, body: &Value) -> String {
    let headline = format!("Upstream responded with status {}", status.as_u16());
    let text = match body.get("raw").and_then(Value::as_str) {
        Some(raw) => raw.trim().to_string(),
        None => body.to_string(),
    };

    if text.is_empty() {
        return headline;
    }

    let excerpt: String = text.chars().take(UPSTREAM_EXCERPT_CHARS).collect();
    if excerpt.len() < text.len() {
        format!("{headline}: {excerpt}...")
    } else {
        format!("{headline}: {excerpt}")
    }
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
