use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::LeadError;
use super::forwarder::{LeadForwarder, UpstreamReply};
use super::metrics;
use super::normalizer;
use super::response::GatewayResponse;
use super::validator::{self, Verdict};

/// What happened to a submission that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Forwarded(UpstreamReply),
    /// Honeypot tripped; nothing was sent upstream.
    Dropped,
}

impl SubmissionOutcome {
    pub fn metric_label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Forwarded(_) => metrics::OUTCOME_FORWARDED,
            SubmissionOutcome::Dropped => metrics::OUTCOME_SPAM,
        }
    }
}

impl From<SubmissionOutcome> for GatewayResponse {
    fn from(value: SubmissionOutcome) -> Self {
        match value {
            SubmissionOutcome::Forwarded(reply) => GatewayResponse::success(Some(reply.body)),
            SubmissionOutcome::Dropped => GatewayResponse::success(None),
        }
    }
}

/// Pipeline composing the normalizer, validator, and forwarder.
pub struct LeadGateway<F> {
    forwarder: Arc<F>,
}

impl<F> LeadGateway<F>
where
    F: LeadForwarder + 'static,
{
    pub fn new(forwarder: Arc<F>) -> Self {
        Self { forwarder }
    }

    /// Runs one submission through the pipeline.
    ///
    /// `origin` is the inbound `Origin` header: it fills a blank `source` and
    /// is passed on to the upstream.
    pub async fn submit(
        &self,
        body: &[u8],
        origin: Option<&str>,
    ) -> Result<SubmissionOutcome, LeadError> {
        if !self.forwarder.is_configured() {
            return Err(LeadError::NotConfigured);
        }

        let submission = normalizer::normalize(body)?.with_source_fallback(origin);
        let form_kind = submission.form_kind().clone();

        match validator::validate(submission)? {
            Verdict::Spam => {
                info!(%form_kind, "honeypot tripped, submission dropped");
                Ok(SubmissionOutcome::Dropped)
            }
            Verdict::Accepted(lead) => {
                let reply = self.forwarder.forward(&lead, origin).await?;
                info!(
                    %form_kind,
                    upstream_status = reply.status.as_u16(),
                    "lead forwarded"
                );
                Ok(SubmissionOutcome::Forwarded(reply))
            }
        }
    }

    /// Like [`submit`](Self::submit) but always resolves to the client envelope.
    pub async fn handle(&self, body: &[u8], origin: Option<&str>) -> GatewayResponse {
        respond(self.submit(body, origin).await)
    }

    /// Envelope for a request whose body could not be read at all.
    pub fn reject_body(&self, err: LeadError) -> GatewayResponse {
        if !self.forwarder.is_configured() {
            return respond(Err(LeadError::NotConfigured));
        }
        respond(Err(err))
    }
}

fn respond(result: Result<SubmissionOutcome, LeadError>) -> GatewayResponse {
    match result {
        Ok(outcome) => {
            metrics::record_outcome(outcome.metric_label());
            GatewayResponse::from(outcome)
        }
        Err(err) => {
            metrics::record_outcome(err.outcome());
            if err.is_client_error() {
                debug!(error = %err, "lead rejected");
            } else {
                warn!(error = %err, "lead submission failed");
            }
            GatewayResponse::from_error(&err)
        }
    }
}

impl<F> Clone for LeadGateway<F> {
    fn clone(&self) -> Self {
        Self {
            forwarder: Arc::clone(&self.forwarder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::domain::{FormKind, ValidatedLead};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Records every lead and replays a scripted answer.
    struct ScriptedForwarder {
        configured: bool,
        reply: Result<Value, StatusCode>,
        sent: Mutex<Vec<(ValidatedLead, Option<String>)>>,
    }

    impl ScriptedForwarder {
        fn answering(reply: Result<Value, StatusCode>) -> Self {
            Self {
                configured: true,
                reply,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn unconfigured() -> Self {
            Self {
                configured: false,
                ..Self::answering(Ok(Value::Null))
            }
        }

        fn sent(&self) -> Vec<(ValidatedLead, Option<String>)> {
            self.sent.lock().expect("forwarder mutex poisoned").clone()
        }
    }

    #[async_trait]
    impl LeadForwarder for ScriptedForwarder {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn forward(
            &self,
            lead: &ValidatedLead,
            origin: Option<&str>,
        ) -> Result<UpstreamReply, LeadError> {
            self.sent
                .lock()
                .expect("forwarder mutex poisoned")
                .push((lead.clone(), origin.map(str::to_string)));
            match &self.reply {
                Ok(body) => Ok(UpstreamReply {
                    status: StatusCode::OK,
                    body: body.clone(),
                }),
                Err(status) => Err(LeadError::Upstream {
                    status: *status,
                    body: json!({ "raw": "failed" }),
                }),
            }
        }
    }

    fn gateway(
        forwarder: ScriptedForwarder,
    ) -> (LeadGateway<ScriptedForwarder>, Arc<ScriptedForwarder>) {
        let forwarder = Arc::new(forwarder);
        (LeadGateway::new(forwarder.clone()), forwarder)
    }

    #[tokio::test]
    async fn forwards_valid_lead_with_origin() {
        let (gateway, forwarder) =
            gateway(ScriptedForwarder::answering(Ok(json!({ "sent": true }))));

        let response = gateway
            .handle(
                br#"{"kind":"private-sell","name":"Jo","email":"jo@x.com"}"#,
                Some("https://lake.example"),
            )
            .await;

        assert_eq!(
            response,
            GatewayResponse::success(Some(json!({ "sent": true })))
        );
        let sent = forwarder.sent();
        assert_eq!(sent.len(), 1);
        let (lead, origin) = &sent[0];
        assert_eq!(lead.form_kind(), &FormKind::PrivateSell);
        assert_eq!(lead.source(), "https://lake.example");
        assert_eq!(origin.as_deref(), Some("https://lake.example"));
    }

    #[tokio::test]
    async fn spam_is_accepted_without_forwarding() {
        let (gateway, forwarder) = gateway(ScriptedForwarder::answering(Ok(Value::Null)));

        let outcome = gateway
            .submit(
                br#"{"name":"Bot","email":"b@x.com","website":"http://spam.biz"}"#,
                None,
            )
            .await
            .expect("spam is not an error");

        assert_eq!(outcome, SubmissionOutcome::Dropped);
        assert!(forwarder.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_configuration_short_circuits_before_parsing() {
        let (gateway, forwarder) = gateway(ScriptedForwarder::unconfigured());

        let response = gateway.handle(b"definitely not json", None).await;

        assert_eq!(response.status, 500);
        assert_eq!(response.error.as_deref(), Some("Lead endpoint not configured"));
        assert!(forwarder.sent().is_empty());
    }

    #[tokio::test]
    async fn invalid_submissions_never_reach_the_forwarder() {
        let (gateway, forwarder) = gateway(ScriptedForwarder::answering(Ok(Value::Null)));

        let parse = gateway.handle(b"{", None).await;
        assert_eq!(parse.status, 400);
        assert_eq!(parse.error.as_deref(), Some("Invalid JSON"));

        let missing = gateway.handle(br#"{"email":"jo@x.com"}"#, None).await;
        assert_eq!(missing.status, 400);
        assert_eq!(missing.error.as_deref(), Some("Missing required fields"));

        assert!(forwarder.sent().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_becomes_bad_gateway() {
        let (gateway, forwarder) = gateway(ScriptedForwarder::answering(Err(
            StatusCode::SERVICE_UNAVAILABLE,
        )));

        let response = gateway
            .handle(br#"{"name":"Jo","email":"jo@x.com"}"#, None)
            .await;

        assert!(!response.ok);
        assert_eq!(response.status, 502);
        assert_eq!(
            response.data.as_ref().and_then(|data| data.get("upstream_status")),
            Some(&json!(503))
        );
        assert_eq!(forwarder.sent().len(), 1);
    }

    #[tokio::test]
    async fn unreadable_body_respects_configuration() {
        let (configured, _) = gateway(ScriptedForwarder::answering(Ok(Value::Null)));
        let (unconfigured, _) = gateway(ScriptedForwarder::unconfigured());

        let response = configured.reject_body(LeadError::Body {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            reason: "length limit exceeded".to_string(),
        });
        assert_eq!(response.status, 413);

        let response = unconfigured.reject_body(LeadError::Body {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            reason: "length limit exceeded".to_string(),
        });
        assert_eq!(response.status, 500);
    }

    #[tokio::test]
    async fn outcomes_are_counted_by_label() {
        let (gateway, _) = gateway(ScriptedForwarder::answering(Ok(json!({ "sent": true }))));

        let results = vec![
            gateway
                .submit(br#"{"name":"Jo","email":"jo@x.com"}"#, None)
                .await,
            gateway
                .submit(
                    br#"{"name":"Bot","email":"b@x.com","website":"http://spam.biz"}"#,
                    None,
                )
                .await,
            gateway.submit(br#"{"email":"jo@x.com"}"#, None).await,
            gateway.submit(br#"{"name":"Jo"}"#, None).await,
        ];

        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        ::metrics::with_local_recorder(&recorder, || {
            for result in results {
                respond(result);
            }
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"lead_submissions_total{outcome="forwarded"} 1"#));
        assert!(rendered.contains(r#"lead_submissions_total{outcome="spam"} 1"#));
        assert!(rendered.contains(r#"lead_submissions_total{outcome="missing_fields"} 2"#));
        assert!(!rendered.contains(r#"outcome="upstream_error""#));
    }
}
