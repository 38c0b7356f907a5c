use crate::infra::{build_gateway, read_payload};
use clap::Args;
use lead_gateway::config::AppConfig;
use lead_gateway::error::AppError;
use lead_gateway::leads::normalizer::normalize;
use lead_gateway::leads::validator::{validate, Verdict};
use lead_gateway::leads::{GatewayResponse, LeadError, ValidatedLead};
use lead_gateway::telemetry;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct LeadPayloadArgs {
    /// JSON payload file, or `-` for standard input
    #[arg(default_value = "-")]
    pub(crate) payload: PathBuf,
    /// Origin header to submit with, as a browser form would
    #[arg(long)]
    pub(crate) origin: Option<String>,
}

pub(crate) fn run_lead_check(args: LeadPayloadArgs) -> Result<(), AppError> {
    let body = read_payload(&args.payload)?;

    match check_payload(&body, args.origin.as_deref()) {
        Ok(Verdict::Accepted(lead)) => render_accepted(&lead),
        Ok(Verdict::Spam) => {
            println!("Honeypot field is filled: the gateway answers 200 and drops this lead.");
            Ok(())
        }
        Err(err) => {
            print_json(&GatewayResponse::from_error(&err))?;
            Err(err.into())
        }
    }
}

pub(crate) async fn run_lead_send(args: LeadPayloadArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let body = read_payload(&args.payload)?;
    let gateway = build_gateway(&config.gateway)?;

    match gateway.submit(&body, args.origin.as_deref()).await {
        Ok(outcome) => print_json(&GatewayResponse::from(outcome)),
        Err(err) => {
            print_json(&GatewayResponse::from_error(&err))?;
            Err(err.into())
        }
    }
}

fn check_payload(body: &[u8], origin: Option<&str>) -> Result<Verdict, LeadError> {
    let submission = normalize(body)?.with_source_fallback(origin);
    validate(submission)
}

fn render_accepted(lead: &ValidatedLead) -> Result<(), AppError> {
    println!("Lead accepted");
    println!("- kind: {}", lead.form_kind());
    if !lead.form_kind().is_known() {
        println!("  (unrecognized kind, forwarded as-is)");
    }
    println!("- name: {}", lead.name());
    println!("- email: {}", lead.email());
    if !lead.phone().is_empty() {
        println!("- phone: {}", lead.phone());
    }
    if !lead.source().is_empty() {
        println!("- source: {}", lead.source());
    }
    for (key, value) in lead.extra() {
        println!("- {key}: {value}");
    }

    println!("\nUpstream body");
    print_json(lead)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}
