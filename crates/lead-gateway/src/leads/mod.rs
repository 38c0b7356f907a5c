//! Lead intake: turns visitor-submitted contact forms into canonical leads and
//! hands accepted ones to the notification service.
//!
//! Request flow: CORS -> configuration check -> [`normalizer`] -> [`validator`]
//! -> [`forwarder`] -> [`response`]. Every path ends in a [`GatewayResponse`].

pub mod cors;
pub mod domain;
pub mod error;
pub mod forwarder;
pub mod metrics;
pub mod normalizer;
pub mod response;
pub mod router;
pub mod service;
pub mod validator;

pub use cors::CorsPolicy;
pub use domain::{FormKind, LeadSubmission, ValidatedLead};
pub use error::LeadError;
pub use forwarder::{HttpLeadForwarder, LeadForwarder, UpstreamReply};
pub use response::GatewayResponse;
pub use router::{lead_router, LEAD_ROUTES};
pub use service::{LeadGateway, SubmissionOutcome};
pub use validator::Verdict;
