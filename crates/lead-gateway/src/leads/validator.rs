use chrono::{DateTime, Utc};

use super::domain::{LeadSubmission, ValidatedLead};
use super::error::LeadError;

/// Result of gating a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted(ValidatedLead),
    /// Honeypot tripped. Answered as a success, never forwarded.
    Spam,
}

/// Checks required fields first, then the honeypot.
pub fn validate(submission: LeadSubmission) -> Result<Verdict, LeadError> {
    validate_at(submission, Utc::now())
}

pub fn validate_at(
    submission: LeadSubmission,
    submitted_at: DateTime<Utc>,
) -> Result<Verdict, LeadError> {
    let name = required(submission.name());
    let email = required(submission.email());

    let (name, email) = match (name, email) {
        (Some(name), Some(email)) => (name, email),
        (name, email) => {
            let mut missing = Vec::new();
            if name.is_none() {
                missing.push("name");
            }
            if email.is_none() {
                missing.push("email");
            }
            return Err(LeadError::Validation { missing });
        }
    };

    if !submission.honeypot().is_empty() {
        return Ok(Verdict::Spam);
    }

    Ok(Verdict::Accepted(ValidatedLead::from_submission(
        submission,
        name,
        email,
        submitted_at,
    )))
}

fn required(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
