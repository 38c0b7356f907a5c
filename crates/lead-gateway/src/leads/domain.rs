use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Intent category of a lead. Unknown labels are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormKind {
    Buyer,
    Seller,
    Partner,
    OffMarket,
    PrivateMatch,
    PrivateSell,
    Referral,
    #[default]
    Generic,
    Other(String),
}

impl FormKind {
    /// Maps a client label onto a known kind, tolerating case, `-` and spaces.
    pub fn from_label(raw: &str) -> Self {
        let canonical: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        match canonical.as_str() {
            "buyer" => Self::Buyer,
            "seller" => Self::Seller,
            "partner" => Self::Partner,
            "off_market" => Self::OffMarket,
            "private_match" => Self::PrivateMatch,
            "private_sell" => Self::PrivateSell,
            "referral" => Self::Referral,
            "generic" => Self::Generic,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Partner => "partner",
            Self::OffMarket => "off_market",
            Self::PrivateMatch => "private_match",
            Self::PrivateSell => "private_sell",
            Self::Referral => "referral",
            Self::Generic => "generic",
            Self::Other(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for FormKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Canonical lead as produced by the normalizer. Immutable once built.
///
/// `name` and `email` stay `None` when the client omitted them so the
/// validator can tell an absent field from a blank one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadSubmission {
    form_kind: FormKind,
    name: Option<String>,
    email: Option<String>,
    phone: String,
    message: String,
    source: String,
    honeypot: String,
    extra: BTreeMap<String, String>,
}

impl LeadSubmission {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        form_kind: FormKind,
        name: Option<String>,
        email: Option<String>,
        phone: String,
        message: String,
        source: String,
        honeypot: String,
        extra: BTreeMap<String, String>,
    ) -> Self {
        Self {
            form_kind,
            name,
            email,
            phone,
            message,
            source,
            honeypot,
            extra,
        }
    }

    pub fn form_kind(&self) -> &FormKind {
        &self.form_kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn honeypot(&self) -> &str {
        &self.honeypot
    }

    /// Form answers without a canonical field, keyed as the client sent them.
    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    /// Returns a copy whose `source` is `fallback` when the payload carried none.
    pub fn with_source_fallback(self, fallback: Option<&str>) -> Self {
        match fallback.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) if self.source.is_empty() => Self {
                source: value.to_string(),
                ..self
            },
            _ => self,
        }
    }
}

/// A lead that passed validation; the only input the forwarder accepts.
///
/// Serializes to the upstream request body. The honeypot never makes it this far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedLead {
    form_kind: FormKind,
    name: String,
    email: String,
    phone: String,
    message: String,
    source: String,
    submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    extra: BTreeMap<String, String>,
}

impl ValidatedLead {
    pub(crate) fn from_submission(
        submission: LeadSubmission,
        name: String,
        email: String,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            form_kind: submission.form_kind,
            name,
            email,
            phone: submission.phone,
            message: submission.message,
            source: submission.source,
            submitted_at,
            extra: submission.extra,
        }
    }

    pub fn form_kind(&self) -> &FormKind {
        &self.form_kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }
}
