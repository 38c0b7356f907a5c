/// Lead submissions by terminal outcome. Tagged with `outcome`.
pub const LEAD_SUBMISSIONS: &str = "lead_submissions_total";

pub const OUTCOME_FORWARDED: &str = "forwarded";
pub const OUTCOME_SPAM: &str = "spam";

pub fn describe() {
    metrics::describe_counter!(
        LEAD_SUBMISSIONS,
        "Lead submissions handled by the gateway, tagged with outcome"
    );
}

pub fn record_outcome(outcome: &'static str) {
    metrics::counter!(LEAD_SUBMISSIONS, "outcome" => outcome).increment(1);
}
