use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// local@domain.tld, with at least one dot in the domain part
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Event {
    pub id: String,
    pub title: String,
    // Stored as an ISO date (YYYY-MM-DD) or RFC 3339 timestamp
    pub date: String,
    pub time: String,
    pub location: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub organizer: String,
    #[serde(rename = "interestedUserIds", default)]
    pub interested_user_ids: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// A resolved `(name, email)` pair targeted by one invitation send.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

impl From<&User> for Recipient {
    fn from(user: &User) -> Self {
        Recipient {
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Subject and body of an invitation, rendered or not.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MessageTemplate {
    pub subject: String,
    pub body: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Failed,
    NotAttempted,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeliveryAttempt {
    #[serde(rename = "recipientEmail")]
    pub recipient_email: String,
    pub outcome: DeliveryOutcome,
    #[serde(rename = "errorDetail", skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl DeliveryAttempt {
    pub fn sent(email: &str) -> Self {
        Self {
            recipient_email: email.to_string(),
            outcome: DeliveryOutcome::Sent,
            error_detail: None,
        }
    }

    pub fn failed(email: &str, detail: impl Into<String>) -> Self {
        Self {
            recipient_email: email.to_string(),
            outcome: DeliveryOutcome::Failed,
            error_detail: Some(detail.into()),
        }
    }

    pub fn not_attempted(email: &str) -> Self {
        Self {
            recipient_email: email.to_string(),
            outcome: DeliveryOutcome::NotAttempted,
            error_detail: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FailedRecipient {
    pub email: String,
    #[serde(rename = "errorDetail")]
    pub error_detail: String,
}

/// Aggregate outcome of one invitation batch.
///
/// `total_attempted` is always `succeeded + failed`. Recipients skipped
/// because the batch was cancelled are counted in `not_attempted` only.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    #[serde(rename = "totalAttempted")]
    pub total_attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(rename = "failedRecipients")]
    pub failed_recipients: Vec<FailedRecipient>,
    #[serde(rename = "notAttempted", default, skip_serializing_if = "is_zero")]
    pub not_attempted: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl DeliveryReport {
    /// Folds attempts into a report. Failure order follows attempt order.
    pub fn from_attempts<I>(attempts: I) -> Self
    where
        I: IntoIterator<Item = DeliveryAttempt>,
    {
        attempts
            .into_iter()
            .fold(DeliveryReport::default(), |mut report, attempt| {
                match attempt.outcome {
                    DeliveryOutcome::Sent => {
                        report.succeeded += 1;
                        report.total_attempted += 1;
                    }
                    DeliveryOutcome::Failed => {
                        report.failed += 1;
                        report.total_attempted += 1;
                        report.failed_recipients.push(FailedRecipient {
                            email: attempt.recipient_email,
                            error_detail: attempt.error_detail.unwrap_or_default(),
                        });
                    }
                    DeliveryOutcome::NotAttempted => {
                        report.not_attempted += 1;
                        report.cancelled = true;
                    }
                }
                report
            })
    }

    /// True when some sends failed and at least one went through.
    pub fn is_partial_success(&self) -> bool {
        self.succeeded > 0 && self.failed > 0
    }
}

// Response DTOs for general use across services
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

/// Simple `local@domain.tld` syntax check used wherever emails enter the system.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Case-insensitive identity key for an email address.
pub fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}
