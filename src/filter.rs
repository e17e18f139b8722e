//! Receipt-time sender filter.
//!
//! Runs on the mail service's receipt notification, before the email is
//! stored. A `From` header equal to one of the blocked values stops the
//! receipt rule; anything else lets processing continue.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Blocked `From` values used when none are configured.
pub const DEFAULT_BLOCKED_SENDERS: &[&str] = &[
    "Amazon.com <store-news@amazon.com>",
    "Amazon.com <store_news@amazon.com>",
];

/// Receipt notification: `{"Records": [{"ses": {"mail": {"headers": [...]}}}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<ReceiptRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptRecord {
    pub ses: ReceiptNotification,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptNotification {
    pub mail: ReceiptMail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptMail {
    #[serde(default)]
    pub headers: Vec<MailHeader>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailHeader {
    pub name: String,
    pub value: String,
}

/// Rule-set disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Disposition {
    #[serde(rename = "STOP_RULE")]
    StopRule,
}

#[derive(Debug, Serialize)]
struct DispositionReply {
    disposition: Disposition,
}

/// Stops receipt for exact `From` header matches.
#[derive(Debug, Clone)]
pub struct SenderFilter {
    blocked: Vec<String>,
}

impl SenderFilter {
    pub fn new(blocked: Vec<String>) -> Self {
        Self { blocked }
    }

    pub fn blocked(&self) -> &[String] {
        &self.blocked
    }

    /// `Some(StopRule)` if a `From` header is blocked, `None` to continue.
    ///
    /// Only the first record is inspected. Header values are compared
    /// exactly, display name included.
    pub fn evaluate(&self, event: &ReceiptEvent) -> Option<Disposition> {
        let record = event.records.first()?;
        for header in record.ses.mail.headers.iter().filter(|h| h.name == "From") {
            info!(from = %header.value, "Checking sender");
            if self.blocked.iter().any(|b| b == &header.value) {
                info!(from = %header.value, "Found blocked sender");
                return Some(Disposition::StopRule);
            }
        }
        None
    }

    /// JSON reply for the mail service: `{"disposition":"STOP_RULE"}` or `null`.
    pub fn disposition_json(&self, event: &ReceiptEvent) -> serde_json::Result<String> {
        match self.evaluate(event) {
            Some(disposition) => serde_json::to_string(&DispositionReply { disposition }),
            None => Ok("null".to_string()),
        }
    }
}

impl Default for SenderFilter {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKED_SENDERS.iter().map(|s| s.to_string()).collect())
    }
}
