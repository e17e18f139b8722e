//! Two-way classification of parsed envelopes.
//!
//! - Sender equals the notification address → `ForwardGiveaway`
//! - Anything else → `Sort`, carrying the OTP when one is found
//!
//! There is no third path. An empty body still classifies as `Sort`.

use tracing::{debug, warn};

use crate::message::{Envelope, OtpLookup, extract_otp};
use crate::pipeline::types::RoutingDecision;

/// Default automated-notification sender.
pub const DEFAULT_NOTIFICATION_SENDER: &str = "giveaway-notification@amazon.com";

/// Static configuration for the forward path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTarget {
    /// Verified sender address used on forwarded mail.
    pub from_address: String,
    /// Forwarding mailboxes, in order.
    pub to_addresses: Vec<String>,
}

/// Classifies envelopes into a [`RoutingDecision`].
#[derive(Debug, Clone)]
pub struct Classifier {
    notification_sender: String,
    forward: ForwardTarget,
}

impl Classifier {
    pub fn new(notification_sender: impl Into<String>, forward: ForwardTarget) -> Self {
        Self {
            notification_sender: notification_sender.into(),
            forward,
        }
    }

    /// The address that selects the forward path.
    pub fn notification_sender(&self) -> &str {
        &self.notification_sender
    }

    /// Decide how the envelope is handled.
    ///
    /// The sender check is an exact, case-sensitive comparison.
    pub fn classify(&self, envelope: &Envelope) -> RoutingDecision {
        if envelope.sender == self.notification_sender {
            debug!(sender = %envelope.sender, "Sender matches notification address");
            return RoutingDecision::ForwardGiveaway {
                from_address: self.forward.from_address.clone(),
                to_addresses: self.forward.to_addresses.clone(),
            };
        }

        let otp = match extract_otp(&envelope.body_text) {
            OtpLookup::Found(token) => {
                debug!(otp = %token, "Found OTP");
                Some(token)
            }
            OtpLookup::NotFound => {
                debug!("No OTP marker in body");
                None
            }
            OtpLookup::Ambiguous(count) => {
                warn!(
                    count,
                    recipient = %envelope.recipient,
                    "Multiple OTP markers found, treating OTP as absent"
                );
                None
            }
        };

        RoutingDecision::Sort { otp }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(
            DEFAULT_NOTIFICATION_SENDER,
            ForwardTarget {
                from_address: "forwarder@mine.com".into(),
                to_addresses: vec!["me@mine.com".into()],
            },
        )
    }

    fn envelope(sender: &str, body: &str) -> Envelope {
        Envelope {
            sender: sender.into(),
            recipient: "user@example.com".into(),
            subject: "Subject".into(),
            body_text: body.into(),
            is_multipart: false,
        }
    }

    #[test]
    fn notification_sender_forwards() {
        let decision = classifier().classify(&envelope(DEFAULT_NOTIFICATION_SENDER, "<p>You won</p>"));
        assert_eq!(
            decision,
            RoutingDecision::ForwardGiveaway {
                from_address: "forwarder@mine.com".into(),
                to_addresses: vec!["me@mine.com".into()],
            }
        );
        assert_eq!(decision.label(), "forward_giveaway");
    }

    #[test]
    fn notification_sender_ignores_otp_marker() {
        let decision = classifier().classify(&envelope(
            DEFAULT_NOTIFICATION_SENDER,
            r#"<p class="otp">123456</p>"#,
        ));
        assert!(matches!(decision, RoutingDecision::ForwardGiveaway { .. }));
    }

    #[test]
    fn sender_match_is_case_sensitive() {
        let decision = classifier().classify(&envelope("Giveaway-Notification@amazon.com", ""));
        assert_eq!(decision, RoutingDecision::Sort { otp: None });
    }

    #[test]
    fn other_sender_sorts_with_otp() {
        let decision =
            classifier().classify(&envelope("notify@other.com", r#"<p class="otp">123456</p>"#));
        assert_eq!(
            decision,
            RoutingDecision::Sort {
                otp: Some("123456".into())
            }
        );
    }

    #[test]
    fn other_sender_sorts_without_otp() {
        let decision = classifier().classify(&envelope("notify@other.com", "plain text body"));
        assert_eq!(decision, RoutingDecision::Sort { otp: None });
        assert_eq!(decision.label(), "sort");
    }

    #[test]
    fn ambiguous_otp_degrades_to_absent() {
        let decision = classifier().classify(&envelope(
            "notify@other.com",
            r#"<p class="otp">1</p><p class="otp">2</p>"#,
        ));
        assert_eq!(decision, RoutingDecision::Sort { otp: None });
    }

    #[test]
    fn empty_body_still_sorts() {
        let decision = classifier().classify(&envelope("notify@other.com", ""));
        assert_eq!(decision, RoutingDecision::Sort { otp: None });
    }
}
