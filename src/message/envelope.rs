//! Envelope parsing: raw bytes to routing-relevant fields.

use mail_parser::{HeaderName, Message, MessageParser};
use tracing::debug;

use crate::error::MessageError;
use crate::message::body::extract_body;

/// Routing-relevant view of one parsed email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// First address found in the `From` header.
    pub sender: String,
    /// First address found in the `To` header.
    pub recipient: String,
    pub subject: String,
    /// Selected body text; empty when nothing usable was found.
    pub body_text: String,
    pub is_multipart: bool,
}

impl Envelope {
    /// Whether there is anything for the pipeline to work on.
    pub fn has_body(&self) -> bool {
        !self.body_text.is_empty()
    }
}

/// Parse raw message bytes into an [`Envelope`].
///
/// Fails with [`MessageError::Malformed`] when the bytes do not form a
/// message or when `To`/`From` carry no address.
pub fn parse_envelope(raw: &[u8]) -> Result<Envelope, MessageError> {
    let message = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| MessageError::Malformed("unparseable message structure".into()))?;

    let recipient = required_address(&message, HeaderName::To, "To")?;
    let sender = required_address(&message, HeaderName::From, "From")?;
    let subject = message.subject().unwrap_or_default().to_string();
    let extracted = extract_body(&message);

    debug!(
        sender = %sender,
        recipient = %recipient,
        multipart = extracted.is_multipart,
        body_len = extracted.text.len(),
        "Parsed envelope"
    );

    Ok(Envelope {
        sender,
        recipient,
        subject,
        body_text: extracted.text,
        is_multipart: extracted.is_multipart,
    })
}

fn required_address<'x>(
    message: &Message<'x>,
    header: HeaderName<'x>,
    label: &str,
) -> Result<String, MessageError> {
    let raw = message
        .header_raw(header)
        .ok_or_else(|| MessageError::Malformed(format!("missing {label} header")))?;
    first_address(raw)
        .ok_or_else(|| MessageError::Malformed(format!("no address in {label} header")))
}

/// Pick the first address-looking token out of a raw header value.
///
/// Splits on whitespace, keeps tokens containing `@`, and trims the
/// surrounding `<`, `>`, `"`, `,` and `;` characters. Edge cases:
/// - `Name <addr@host>` and bare `addr@host` both yield `addr@host`.
/// - A multi-recipient header (`a@x.com, b@y.com`) yields only `a@x.com`.
/// - A quoted display name containing `@` wins over the real address.
/// - Encoded words are not decoded; they rarely contain `@`.
pub fn first_address(header: &str) -> Option<String> {
    header
        .split_whitespace()
        .filter(|token| token.contains('@'))
        .map(|token| token.trim_matches(|c| matches!(c, '<' | '>' | '"' | ',' | ';')))
        .find(|address| address.contains('@'))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── first_address tests ─────────────────────────────────────────

    #[test]
    fn address_bare() {
        assert_eq!(
            first_address(" user@example.com\r\n").as_deref(),
            Some("user@example.com")
        );
    }

    #[test]
    fn address_with_display_name() {
        assert_eq!(
            first_address("Jane Doe <jane@example.com>").as_deref(),
            Some("jane@example.com")
        );
    }

    #[test]
    fn address_multiple_recipients_collapse_to_first() {
        assert_eq!(
            first_address("a@x.com, b@y.com").as_deref(),
            Some("a@x.com")
        );
    }

    #[test]
    fn address_folded_header() {
        assert_eq!(
            first_address("\"Giveaways\"\r\n <giveaway-notification@amazon.com>").as_deref(),
            Some("giveaway-notification@amazon.com")
        );
    }

    #[test]
    fn address_missing() {
        assert_eq!(first_address("undisclosed-recipients:;"), None);
        assert_eq!(first_address(""), None);
    }

    // ── parse_envelope tests ────────────────────────────────────────

    #[test]
    fn parse_single_part_plain() {
        let raw = b"From: Notify <notify@other.com>\r\n\
To: user@example.com\r\n\
Subject: Your code\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Hello there\r\n";
        let env = parse_envelope(raw).unwrap();
        assert_eq!(env.sender, "notify@other.com");
        assert_eq!(env.recipient, "user@example.com");
        assert_eq!(env.subject, "Your code");
        assert!(env.body_text.contains("Hello there"));
        assert!(!env.is_multipart);
        assert!(env.has_body());
    }

    #[test]
    fn parse_missing_to_is_malformed() {
        let raw = b"From: notify@other.com\r\nSubject: x\r\n\r\nbody\r\n";
        let err = parse_envelope(raw).unwrap_err();
        assert!(err.to_string().contains("To"));
    }

    #[test]
    fn parse_missing_from_is_malformed() {
        let raw = b"To: user@example.com\r\nSubject: x\r\n\r\nbody\r\n";
        let err = parse_envelope(raw).unwrap_err();
        assert!(err.to_string().contains("From"));
    }

    #[test]
    fn parse_empty_body_yields_empty_text() {
        let raw = b"From: notify@other.com\r\nTo: user@example.com\r\nSubject: x\r\n\r\n";
        let env = parse_envelope(raw).unwrap();
        assert!(!env.has_body());
    }

    #[test]
    fn parse_missing_subject_defaults_to_empty() {
        let raw = b"From: notify@other.com\r\nTo: user@example.com\r\n\r\nhi\r\n";
        let env = parse_envelope(raw).unwrap();
        assert_eq!(env.subject, "");
    }
}
