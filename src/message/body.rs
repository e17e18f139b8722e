//! Body selection: picks the single text the pipeline operates on.
//!
//! Multipart messages contribute their first immediate part that decodes
//! to non-empty UTF-8 text. Later parts (the HTML alternative,
//! attachments) are never concatenated in.

use mail_parser::decoders::base64::base64_decode;
use mail_parser::decoders::quoted_printable::quoted_printable_decode;
use mail_parser::{Message, MessagePart, MimeHeaders, PartType};
use tracing::debug;

/// Text chosen from a message, plus whether the message was multipart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedBody {
    pub text: String,
    pub is_multipart: bool,
}

/// Select the body text of a parsed message. May be empty.
pub fn extract_body(message: &Message<'_>) -> ExtractedBody {
    let root = message.root_part();
    match &root.body {
        PartType::Multipart(children) => {
            let text = children
                .iter()
                .filter_map(|id| message.part(*id))
                .map(|part| decode_part(message, part))
                .find(|text| !text.is_empty())
                .unwrap_or_default();
            ExtractedBody {
                text,
                is_multipart: true,
            }
        }
        _ => ExtractedBody {
            text: decode_part(message, root),
            is_multipart: false,
        },
    }
}

/// Decode one part's payload as UTF-8 text.
///
/// Nested containers and undecodable payloads count as empty. Text parts
/// are checked against their transfer-decoded bytes, since the parser
/// has already replaced invalid sequences in the decoded text.
fn decode_part(message: &Message<'_>, part: &MessagePart<'_>) -> String {
    match &part.body {
        PartType::Text(text) | PartType::Html(text) => match transfer_decoded(message, part) {
            Some(bytes) if std::str::from_utf8(&bytes).is_ok() => text.to_string(),
            _ => {
                debug!("Skipping text part that is not valid UTF-8");
                String::new()
            }
        },
        PartType::Binary(bytes) | PartType::InlineBinary(bytes) => {
            match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(e) => {
                    debug!(error = %e, "Skipping part that is not valid UTF-8");
                    String::new()
                }
            }
        }
        PartType::Message(_) | PartType::Multipart(_) => String::new(),
    }
}

/// Raw body bytes of a part with its Content-Transfer-Encoding undone.
fn transfer_decoded(message: &Message<'_>, part: &MessagePart<'_>) -> Option<Vec<u8>> {
    let raw = message
        .raw_message
        .get(part.raw_body_offset() as usize..part.raw_end_offset() as usize)?;
    match part
        .content_transfer_encoding()
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("base64") => base64_decode(raw),
        Some("quoted-printable") => quoted_printable_decode(raw),
        _ => Some(raw.to_vec()),
    }
}
