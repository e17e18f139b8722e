//! One-time-passcode lookup in HTML bodies.
//!
//! The passcode lives in a single `<p class="otp">` element. Zero matches
//! means no passcode; several matches is an anomaly that callers log and
//! then treat as no passcode.

use std::sync::LazyLock;

use scraper::{Html, Selector};

/// CSS selector for the passcode marker element.
pub const OTP_SELECTOR: &str = "p.otp";

static OTP_MARKER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(OTP_SELECTOR).expect("OTP selector is valid CSS"));

/// Result of looking for a passcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpLookup {
    /// Exactly one marker with non-empty text.
    Found(String),
    /// No marker, or a single marker with blank text.
    NotFound,
    /// More than one marker; the number of matches is kept for logging.
    Ambiguous(usize),
}

impl OtpLookup {
    /// The passcode, treating every anomaly as absence.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Found(token) => Some(token),
            Self::NotFound | Self::Ambiguous(_) => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous(_))
    }
}

/// Scan `html` for the passcode marker.
///
/// Plain-text input parses as a document without markers, so it yields
/// [`OtpLookup::NotFound`].
pub fn extract_otp(html: &str) -> OtpLookup {
    let document = Html::parse_document(html);
    let matches: Vec<_> = document.select(&OTP_MARKER).collect();

    match matches.as_slice() {
        [] => OtpLookup::NotFound,
        [element] => {
            let text = element.text().collect::<String>();
            let token = text.trim();
            if token.is_empty() {
                OtpLookup::NotFound
            } else {
                OtpLookup::Found(token.to_string())
            }
        }
        many => OtpLookup::Ambiguous(many.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_marker_found() {
        assert_eq!(
            extract_otp(r#"<p class="otp">123456</p>"#),
            OtpLookup::Found("123456".into())
        );
    }

    #[test]
    fn text_is_trimmed() {
        let html = "<html><body><p class=\"otp\">\n   987654 \n</p></body></html>";
        assert_eq!(extract_otp(html).token(), Some("987654"));
    }

    #[test]
    fn nested_markup_text_is_joined() {
        let html = r#"<p class="otp"><b>12</b>34</p>"#;
        assert_eq!(extract_otp(html).token(), Some("1234"));
    }

    #[test]
    fn marker_among_other_classes() {
        let html = r#"<p class="code otp large">4242</p>"#;
        assert_eq!(extract_otp(html).token(), Some("4242"));
    }

    #[test]
    fn wrong_tag_is_ignored() {
        let html = r#"<div class="otp">111111</div><span class="otp">222222</span>"#;
        assert_eq!(extract_otp(html), OtpLookup::NotFound);
    }

    #[test]
    fn no_marker_not_found() {
        assert_eq!(extract_otp("<p>Hello</p>"), OtpLookup::NotFound);
    }

    #[test]
    fn plain_text_not_found() {
        assert_eq!(extract_otp("Your code is 123456"), OtpLookup::NotFound);
    }

    #[test]
    fn empty_input_not_found() {
        assert_eq!(extract_otp(""), OtpLookup::NotFound);
    }

    #[test]
    fn blank_marker_not_found() {
        assert_eq!(extract_otp(r#"<p class="otp">   </p>"#), OtpLookup::NotFound);
    }

    #[test]
    fn two_markers_ambiguous() {
        let html = r#"<p class="otp">111111</p><p class="otp">222222</p>"#;
        let lookup = extract_otp(html);
        assert_eq!(lookup, OtpLookup::Ambiguous(2));
        assert!(lookup.is_ambiguous());
        assert_eq!(lookup.token(), None);
    }
}
