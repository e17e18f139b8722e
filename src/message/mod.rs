//! Inbound message parsing: envelope fields, body selection, OTP lookup.

pub mod body;
pub mod envelope;
pub mod otp;

pub use body::{ExtractedBody, extract_body};
pub use envelope::{Envelope, first_address, parse_envelope};
pub use otp::{OtpLookup, extract_otp};
