//! Outbound mail: forward-message composition and the sending collaborator.

pub mod composer;
pub mod sender;

pub use composer::{
    AttachmentData, AttachmentSource, ForwardMessage, LocalFiles, MailComposer, MultipartKind,
};
pub use sender::{MailSender, SendReceipt, SmtpConfig, SmtpMailSender, send_forward};
