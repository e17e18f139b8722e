//! Forward-message composition.
//!
//! Builds a multipart message from optional text/HTML bodies and file
//! attachments. The container is `multipart/alternative` when both bodies
//! are present and `multipart/mixed` otherwise.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lettre::Message;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use uuid::Uuid;

use crate::error::ComposeError;

/// Reads attachment bytes from a filesystem-like source.
pub trait AttachmentSource: Send + Sync {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// Attachments read from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl AttachmentSource for LocalFiles {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Multipart container subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipartKind {
    Alternative,
    Mixed,
}

impl MultipartKind {
    pub fn subtype(&self) -> &'static str {
        match self {
            Self::Alternative => "alternative",
            Self::Mixed => "mixed",
        }
    }
}

/// A file attached to a forward message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentData {
    pub filename: String,
    pub data: Vec<u8>,
}

/// A message ready for the mail-sending collaborator. Never persisted.
#[derive(Debug, Clone)]
pub struct ForwardMessage {
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub text_part: Option<String>,
    pub html_part: Option<String>,
    pub attachments: Vec<AttachmentData>,
    pub message_id: String,
}

impl ForwardMessage {
    pub fn content_kind(&self) -> MultipartKind {
        if self.text_part.is_some() && self.html_part.is_some() {
            MultipartKind::Alternative
        } else {
            MultipartKind::Mixed
        }
    }

    /// Render the message as RFC 5322 bytes.
    pub fn to_raw(&self) -> Result<Vec<u8>, ComposeError> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&self.sender)?)
            .subject(self.subject.clone())
            .message_id(Some(self.message_id.clone()));
        for recipient in &self.recipients {
            builder = builder.to(parse_mailbox(recipient)?);
        }

        let mut parts = self.single_parts()?.into_iter();
        let message = match parts.next() {
            None => builder.body(String::new()),
            Some(first) => {
                let start = match self.content_kind() {
                    MultipartKind::Alternative => MultiPart::alternative().singlepart(first),
                    MultipartKind::Mixed => MultiPart::mixed().singlepart(first),
                };
                builder.multipart(parts.fold(start, |multipart, part| multipart.singlepart(part)))
            }
        }
        .map_err(|e| ComposeError::Build(e.to_string()))?;

        Ok(message.formatted())
    }

    fn single_parts(&self) -> Result<Vec<SinglePart>, ComposeError> {
        let mut parts = Vec::new();
        if let Some(text) = &self.text_part {
            parts.push(SinglePart::plain(text.clone()));
        }
        if let Some(html) = &self.html_part {
            parts.push(SinglePart::html(html.clone()));
        }
        if !self.attachments.is_empty() {
            let octet_stream = ContentType::parse("application/octet-stream")
                .map_err(|e| ComposeError::Build(e.to_string()))?;
            for attachment in &self.attachments {
                parts.push(
                    Attachment::new(attachment.filename.clone())
                        .body(attachment.data.clone(), octet_stream.clone()),
                );
            }
        }
        Ok(parts)
    }
}

/// Builds [`ForwardMessage`]s, reading attachments from its source.
#[derive(Clone)]
pub struct MailComposer {
    attachments: Arc<dyn AttachmentSource>,
}

impl MailComposer {
    pub fn new(attachments: Arc<dyn AttachmentSource>) -> Self {
        Self { attachments }
    }

    /// Compose a message. Any unreadable attachment fails the whole call.
    pub fn compose(
        &self,
        sender: &str,
        recipients: &[String],
        subject: &str,
        text: Option<&str>,
        html: Option<&str>,
        attachment_paths: &[PathBuf],
    ) -> Result<ForwardMessage, ComposeError> {
        if recipients.is_empty() {
            return Err(ComposeError::NoRecipients);
        }
        parse_mailbox(sender)?;
        for recipient in recipients {
            parse_mailbox(recipient)?;
        }

        let attachments = attachment_paths
            .iter()
            .map(|path| self.read_attachment(path))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ForwardMessage {
            sender: sender.to_string(),
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            text_part: text.filter(|t| !t.is_empty()).map(str::to_string),
            html_part: html.filter(|h| !h.is_empty()).map(str::to_string),
            attachments,
            message_id: new_message_id(sender),
        })
    }

    fn read_attachment(&self, path: &Path) -> Result<AttachmentData, ComposeError> {
        let data = self
            .attachments
            .read(path)
            .map_err(|source| ComposeError::Attachment {
                path: path.display().to_string(),
                source,
            })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        Ok(AttachmentData { filename, data })
    }
}

impl Default for MailComposer {
    fn default() -> Self {
        Self::new(Arc::new(LocalFiles))
    }
}

impl std::fmt::Debug for MailComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailComposer").finish_non_exhaustive()
    }
}

/// Parse `addr@host` or `Name <addr@host>`.
pub fn parse_mailbox(address: &str) -> Result<Mailbox, ComposeError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| ComposeError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

fn new_message_id(sender: &str) -> String {
    let domain = parse_mailbox(sender)
        .map(|mailbox| mailbox.email.domain().to_string())
        .unwrap_or_else(|_| "localhost".to_string());
    format!("<{}@{}>", Uuid::new_v4(), domain)
}
