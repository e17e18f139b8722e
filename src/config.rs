//! Configuration types, read from the environment.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::filter::DEFAULT_BLOCKED_SENDERS;
use crate::mail::SmtpConfig;
use crate::pipeline::classifier::{DEFAULT_NOTIFICATION_SENDER, ForwardTarget};

/// Where stored emails live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// S3, credentials and region from the standard AWS environment.
    S3,
    /// Directory tree: container = subdirectory of the root.
    Filesystem(PathBuf),
}

/// Routing pipeline configuration.
#[derive(Debug, Clone)]
pub struct SorterConfig {
    /// Exact-match sender that selects the forward path.
    pub notification_sender: String,
    /// Verified sender and mailbox list for forwarded notifications.
    pub forward: ForwardTarget,
    pub storage: StorageBackend,
    pub smtp: SmtpConfig,
}

impl SorterConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let notification_sender = lookup("MAIL_SORTER_NOTIFICATION_SENDER")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_NOTIFICATION_SENDER.to_string());

        let from_address = required(&lookup, "MAIL_SORTER_FORWARD_FROM")?;
        let to_addresses = comma_list(&required(&lookup, "MAIL_SORTER_FORWARD_TO")?);
        if to_addresses.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "MAIL_SORTER_FORWARD_TO".into(),
                message: "at least one forwarding address is required".into(),
            });
        }

        let storage = match lookup("MAIL_SORTER_STORAGE_ROOT").filter(|s| !s.trim().is_empty()) {
            Some(root) => StorageBackend::Filesystem(PathBuf::from(root)),
            None => StorageBackend::S3,
        };

        let host = required(&lookup, "SMTP_HOST")?;
        let port = match lookup("SMTP_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "SMTP_PORT".into(),
                message: e.to_string(),
            })?,
            None => 587,
        };
        let username = lookup("SMTP_USERNAME").unwrap_or_default();
        let password = SecretString::from(lookup("SMTP_PASSWORD").unwrap_or_default());

        Ok(Self {
            notification_sender,
            forward: ForwardTarget {
                from_address,
                to_addresses,
            },
            storage,
            smtp: SmtpConfig {
                host,
                port,
                username,
                password,
            },
        })
    }
}

/// Receipt-time spam filter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Exact `From` header values that stop receipt.
    pub blocked_senders: Vec<String>,
}

impl FilterConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let blocked_senders = lookup("MAIL_SORTER_BLOCKED_SENDERS")
            .map(|raw| comma_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| DEFAULT_BLOCKED_SENDERS.iter().map(|s| s.to_string()).collect());
        Self { blocked_senders }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    lookup(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
