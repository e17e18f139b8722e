//! Error types for Mail Sorter.

use crate::pipeline::types::Stage;

/// Top-level error type for the sorter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Send error: {0}")]
    Send(#[from] SendError),

    #[error("Compose error: {0}")]
    Compose(#[from] ComposeError),

    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Raw message bytes that could not be turned into an envelope.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Malformed message: {0}")]
    Malformed(String),
}

/// Object-storage collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object not found: {container}/{key}")]
    NotFound { container: String, key: String },

    #[error("Storage request {operation} failed for {container}/{key}: {reason}")]
    Request {
        operation: &'static str,
        container: String,
        key: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Mail-sending collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Transport failed: {0}")]
    Transport(String),

    #[error("Send was not confirmed by the mail service")]
    Unconfirmed,

    #[error("Compose failed: {0}")]
    Compose(#[from] ComposeError),
}

/// Errors building a forward message.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("At least one recipient is required")]
    NoRecipients,

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to read attachment {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build message: {0}")]
    Build(String),
}

/// Trigger payload errors.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("Event contains no records")]
    NoRecords,

    #[error("Event record names an empty bucket")]
    EmptyContainer,

    #[error("Invalid event JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Terminal pipeline failures.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] MessageError),

    #[error("Storage failure during {stage}: {source}")]
    Storage {
        stage: Stage,
        #[source]
        source: StorageError,
    },
}

/// Result type alias for the sorter.
pub type Result<T> = std::result::Result<T, Error>;
