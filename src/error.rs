use thiserror::Error;

use crate::api::ApiErrorBody;

/// Application-level errors using thiserror for structured error handling.
///
/// These errors represent domain-specific failures that can occur while
/// talking to the profile service or managing configuration. They provide
/// context and can be chained with anyhow.

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Profile service returned status {0}")]
    UnexpectedStatus(u16),

    #[error("Failed to decode profile service response")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The service understood the request and rejected it with a
    /// machine-readable code (nickname taken, age requirement, ...).
    #[error("Profile service rejected the request: {}", body.message)]
    Rejected { status: u16, body: ApiErrorBody },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the platform config directory")]
    NoConfigDir,
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
