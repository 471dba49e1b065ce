//! Error types for the operations layer.

use std::path::PathBuf;

use thiserror::Error;
use voyager_core::ParseError;

/// Result type for operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Errors that can occur during operations.
#[derive(Debug, Error)]
pub enum OpsError {
    /// Introspection could not be retrieved.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Schema text could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The chooser refused to commit.
    #[error(transparent)]
    CommitBlocked(#[from] CommitBlocked),

    /// A required input is missing or invalid. Fatal to the feature that needs it.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Preset name not present in the presets mapping.
    #[error("Unknown preset: {name}")]
    UnknownPreset { name: String },

    /// Presets file or directory could not be read.
    #[error("Failed to load presets from {path}: {message}")]
    PresetLoad { path: PathBuf, message: String },

    /// Rendering failed.
    #[error("Render failed: {0}")]
    Render(String),

    /// The dispatcher loop is no longer running.
    #[error("Dispatcher has shut down")]
    DispatcherClosed,

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OpsError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a preset loading error.
    pub fn preset_load(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::PresetLoad {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Failure while fetching introspection from an endpoint.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with GraphQL errors.
    #[error("GraphQL errors: {}", messages.join("; "))]
    GraphQl { messages: Vec<String> },

    /// The response body is not a usable introspection result.
    #[error("invalid introspection response: {0}")]
    InvalidPayload(String),
}

impl FetchError {
    /// Message surfaced to the user via the store's error slot.
    ///
    /// A server-provided body wins; otherwise `Error loading: <status>`.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Status { status, body } => {
                if body.trim().is_empty() {
                    format!("Error loading: {}", status)
                } else {
                    body.clone()
                }
            }
            FetchError::Transport(reason) => format!("Error loading: {}", reason),
            FetchError::GraphQl { messages } => messages.join("\n"),
            FetchError::InvalidPayload(reason) => format!("Error loading: {}", reason),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::Status {
                status: status.as_u16(),
                body: String::new(),
            },
            None => FetchError::Transport(err.to_string()),
        }
    }
}

/// Why the chooser cannot commit its staged choice.
///
/// The display text is what the chooser's message area shows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitBlocked {
    /// Nothing picked yet.
    #[error("please select an introspection source.")]
    NoSource,

    /// Custom card picked but nothing pasted.
    #[error("please paste your introspection")]
    NoText,

    /// Pasted text did not parse.
    #[error("{0}")]
    Parse(ParseError),
}
