//! API types and DTOs.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use voyager_core::{ApplicationState, StagedSchemaChoice};
use voyager_ops::{ChooserStatus, Session};

/// Shared application state for the API.
pub struct ApiState {
    /// The session every handler acts on.
    pub session: Session,
}

/// Response wrapper with timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response data.
    pub data: T,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
}

impl<T> ApiResponse<T> {
    /// Create a new API response with current timestamp.
    pub fn new(data: T) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self { data, timestamp }
    }
}

/// Error body for failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    pub has_schema: bool,
    /// A schema fetch is in flight.
    pub loading: bool,
    pub rendered: bool,
    pub revision: u64,
}

impl HealthResponse {
    pub fn from_state(state: &ApplicationState) -> Self {
        Self {
            status: "ok".to_string(),
            has_schema: state.has_schema(),
            loading: state.is_loading(),
            rendered: state.graph_view.rendered_image.is_some(),
            revision: state.graph_view.revision.0,
        }
    }
}

/// Everything the chooser dialog needs to draw itself.
#[derive(Debug, Clone, Serialize)]
pub struct ChooserResponse {
    pub dialog_open: bool,
    pub staged: Option<StagedSchemaChoice>,
    pub status: ChooserStatus,
    pub presets: Vec<String>,
    pub active_preset: Option<String>,
}

/// Body of `POST /api/chooser/stage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageRequest {
    /// Pick a preset card (or `custom`).
    Preset { name: String },
    /// Type into the custom card.
    Text { text: String },
}

/// WebSocket message sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    /// A new state snapshot was published.
    StateChanged {
        revision: u64,
        has_schema: bool,
        loading: bool,
        rendered: bool,
        error_message: Option<String>,
    },
    /// Error occurred.
    Error {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
    },
    /// Pong response to client ping.
    Pong,
}

impl WsServerMessage {
    pub fn state_changed(state: &ApplicationState) -> Self {
        Self::StateChanged {
            revision: state.graph_view.revision.0,
            has_schema: state.has_schema(),
            loading: state.is_loading(),
            rendered: state.graph_view.rendered_image.is_some(),
            error_message: state.error_message.clone(),
        }
    }
}

/// WebSocket message sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsClientMessage {
    /// Ping to keep connection alive.
    Ping,
}
