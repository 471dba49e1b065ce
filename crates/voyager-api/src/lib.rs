//! REST + WebSocket API service for Voyager.
//!
//! Exposes one running [`voyager_ops::Session`] to a frontend.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check with schema and render status
//! - `GET /api/state` - Current application state snapshot
//! - `POST /api/events` - Dispatch one event
//! - `GET /api/chooser` - Staged choice, its status and the preset names
//! - `POST /api/chooser/open` - Show the chooser
//! - `POST /api/chooser/close` - Hide the chooser, dropping the staged choice
//! - `POST /api/chooser/stage` - Stage `{"name": ...}` or `{"text": ...}`
//! - `POST /api/chooser/commit` - Apply the staged choice (409 when blocked)
//! - `POST /api/chooser/discard` - Drop the staged choice
//! - `GET /api/ws` - WebSocket pushing a message after every state change
//!
//! ## Usage
//!
//! ```rust,no_run
//! use voyager_api::create_api_router;
//! use voyager_ops::{Config, OpsContext};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = OpsContext::bootstrap(Config::load()?).await?;
//! let router = axum::Router::new().nest("/api", create_api_router(ctx.session().clone()));
//! # Ok(())
//! # }
//! ```

mod routes;
mod types;
mod ws;

pub use routes::create_api_router;
pub use types::{
    ApiErrorResponse, ApiResponse, ApiState, ChooserResponse, HealthResponse, StageRequest,
    WsClientMessage, WsServerMessage,
};

use std::sync::Arc;

use voyager_ops::Session;

/// Create the shared API state for a session.
pub fn create_api_state(session: Session) -> Arc<ApiState> {
    Arc::new(ApiState { session })
}
