//! API route handlers.

mod chooser;
mod health;
mod state;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{warn, Level};
use voyager_ops::{OpsError, Session};

use crate::types::{ApiErrorResponse, ApiResponse};
use crate::ws::ws_handler;

/// Create the API router with all endpoints.
pub fn create_api_router(session: Session) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health::health_handler))
        // Store
        .route("/state", get(state::state_handler))
        .route("/events", post(state::event_handler))
        // Chooser
        .route("/chooser", get(chooser::chooser_handler))
        .route("/chooser/open", post(chooser::open_handler))
        .route("/chooser/close", post(chooser::close_handler))
        .route("/chooser/stage", post(chooser::stage_handler))
        .route("/chooser/commit", post(chooser::commit_handler))
        .route("/chooser/discard", post(chooser::discard_handler))
        // WebSocket
        .route("/ws", get(ws_handler))
        // Request tracing (enable with RUST_LOG=tower_http=info or higher)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(crate::create_api_state(session))
}

/// Map an operation failure onto an HTTP error response.
pub(crate) fn error_response(err: OpsError) -> Response {
    let (status, code) = match &err {
        OpsError::CommitBlocked(_) => (StatusCode::CONFLICT, "COMMIT_BLOCKED"),
        OpsError::UnknownPreset { .. } => (StatusCode::NOT_FOUND, "UNKNOWN_PRESET"),
        OpsError::Parse(_) => (StatusCode::UNPROCESSABLE_ENTITY, "PARSE_ERROR"),
        OpsError::DispatcherClosed => (StatusCode::SERVICE_UNAVAILABLE, "STORE_CLOSED"),
        OpsError::Configuration(_) => (StatusCode::BAD_REQUEST, "CONFIGURATION_ERROR"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "OPS_ERROR"),
    };
    warn!(code, error = %err, "Request failed");

    (
        status,
        Json(ApiResponse::new(ApiErrorResponse {
            code: code.to_string(),
            message: err.to_string(),
        })),
    )
        .into_response()
}

pub(crate) type ApiState = Arc<crate::types::ApiState>;
