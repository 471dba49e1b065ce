//! Store snapshot and event dispatch.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::debug;
use voyager_core::Event;

use super::{error_response, ApiState};
use crate::types::ApiResponse;

/// GET /api/state - Current snapshot.
pub async fn state_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.session.snapshot();
    Json(ApiResponse::new(snapshot))
}

/// POST /api/events - Apply one event and return the resulting snapshot.
pub async fn event_handler(
    State(state): State<ApiState>,
    Json(event): Json<Event>,
) -> impl IntoResponse {
    debug!(event = event.kind(), "Event received over HTTP");

    match state.session.dispatcher().apply(event).await {
        Ok(snapshot) => (StatusCode::OK, Json(ApiResponse::new(snapshot))).into_response(),
        Err(e) => error_response(e),
    }
}
