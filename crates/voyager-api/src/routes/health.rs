//! Health check endpoint.

use axum::{extract::State, Json};

use super::ApiState;
use crate::types::{ApiResponse, HealthResponse};

/// Handler for GET /api/health
pub async fn health_handler(State(state): State<ApiState>) -> Json<ApiResponse<HealthResponse>> {
    let snapshot = state.session.snapshot();
    Json(ApiResponse::new(HealthResponse::from_state(&snapshot)))
}
