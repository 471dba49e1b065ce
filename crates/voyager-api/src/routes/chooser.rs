//! Schema chooser endpoints.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::info;
use voyager_core::ApplicationState;
use voyager_ops::{OpsResult, Session};

use super::{error_response, ApiState};
use crate::types::{ApiResponse, ChooserResponse, StageRequest};

fn chooser_view(session: &Session) -> ChooserResponse {
    let snapshot = session.snapshot();
    ChooserResponse {
        dialog_open: session.dialog_open(),
        staged: snapshot.staged.clone(),
        status: session.chooser().status(snapshot.staged.as_ref()),
        presets: session.chooser().presets().names().map(String::from).collect(),
        active_preset: snapshot.active_preset.clone(),
    }
}

fn respond(session: &Session, result: OpsResult<Arc<ApplicationState>>) -> axum::response::Response {
    match result {
        Ok(_) => (StatusCode::OK, Json(ApiResponse::new(chooser_view(session)))).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/chooser
pub async fn chooser_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(ApiResponse::new(chooser_view(&state.session)))
}

/// POST /api/chooser/open
pub async fn open_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let result = state.session.open_dialog().await;
    respond(&state.session, result)
}

/// POST /api/chooser/close
pub async fn close_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let result = state.session.close_dialog().await;
    respond(&state.session, result)
}

/// POST /api/chooser/stage
pub async fn stage_handler(
    State(state): State<ApiState>,
    Json(request): Json<StageRequest>,
) -> impl IntoResponse {
    let result = match &request {
        StageRequest::Preset { name } => state.session.stage_preset(name).await,
        StageRequest::Text { text } => state.session.stage_text(text).await,
    };
    respond(&state.session, result)
}

/// POST /api/chooser/commit
pub async fn commit_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let result = state.session.commit().await;
    if let Ok(snapshot) = &result {
        info!(preset = ?snapshot.active_preset, "Schema committed from chooser");
    }
    respond(&state.session, result)
}

/// POST /api/chooser/discard
pub async fn discard_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let result = state.session.discard().await;
    respond(&state.session, result)
}
