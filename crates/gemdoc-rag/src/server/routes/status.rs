//! Index status endpoint

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::types::StatusResponse;

/// GET /status - Whether a document is indexed and how many chunks it has
pub async fn index_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.pipeline().status())
}
