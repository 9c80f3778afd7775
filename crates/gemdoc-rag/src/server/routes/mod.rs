//! API routes

pub mod ask;
pub mod status;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes; each path is also served with a trailing slash
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    let upload = post(upload::upload_document).layer(DefaultBodyLimit::max(max_upload_size));

    Router::new()
        .route("/upload", upload.clone())
        .route("/upload/", upload)
        .route("/ask", post(ask::ask_question))
        .route("/ask/", post(ask::ask_question))
        .route("/status", get(status::index_status))
        .route("/status/", get(status::index_status))
}
