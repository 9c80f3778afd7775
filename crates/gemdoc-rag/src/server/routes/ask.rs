//! Question answering endpoint

use axum::{
    extract::{FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    Form, Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{AskRequest, AskResponse};

/// POST /ask - Answer a question from the indexed document
///
/// Takes JSON `{"query", "top_k"}` or an urlencoded form with the same fields.
pub async fn ask_question(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<AskResponse>> {
    let request = parse_ask_request(req, &state).await?;

    tracing::info!(
        "Question: {} (top_k={:?})",
        request.query.chars().take(100).collect::<String>(),
        request.top_k
    );

    let answer = state
        .pipeline()
        .answer(&request.query, request.top_k)
        .await?;

    Ok(Json(AskResponse::from(answer)))
}

async fn parse_ask_request(req: Request, state: &AppState) -> Result<AskRequest> {
    let is_json = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);

    if is_json {
        let Json(request) = Json::<AskRequest>::from_request(req, state)
            .await
            .map_err(|e| Error::BadRequest(e.body_text()))?;
        Ok(request)
    } else {
        let Form(request) = Form::<AskRequest>::from_request(req, state)
            .await
            .map_err(|e| Error::BadRequest(e.body_text()))?;
        Ok(request)
    }
}
