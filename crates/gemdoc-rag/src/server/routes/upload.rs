//! Document upload endpoint

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;

use crate::error::Error;
use crate::server::state::AppState;
use crate::types::{Document, UploadResponse};

/// Multipart field carrying the document
const FILE_FIELD: &str = "file";

/// POST /upload - Extract, chunk, embed and index one PDF or DOCX
///
/// Every outcome, including malformed and oversized bodies, is reported as
/// an `UploadResponse`.
pub async fn upload_document(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };
    let mut upload: Option<(String, Option<String>, Bytes)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return rejected(e.status(), e.body_text()),
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => return rejected(e.status(), e.body_text()),
        };

        upload = Some((filename, content_type, data));
        break;
    }

    let Some((filename, content_type, data)) = upload else {
        return failure(Error::BadRequest(format!(
            "Missing '{}' field in multipart upload",
            FILE_FIELD
        )));
    };

    tracing::info!("Received upload: {} ({} bytes)", filename, data.len());

    let doc = match Document::from_upload(filename, content_type.as_deref(), data.to_vec()) {
        Ok(doc) => doc,
        Err(e) => return failure(e),
    };

    match state.pipeline().ingest(doc).await {
        Ok(status) => (StatusCode::OK, Json(UploadResponse::ok(&status))).into_response(),
        Err(e) => failure(e),
    }
}

fn failure(error: Error) -> Response {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!("Upload failed: {}", error);
    } else {
        tracing::warn!("Upload rejected: {}", error);
    }
    (status, Json(UploadResponse::error(error.to_string()))).into_response()
}

/// Body the multipart extractor refused (not multipart, too large, truncated)
fn rejected(status: StatusCode, message: String) -> Response {
    tracing::warn!("Upload rejected ({}): {}", status, message);
    (status, Json(UploadResponse::error(message))).into_response()
}
