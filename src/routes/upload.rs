use axum::{
    extract::{Multipart, State},
    response::Json as ResponseJson,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use tracing::{debug, info};

use crate::models::{AppState, UploadResponse};
use crate::pipeline::UploadRequest;
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/upload", post(upload))
        .with_state(state)
}

/// Multipart upload with `file`, `domain` and `intent` fields.
async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ResponseJson<UploadResponse>> {
    let request = read_upload(multipart).await?;
    info!(
        filename = %request.filename,
        size = request.bytes.len(),
        domain = %request.domain,
        "Upload request received"
    );

    let response = state.pipeline.run(request).await?;
    Ok(Json(response))
}

async fn read_upload(mut multipart: Multipart) -> AppResult<UploadRequest> {
    let mut file: Option<(String, Bytes)> = None;
    let mut domain: Option<String> = None;
    let mut intent: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .ok_or_else(|| AppError::InvalidRequest("Uploaded file has no filename".to_string()))?;
                let bytes = field.bytes().await.map_err(malformed)?;
                file = Some((filename, bytes));
            }
            "domain" => domain = Some(field.text().await.map_err(malformed)?),
            "intent" => intent = Some(field.text().await.map_err(malformed)?),
            other => debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| AppError::InvalidRequest("Missing form field: file".to_string()))?;

    Ok(UploadRequest {
        filename,
        bytes,
        domain: required_text(domain, "domain")?,
        intent: required_text(intent, "intent")?,
    })
}

fn required_text(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidRequest(format!("Missing form field: {}", field)))
}

fn malformed(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::InvalidRequest(format!("Malformed multipart body: {}", e))
}
