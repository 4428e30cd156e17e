use std::io::ErrorKind as IoErrorKind;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use docsheet_core::api_types::CleanupResponse;
use docsheet_core::ErrorKind;
use docsheet_tabular::is_safe_file_name;

use super::ApiError;
use crate::state::AppState;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn content_type(filename: &str) -> &'static str {
    if filename.to_ascii_lowercase().ends_with(".csv") {
        "text/csv; charset=utf-8"
    } else {
        XLSX_MIME
    }
}

fn checked_name(filename: &str) -> Result<(), ApiError> {
    if is_safe_file_name(filename) {
        Ok(())
    } else {
        warn!(filename = %filename, "Rejected unsafe file name");
        Err(ApiError::bad_request("Invalid filename"))
    }
}

/// GET /download/{filename}: stream a generated table back to the client.
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    checked_name(&filename)?;

    let path = state.config.output_dir.join(&filename);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            return Err(ApiError::not_found("File not found"))
        }
        Err(e) => {
            return Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::Internal,
                format!("cannot read {filename}: {e}"),
            ))
        }
    };

    info!(filename = %filename, bytes = bytes.len(), "Serving generated file");
    let disposition = format!("attachment; filename=\"{filename}\"");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type(&filename).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// DELETE /cleanup/{filename}: remove a generated table after download.
pub async fn cleanup(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<CleanupResponse>, ApiError> {
    checked_name(&filename)?;

    let path = state.config.output_dir.join(&filename);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            info!(filename = %filename, "Deleted generated file");
            Ok(Json(CleanupResponse {
                status: "File deleted".to_string(),
            }))
        }
        Err(e) if e.kind() == IoErrorKind::NotFound => Err(ApiError::not_found("File not found")),
        Err(e) => Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Internal,
            format!("cannot delete {filename}: {e}"),
        )),
    }
}
