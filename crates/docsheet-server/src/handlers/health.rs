use std::collections::BTreeMap;

use axum::{http::StatusCode, response::IntoResponse, Json};
use tracing::debug;

use docsheet_core::api_types::{HealthResponse, ServiceInfoResponse};
use docsheet_core::DocumentFormat;

const SERVICE: &str = "Document Parser API";
const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn health_check() -> impl IntoResponse {
    debug!("Health check requested");

    let response = HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE.to_string(),
        version: VERSION.to_string(),
    };

    (StatusCode::OK, Json(response))
}

/// GET /docs: what this service accepts and where.
pub async fn service_info() -> impl IntoResponse {
    let endpoints = BTreeMap::from([
        (
            "POST /upload".to_string(),
            "multipart: one or more `files` parts and a `query` field".to_string(),
        ),
        (
            "GET /download/{filename}".to_string(),
            "download a generated table".to_string(),
        ),
        (
            "DELETE /cleanup/{filename}".to_string(),
            "delete a generated table".to_string(),
        ),
        ("GET /health".to_string(), "service health".to_string()),
    ]);

    let response = ServiceInfoResponse {
        service: SERVICE.to_string(),
        version: VERSION.to_string(),
        supported_extensions: DocumentFormat::SUPPORTED_EXTENSIONS
            .iter()
            .map(|ext| ext.to_string())
            .collect(),
        endpoints,
    };

    (StatusCode::OK, Json(response))
}
