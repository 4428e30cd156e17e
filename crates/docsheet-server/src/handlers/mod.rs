pub mod files;
pub mod health;
pub mod upload;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use docsheet_core::api_types::ErrorResponse;
use docsheet_core::{DocsheetError, ErrorKind};

/// Error body plus the status it is sent with.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(kind, detail),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorKind::InvalidRequest, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorKind::InvalidRequest, detail)
    }

    pub fn with_body(status: StatusCode, body: ErrorResponse) -> Self {
        Self { status, body }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Acquisition | ErrorKind::Parse => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Service => StatusCode::BAD_GATEWAY,
        ErrorKind::Materialization | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DocsheetError> for ApiError {
    fn from(err: DocsheetError) -> Self {
        let kind = err.kind();
        let mut body = ErrorResponse::new(kind, err.to_string());
        body.raw = err.raw_response().map(str::to_string);
        Self::with_body(status_for(kind), body)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
