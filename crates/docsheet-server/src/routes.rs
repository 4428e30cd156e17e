use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Upper bound on a whole multipart upload.
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Service
        .route("/health", get(handlers::health::health_check))
        .route("/docs", get(handlers::health::service_info))
        // Extraction
        .route(
            "/upload",
            post(handlers::upload::upload_and_process)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        // Generated files
        .route("/download/{filename}", get(handlers::files::download))
        .route("/cleanup/{filename}", delete(handlers::files::cleanup))
}
