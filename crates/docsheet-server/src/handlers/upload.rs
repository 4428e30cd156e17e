use std::path::{Path, PathBuf};

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use docsheet_core::api_types::{ErrorResponse, UploadResponse};
use docsheet_core::{DocumentFormat, DocumentRef, ErrorKind, PipelineResult};
use docsheet_tabular::unique_output_name;

use super::{status_for, ApiError};
use crate::state::AppState;

/// POST /upload: save the uploaded documents, run the pipeline on them with
/// the given query, and return a download link for the generated table.
///
/// One file runs the single-document pipeline and returns the extracted data
/// inline; several run as a batch into one table. Uploaded files are removed
/// once processing ends, whatever the outcome.
#[instrument(skip(state, multipart))]
pub async fn upload_and_process(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut saved = Vec::new();
    let result = process_upload(&state, multipart, &mut saved).await;
    remove_uploads(&saved).await;
    result
}

async fn process_upload(
    state: &AppState,
    mut multipart: Multipart,
    saved: &mut Vec<PathBuf>,
) -> Result<Json<UploadResponse>, ApiError> {
    let upload_dir = &state.config.upload_dir;
    tokio::fs::create_dir_all(upload_dir).await.map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Internal,
            format!("cannot create upload directory: {e}"),
        )
    })?;

    let mut query = None;
    let mut documents = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "query" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid query field: {e}")))?;
                query = Some(text);
            }
            "files" => {
                let name = field
                    .file_name()
                    .and_then(client_file_name)
                    .ok_or_else(|| ApiError::bad_request("File without name provided"))?;
                check_extension(&name)?;

                if documents.len() >= state.workflow.max_batch_size() {
                    return Err(ApiError::bad_request(format!(
                        "Too many files, at most {} per upload",
                        state.workflow.max_batch_size()
                    )));
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read {name}: {e}")))?;

                let path = upload_dir.join(format!("{}_{}", Uuid::new_v4(), name));
                tokio::fs::write(&path, &data).await.map_err(|e| {
                    ApiError::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorKind::Internal,
                        format!("cannot save {name}: {e}"),
                    )
                })?;
                saved.push(path.clone());

                debug!(file = %name, bytes = data.len(), "Saved upload");
                documents.push(DocumentRef::new(path).with_name(name));
            }
            other => debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    let query = query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query is required"))?;
    if documents.is_empty() {
        return Err(ApiError::bad_request("No files provided"));
    }

    info!(files = documents.len(), "Processing upload");

    if documents.len() == 1 {
        process_single(state, &documents[0], &query).await
    } else {
        process_batch(state, &documents, &query).await
    }
}

async fn process_single(
    state: &AppState,
    document: &DocumentRef,
    query: &str,
) -> Result<Json<UploadResponse>, ApiError> {
    let id = Uuid::new_v4().simple().to_string();
    let output_name = format!("{}_extracted.xlsx", &id[..8]);

    match state
        .workflow
        .run_single(document, query, Some(&output_name))
        .await
    {
        PipelineResult::Success {
            message,
            output,
            data,
        } => Ok(Json(UploadResponse {
            status: "success".to_string(),
            message,
            download_url: Some(download_url(&output)),
            extracted_data: Some(data),
            total_documents: None,
            successful_extractions: None,
            failed_documents: None,
        })),
        PipelineResult::Error { message, kind, raw } => {
            let mut body = ErrorResponse::new(kind, message);
            body.raw = raw;
            Err(ApiError::with_body(status_for(kind), body))
        }
    }
}

async fn process_batch(
    state: &AppState,
    documents: &[DocumentRef],
    query: &str,
) -> Result<Json<UploadResponse>, ApiError> {
    let output_name = unique_output_name("batch");
    let batch = state
        .workflow
        .run_batch(documents, query, &output_name)
        .await?;
    let successful_extractions = batch.successful_extractions();

    match batch.output {
        Some(output) => Ok(Json(UploadResponse {
            status: "success".to_string(),
            message: batch.message,
            download_url: Some(download_url(&output)),
            extracted_data: None,
            total_documents: Some(batch.total_documents),
            successful_extractions: Some(successful_extractions),
            failed_documents: Some(batch.failed_documents),
        })),
        None => {
            let kind = batch
                .failed_documents
                .first()
                .map(|f| f.kind)
                .unwrap_or(ErrorKind::Internal);
            let mut body = ErrorResponse::new(kind, batch.message);
            body.failed_documents = Some(batch.failed_documents);
            Err(ApiError::with_body(StatusCode::UNPROCESSABLE_ENTITY, body))
        }
    }
}

/// Last path component of a client-supplied file name, with either separator.
fn client_file_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

fn check_extension(name: &str) -> Result<(), ApiError> {
    let path = Path::new(name);
    if DocumentFormat::from_path(path).is_supported() {
        return Ok(());
    }

    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_else(|| "(none)".to_string());
    let allowed: Vec<String> = DocumentFormat::SUPPORTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect();
    Err(ApiError::bad_request(format!(
        "Unsupported file type: {extension}. Allowed: {}",
        allowed.join(", ")
    )))
}

fn download_url(output: &Path) -> String {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("/download/{name}")
}

async fn remove_uploads(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove uploaded file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_file_names_lose_directories() {
        assert_eq!(client_file_name("invoice.pdf").as_deref(), Some("invoice.pdf"));
        assert_eq!(client_file_name("C:\\scans\\a.png").as_deref(), Some("a.png"));
        assert_eq!(client_file_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(client_file_name("dir/"), None);
        assert_eq!(client_file_name(".."), None);
    }

    #[test]
    fn extension_check_uses_shared_allow_list() {
        assert!(check_extension("scan.TIFF").is_ok());
        assert!(check_extension("notes.docx").is_ok());
        assert!(check_extension("legacy.doc").is_err());
        assert!(check_extension("README").is_err());
    }

    #[test]
    fn download_url_uses_file_name_only() {
        assert_eq!(
            download_url(Path::new("outputs/batch_1a2b3c4d.xlsx")),
            "/download/batch_1a2b3c4d.xlsx"
        );
    }
}
