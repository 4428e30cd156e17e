use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::record::ExtractedRecord;
use crate::result::DocumentFailure;

// --- Upload ---

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub message: String,
    pub download_url: Option<String>,
    /// Parsed data, returned inline for single-document uploads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<ExtractedRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_documents: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successful_extractions: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_documents: Option<Vec<DocumentFailure>>,
}

// --- Errors ---

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_documents: Option<Vec<DocumentFailure>>,
}

impl ErrorResponse {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            kind,
            raw: None,
            failed_documents: None,
        }
    }
}

// --- Files ---

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub status: String,
}

// --- Service ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfoResponse {
    pub service: String,
    pub version: String,
    pub supported_extensions: Vec<String>,
    pub endpoints: BTreeMap<String, String>,
}
