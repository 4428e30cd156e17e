use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::DocumentFormat;

/// Machine-readable classification reported alongside every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Acquisition,
    Service,
    Parse,
    Materialization,
    InvalidRequest,
    Internal,
}

/// Failures while turning a document into plain text. Each variant names the
/// stage that failed so callers can tell a corrupt PDF from a missing OCR binary.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("{stage} file reading error: {source}")]
    Io {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF reading error: {0}")]
    Pdf(String),

    #[error("OCR error on page {page}: {message}")]
    OcrPage { page: u32, message: String },

    #[error("Image OCR error: {0}")]
    Image(String),

    #[error("OCR engine unavailable: {0}")]
    OcrUnavailable(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("Word document reading error: {0}")]
    Docx(String),

    #[error("No text found in {}", .0.label())]
    NoText(DocumentFormat),

    #[error("Acquisition task failed: {0}")]
    Task(String),
}

impl AcquisitionError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "dispatch",
            Self::Io { stage, .. } => *stage,
            Self::Pdf(_) => "pdf",
            Self::OcrPage { .. } | Self::OcrUnavailable(_) | Self::Ocr(_) => "ocr",
            Self::Image(_) => "image",
            Self::Docx(_) => "docx",
            Self::NoText(format) => format.stage(),
            Self::Task(_) => "task",
        }
    }
}

pub type AcquisitionResult<T> = std::result::Result<T, AcquisitionError>;

#[derive(Error, Debug)]
pub enum DocsheetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("Completion service error: {0}")]
    Service(String),

    #[error("AI returned invalid JSON format: {message}")]
    Parse { message: String, raw: String },

    #[error("Materialization error: {0}")]
    Materialization(String),

    #[error("Output file already exists: {0}")]
    OutputExists(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocsheetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) | Self::Service(_) => ErrorKind::Service,
            Self::Acquisition(_) => ErrorKind::Acquisition,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Materialization(_) | Self::OutputExists(_) => ErrorKind::Materialization,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Json(_) | Self::Io(_) | Self::Config(_) | Self::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// The unparsed model output behind a [`DocsheetError::Parse`], kept for diagnosis.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DocsheetError>;
