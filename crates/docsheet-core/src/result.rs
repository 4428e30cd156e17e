use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DocsheetError, ErrorKind};
use crate::record::{ExtractedRecord, Record};

/// Outcome of running one document through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineResult {
    Success {
        message: String,
        output: PathBuf,
        data: ExtractedRecord,
    },
    Error {
        message: String,
        kind: ErrorKind,
        /// Unparsed model output, present only for parse failures.
        raw: Option<String>,
    },
}

impl PipelineResult {
    pub fn from_error(err: &DocsheetError) -> Self {
        Self::Error {
            message: err.to_string(),
            kind: err.kind(),
            raw: err.raw_response().map(str::to_string),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A document that was skipped in a batch, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub document: String,
    pub error: String,
    pub kind: ErrorKind,
}

impl DocumentFailure {
    pub fn new(document: impl Into<String>, err: &DocsheetError) -> Self {
        Self {
            document: document.into(),
            error: err.to_string(),
            kind: err.kind(),
        }
    }
}

/// Aggregate of a batch run. `records` holds every tagged row from every
/// successful document in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub message: String,
    pub output: Option<PathBuf>,
    pub total_documents: usize,
    pub successful_documents: usize,
    pub records: Vec<Record>,
    pub failed_documents: Vec<DocumentFailure>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.output.is_some()
    }

    /// Number of rows written, reported to clients as "successful extractions".
    pub fn successful_extractions(&self) -> usize {
        self.records.len()
    }
}
