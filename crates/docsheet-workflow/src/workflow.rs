use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use docsheet_core::{
    AppConfig, BatchResult, DocsheetError, DocumentFailure, DocumentRef, ExtractedRecord,
    PipelineResult, Result, TextAcquisition, TextCompletion,
};
use docsheet_extraction::StructuredExtractor;
use docsheet_tabular::{unique_output_name, Materializer};

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

/// Runs documents through acquisition, extraction and materialization.
///
/// A batch fans out over a bounded pool of tasks; results are aggregated in
/// input order regardless of which document finishes first. A failing
/// document is recorded and skipped, never fatal to the batch.
#[derive(Clone)]
pub struct Workflow {
    extractor: Arc<StructuredExtractor>,
    materializer: Materializer,
    max_concurrency: usize,
    max_batch_size: usize,
}

impl Workflow {
    pub fn new(
        acquisition: Arc<dyn TextAcquisition>,
        completion: Arc<dyn TextCompletion>,
        materializer: Materializer,
    ) -> Self {
        Self {
            extractor: Arc::new(StructuredExtractor::new(acquisition, completion)),
            materializer,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        acquisition: Arc<dyn TextAcquisition>,
        completion: Arc<dyn TextCompletion>,
    ) -> Self {
        Self::new(
            acquisition,
            completion,
            Materializer::new(&config.output_dir),
        )
        .with_max_concurrency(config.max_concurrency)
        .with_max_batch_size(config.max_batch_size)
    }

    /// 1 processes documents one at a time.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    pub fn with_max_batch_size(mut self, limit: usize) -> Self {
        self.max_batch_size = limit.max(1);
        self
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Extract from one document and write the table. Without an explicit
    /// name the output is `<stem>_extracted_<id>.xlsx`.
    #[instrument(skip(self, document, query, output_name), fields(document = %document.name))]
    pub async fn run_single(
        &self,
        document: &DocumentRef,
        query: &str,
        output_name: Option<&str>,
    ) -> PipelineResult {
        match self.try_single(document, query, output_name).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Document pipeline failed");
                PipelineResult::from_error(&e)
            }
        }
    }

    async fn try_single(
        &self,
        document: &DocumentRef,
        query: &str,
        output_name: Option<&str>,
    ) -> Result<PipelineResult> {
        let data = self.extractor.extract_record(query, document).await?;

        let name = match output_name {
            Some(name) => name.to_string(),
            None => unique_output_name(&format!("{}_extracted", document.stem())),
        };
        let output = self.materializer.materialize(data.rows(), &name)?;

        info!(rows = data.len(), output = %output.display(), "Document processed");
        Ok(PipelineResult::Success {
            message: "Document processed successfully".to_string(),
            output,
            data,
        })
    }

    /// Extract from every document with the same query and write all rows,
    /// each tagged with its `source_document`, into one table.
    ///
    /// Returns `Err` only for a rejected request or a failed write. When no
    /// document succeeds the result carries the failures and no output.
    #[instrument(skip(self, documents, query), fields(count = documents.len()))]
    pub async fn run_batch(
        &self,
        documents: &[DocumentRef],
        query: &str,
        output_name: &str,
    ) -> Result<BatchResult> {
        if documents.is_empty() {
            return Err(DocsheetError::InvalidRequest("no documents provided".into()));
        }
        if documents.len() > self.max_batch_size {
            return Err(DocsheetError::InvalidRequest(format!(
                "batch of {} documents exceeds the limit of {}",
                documents.len(),
                self.max_batch_size
            )));
        }

        info!(
            count = documents.len(),
            max_concurrency = self.max_concurrency,
            "Starting batch extraction"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut join_set = JoinSet::new();
        let mut task_index = HashMap::with_capacity(documents.len());

        for (i, document) in documents.iter().enumerate() {
            let extractor = self.extractor.clone();
            let semaphore = semaphore.clone();
            let document = document.clone();
            let query = query.to_string();

            let handle = join_set.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => extractor.extract_record(&query, &document).await,
                    Err(_) => Err(DocsheetError::Internal("worker pool closed".into())),
                };
                (i, outcome)
            });
            task_index.insert(handle.id(), i);
        }

        let mut outcomes: Vec<Option<Result<ExtractedRecord>>> =
            documents.iter().map(|_| None).collect();

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((i, outcome)) => outcomes[i] = Some(outcome),
                Err(join_err) => {
                    error!(error = %join_err, "Document task panicked during batch extraction");
                    if let Some(&i) = task_index.get(&join_err.id()) {
                        outcomes[i] = Some(Err(DocsheetError::Internal(format!(
                            "document task failed: {join_err}"
                        ))));
                    }
                }
            }
        }

        let mut records = Vec::new();
        let mut failed_documents = Vec::new();
        let mut successful_documents = 0;

        for (document, outcome) in documents.iter().zip(outcomes) {
            let outcome = outcome.unwrap_or_else(|| {
                Err(DocsheetError::Internal("document task did not complete".into()))
            });
            match outcome {
                Ok(mut data) => {
                    data.tag_source(&document.name);
                    successful_documents += 1;
                    records.extend(data.into_rows());
                }
                Err(e) => {
                    warn!(
                        document = %document.name,
                        error = %e,
                        kind = ?e.kind(),
                        "Document failed in batch"
                    );
                    failed_documents.push(DocumentFailure::new(&document.name, &e));
                }
            }
        }

        let total_documents = documents.len();
        if records.is_empty() {
            warn!(
                failed = failed_documents.len(),
                "No documents were successfully processed"
            );
            return Ok(BatchResult {
                message: "No documents were successfully processed".to_string(),
                output: None,
                total_documents,
                successful_documents,
                records,
                failed_documents,
            });
        }

        let output = self.materializer.materialize(&records, output_name)?;

        if failed_documents.is_empty() {
            info!(rows = records.len(), output = %output.display(), "Batch completed successfully");
        } else {
            warn!(
                succeeded = successful_documents,
                failed = failed_documents.len(),
                output = %output.display(),
                "Batch completed with partial failures"
            );
        }

        Ok(BatchResult {
            message: format!(
                "Processed {successful_documents} of {total_documents} documents successfully"
            ),
            output: Some(output),
            total_documents,
            successful_documents,
            records,
            failed_documents,
        })
    }
}
