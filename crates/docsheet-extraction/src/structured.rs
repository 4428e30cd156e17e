use std::sync::Arc;

use tracing::{debug, info, instrument};

use docsheet_core::{
    DocsheetError, DocumentRef, ExtractedRecord, Result, TextAcquisition, TextCompletion,
};

use crate::prompts::build_extraction_prompt;
use crate::sanitize::sanitize_response;
use crate::spec_builder::SpecBuilder;

/// Acquires a document's text, elaborates the query, and asks the completion
/// service for structured output in one request.
pub struct StructuredExtractor {
    acquisition: Arc<dyn TextAcquisition>,
    completion: Arc<dyn TextCompletion>,
    spec_builder: SpecBuilder,
}

impl StructuredExtractor {
    pub fn new(
        acquisition: Arc<dyn TextAcquisition>,
        completion: Arc<dyn TextCompletion>,
    ) -> Self {
        Self {
            acquisition,
            spec_builder: SpecBuilder::new(completion.clone()),
            completion,
        }
    }

    /// Sanitized model output for `document`. Not parsed: see [`Self::extract_record`].
    #[instrument(skip(self, query, document), fields(document = %document.name))]
    pub async fn extract(&self, query: &str, document: &DocumentRef) -> Result<String> {
        let text = self.acquisition.acquire(document).await?;
        let directive = self.spec_builder.elaborate(query).await?;

        let prompt = build_extraction_prompt(&text, &directive);
        debug!(prompt_len = prompt.len(), "Sending extraction request");

        let response = self.completion.complete(&prompt).await?;
        let sanitized = sanitize_response(&response);
        info!(
            response_len = response.len(),
            sanitized_len = sanitized.len(),
            "Received extraction response"
        );

        Ok(sanitized.to_string())
    }

    /// [`Self::extract`] followed by validation into an [`ExtractedRecord`].
    /// An empty array is a parse failure: the document contributed no rows.
    pub async fn extract_record(
        &self,
        query: &str,
        document: &DocumentRef,
    ) -> Result<ExtractedRecord> {
        let raw = self.extract(query, document).await?;
        let record = ExtractedRecord::parse(&raw)?;
        if record.is_empty() {
            return Err(DocsheetError::Parse {
                message: "no records in response".to_string(),
                raw,
            });
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use docsheet_core::error::AcquisitionResult;
    use docsheet_core::{AcquisitionError, DocumentFormat, ErrorKind};

    use super::*;

    struct FixedText(&'static str);

    #[async_trait]
    impl TextAcquisition for FixedText {
        async fn acquire(&self, _document: &DocumentRef) -> AcquisitionResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct Unreadable;

    #[async_trait]
    impl TextAcquisition for Unreadable {
        async fn acquire(&self, _document: &DocumentRef) -> AcquisitionResult<String> {
            Err(AcquisitionError::NoText(DocumentFormat::Pdf))
        }
    }

    /// Answers prompts in order and remembers them.
    struct Scripted {
        replies: Mutex<Vec<&'static str>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: &[&'static str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().copied().collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextCompletion for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .map(str::to_string)
                .ok_or_else(|| DocsheetError::Service("script exhausted".into()))
        }
    }

    fn doc() -> DocumentRef {
        DocumentRef::new("/uploads/invoice.txt")
    }

    #[tokio::test]
    async fn builds_one_prompt_with_text_and_directive() {
        let completion = Arc::new(Scripted::new(&[
            "Extract invoice_number and total.",
            "Sure! Here you go:\n```json\n{\"invoice_number\": \"A-7\", \"total\": 12.5}\n```",
        ]));
        let extractor = StructuredExtractor::new(
            Arc::new(FixedText("Invoice A-7, total 12.50")),
            completion.clone(),
        );

        let raw = extractor.extract("invoice number and total", &doc()).await.unwrap();
        assert_eq!(raw, "{\"invoice_number\": \"A-7\", \"total\": 12.5}");

        let prompts = completion.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("invoice number and total"));
        assert!(prompts[1].contains("Invoice A-7, total 12.50"));
        assert!(prompts[1].contains("Extract invoice_number and total."));
    }

    #[tokio::test]
    async fn unparseable_output_is_parse_error_with_raw_text() {
        let completion = Arc::new(Scripted::new(&["directive", "No data found."]));
        let extractor = StructuredExtractor::new(Arc::new(FixedText("text")), completion);

        let err = extractor.extract_record("anything", &doc()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.raw_response(), Some("No data found."));
    }

    #[tokio::test]
    async fn empty_array_is_parse_error() {
        let completion = Arc::new(Scripted::new(&["directive", " [] "]));
        let extractor = StructuredExtractor::new(Arc::new(FixedText("text")), completion);

        let err = extractor.extract_record("anything", &doc()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.raw_response(), Some("[]"));
        assert!(err.to_string().ends_with("no records in response"));
    }

    #[tokio::test]
    async fn acquisition_failure_skips_service_calls() {
        let completion = Arc::new(Scripted::new(&[]));
        let extractor = StructuredExtractor::new(Arc::new(Unreadable), completion.clone());

        let err = extractor.extract("anything", &doc()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Acquisition);
        assert!(completion.prompts.lock().unwrap().is_empty());
    }
}
