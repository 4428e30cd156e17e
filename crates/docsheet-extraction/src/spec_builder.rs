use std::sync::Arc;

use tracing::{debug, instrument};

use docsheet_core::{Result, TextCompletion};

use crate::prompts::build_spec_prompt;

/// Elaborates a user's free-form request into field-level extraction guidance.
pub struct SpecBuilder {
    completion: Arc<dyn TextCompletion>,
}

impl SpecBuilder {
    pub fn new(completion: Arc<dyn TextCompletion>) -> Self {
        Self { completion }
    }

    /// Returns the service response verbatim. Service failures propagate since
    /// there is no safe default directive.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn elaborate(&self, query: &str) -> Result<String> {
        let directive = self.completion.complete(&build_spec_prompt(query)).await?;
        debug!(directive_len = directive.len(), "Elaborated extraction query");
        Ok(directive)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use docsheet_core::{DocsheetError, ErrorKind};

    use super::*;

    struct Echo;

    #[async_trait]
    impl TextCompletion for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            Ok(format!("DIRECTIVE<{}>", prompt.len()))
        }
    }

    struct Down;

    #[async_trait]
    impl TextCompletion for Down {
        fn name(&self) -> &str {
            "down"
        }

        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(DocsheetError::Service("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn returns_service_output_verbatim() {
        let builder = SpecBuilder::new(Arc::new(Echo));
        let expected = format!("DIRECTIVE<{}>", build_spec_prompt("dates").len());
        assert_eq!(builder.elaborate("dates").await.unwrap(), expected);
    }

    #[tokio::test]
    async fn service_failure_propagates() {
        let builder = SpecBuilder::new(Arc::new(Down));
        let err = builder.elaborate("dates").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Service);
    }
}
