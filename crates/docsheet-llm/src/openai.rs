use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use docsheet_core::{AppConfig, DocsheetError, Result, TextCompletion};

const OPENAI_API_BASE: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Text completion over the OpenAI chat-completions API.
pub struct OpenAiCompletion {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiCompletion {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: OPENAI_API_BASE.to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut completion = Self::new(
            config.api_key()?,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        if let Some(model) = &config.model {
            completion = completion.with_model(model.as_str());
        }
        if let Some(base) = &config.api_base {
            completion = completion.with_base_url(base.as_str());
        }
        Ok(completion)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl TextCompletion for OpenAiCompletion {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!(
                "{}/v1/chat/completions",
                self.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DocsheetError::Service(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(DocsheetError::Service(format!(
                "OpenAI API returned status {status}: {body}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| DocsheetError::Service(format!("Failed to parse API response: {e}")))?;

        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DocsheetError::Service("API response contained no choices".into()))?;

        tracing::debug!(finish_reason = ?choice.finish_reason, "Received chat completion");

        choice
            .message
            .content
            .ok_or_else(|| DocsheetError::Service("API response message had no content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_first_choice_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"Field list: name, date"},"finish_reason":"stop"}]}"#,
            )
            .create_async()
            .await;

        let client = OpenAiCompletion::new("sk-test", Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.url());
        let text = client.complete("describe").await.unwrap();
        assert_eq!(text, "Field list: name, date");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_choices_is_service_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = OpenAiCompletion::new("sk-test", Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.url());
        let err = client.complete("describe").await.unwrap_err();
        assert!(matches!(err, DocsheetError::Service(_)));
    }
}
