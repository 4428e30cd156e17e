use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use docsheet_core::{AppConfig, DocsheetError, Result, TextCompletion};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
const MAX_TOKENS: u32 = 4096;

/// Text completion over the Anthropic Messages API.
pub struct AnthropicCompletion {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

// ── Anthropic Messages API request/response types ──────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

// ── Implementation ─────────────────────────────────────────────────────────

impl AnthropicCompletion {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: ANTHROPIC_API_BASE.to_string(),
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

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextCompletion for AnthropicCompletion {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "Sending completion request to Anthropic API"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
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
                "Anthropic API returned status {status}: {body}"
            )));
        }

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| DocsheetError::Service(format!("Failed to parse API response: {e}")))?;

        let text = api_response
            .content
            .iter()
            .find_map(|block| {
                if block.block_type == "text" {
                    block.text.clone()
                } else {
                    None
                }
            })
            .ok_or_else(|| {
                DocsheetError::Service("No text content block in API response".to_string())
            })?;

        tracing::debug!(
            stop_reason = ?api_response.stop_reason,
            response_len = text.len(),
            "Received completion from Anthropic API"
        );

        Ok(text)
    }
}
