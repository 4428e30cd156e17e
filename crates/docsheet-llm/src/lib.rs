use std::sync::Arc;

use docsheet_core::{AppConfig, Provider, Result, TextCompletion};

mod anthropic;
mod openai;

pub use anthropic::AnthropicCompletion;
pub use openai::OpenAiCompletion;

/// Build the completion client selected by `config.provider`.
pub fn completion_from_config(config: &AppConfig) -> Result<Arc<dyn TextCompletion>> {
    let client: Arc<dyn TextCompletion> = match config.provider {
        Provider::Anthropic => Arc::new(AnthropicCompletion::from_config(config)?),
        Provider::OpenAi => Arc::new(OpenAiCompletion::from_config(config)?),
    };
    tracing::info!(provider = client.name(), "Text-completion client ready");
    Ok(client)
}
