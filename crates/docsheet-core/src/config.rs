use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DocsheetError, Result};

/// Which hosted model API backs the text-completion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Anthropic,
    OpenAi,
}

impl std::str::FromStr for Provider {
    type Err = DocsheetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" | "open_ai" => Ok(Self::OpenAi),
            other => Err(DocsheetError::Config(format!("unknown provider '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub provider: Provider,
    pub anthropic_api_key: String,
    pub openai_api_key: String,
    /// Overrides the provider's default model when set.
    pub model: Option<String>,
    /// Overrides the provider's default endpoint base URL when set.
    pub api_base: Option<String>,
    pub request_timeout_secs: u64,
    pub max_concurrency: usize,
    pub max_batch_size: usize,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_ttl_secs: u64,
    pub tesseract_cmd: String,
    /// Tesseract language pack(s); tesseract's own default when unset.
    pub ocr_language: Option<String>,
    pub pdftoppm_cmd: String,
    pub pdf_render_dpi: u32,
    pub server_host: String,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Anthropic,
            anthropic_api_key: String::new(),
            openai_api_key: String::new(),
            model: None,
            api_base: None,
            request_timeout_secs: 120,
            max_concurrency: 4,
            max_batch_size: 50,
            upload_dir: PathBuf::from("temp_uploads"),
            output_dir: PathBuf::from("outputs"),
            output_ttl_secs: 3600,
            tesseract_cmd: "tesseract".into(),
            ocr_language: None,
            pdftoppm_cmd: "pdftoppm".into(),
            pdf_render_dpi: 200,
            server_host: "0.0.0.0".into(),
            server_port: 8000,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let provider = match std::env::var("DOCSHEET_PROVIDER") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default provider");
                defaults.provider
            }),
            Err(_) => defaults.provider,
        };

        Self {
            provider,
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            model: std::env::var("DOCSHEET_MODEL").ok().filter(|m| !m.is_empty()),
            api_base: std::env::var("DOCSHEET_API_BASE").ok().filter(|b| !b.is_empty()),
            request_timeout_secs: env_parse(
                "DOCSHEET_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            ),
            max_concurrency: env_parse("DOCSHEET_MAX_CONCURRENCY", defaults.max_concurrency)
                .max(1),
            max_batch_size: env_parse("DOCSHEET_MAX_BATCH_SIZE", defaults.max_batch_size).max(1),
            upload_dir: std::env::var("DOCSHEET_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            output_dir: std::env::var("DOCSHEET_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            output_ttl_secs: env_parse("DOCSHEET_OUTPUT_TTL_SECS", defaults.output_ttl_secs),
            tesseract_cmd: std::env::var("TESSERACT_CMD").unwrap_or(defaults.tesseract_cmd),
            ocr_language: std::env::var("TESSERACT_LANG").ok().filter(|l| !l.is_empty()),
            pdftoppm_cmd: std::env::var("PDFTOPPM_CMD").unwrap_or(defaults.pdftoppm_cmd),
            pdf_render_dpi: env_parse("DOCSHEET_PDF_DPI", defaults.pdf_render_dpi).max(1),
            server_host: std::env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: env_parse("SERVER_PORT", defaults.server_port),
        }
    }

    /// The API key for the configured provider, or a config error if it is unset.
    pub fn api_key(&self) -> Result<&str> {
        let (key, var) = match self.provider {
            Provider::Anthropic => (&self.anthropic_api_key, "ANTHROPIC_API_KEY"),
            Provider::OpenAi => (&self.openai_api_key, "OPENAI_API_KEY"),
        };
        if key.is_empty() {
            return Err(DocsheetError::Config(format!("{var} is not set")));
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_aliases() {
        assert_eq!("Claude".parse::<Provider>().unwrap(), Provider::Anthropic);
        assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert!("bard".parse::<Provider>().is_err());
    }

    #[test]
    fn api_key_requires_value_for_selected_provider() {
        let mut config = AppConfig {
            provider: Provider::OpenAi,
            anthropic_api_key: "sk-ant".into(),
            ..AppConfig::default()
        };
        assert!(matches!(config.api_key(), Err(DocsheetError::Config(_))));

        config.openai_api_key = "sk-openai".into();
        assert_eq!(config.api_key().unwrap(), "sk-openai");
    }

    #[test]
    fn defaults_bound_batches_and_concurrency() {
        let config = AppConfig::default();
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.max_batch_size, 50);
        assert_eq!(config.request_timeout_secs, 120);
        assert_eq!(config.pdf_render_dpi, 200);
        assert!(config.ocr_language.is_none());
    }
}
