//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{QuillError, Result};
use crate::llm::{
    LlmClient, LlmProvider, MockLlmClient, OllamaClient, OllamaConfig, OpenAiClient, OpenAiConfig,
};

/// Creates an LLM client from configuration.
///
/// Remote providers need `config.api_key`, normally filled from
/// `OPENROUTER_API_KEY` or `OPENAI_API_KEY` by
/// [`LlmConfig::apply_env_defaults`]. `base_url` overrides the provider's
/// default endpoint.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let provider = config.provider()?;
    let base_url = config.base_url()?;

    match provider {
        LlmProvider::OpenRouter | LlmProvider::OpenAi => {
            let key = config.api_key.clone().ok_or_else(|| {
                QuillError::config(format!(
                    "No API key configured. Set {} or llm.api_key.",
                    provider.api_key_env().unwrap_or("an API key")
                ))
            })?;

            let mut client_config = match provider {
                LlmProvider::OpenAi => OpenAiConfig::openai(key),
                _ => OpenAiConfig::openrouter(key),
            }
            .with_timeout(config.timeout_secs);
            if let Some(url) = base_url {
                client_config = client_config.with_url(url.as_str());
            }

            Ok(Arc::new(OpenAiClient::new(client_config)?))
        }
        LlmProvider::Ollama => {
            let mut client_config = OllamaConfig::new().with_timeout(config.timeout_secs);
            if let Some(url) = base_url {
                client_config = client_config.with_url(url.as_str());
            }
            Ok(Arc::new(OllamaClient::new(client_config)?))
        }
        LlmProvider::Mock => Ok(Arc::new(MockLlmClient::new())),
    }
}
