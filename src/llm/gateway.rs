//! Single entry point for model calls made by the pipeline.
//!
//! Wraps a provider client with the fixed decoding options and a hard
//! per-call timeout. Every stage goes through [`Gateway::complete`].

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::{QuillError, Result};
use crate::llm::types::{CompletionOptions, Message};
use crate::llm::LlmClient;

/// Model gateway shared by all pipeline stages.
#[derive(Clone)]
pub struct Gateway {
    client: Arc<dyn LlmClient>,
    options: CompletionOptions,
    timeout: Duration,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("options", &self.options)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Creates a gateway with deterministic defaults (temperature 0.0, 500 tokens, 30s).
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            options: CompletionOptions::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Creates a gateway using the decoding options and timeout from `config`.
    pub fn from_config(client: Arc<dyn LlmClient>, config: &LlmConfig) -> Self {
        Self::new(client)
            .with_options(CompletionOptions {
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            })
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    /// Overrides the decoding options.
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Overrides the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends `prompt` to `model` and returns the trimmed completion.
    ///
    /// Network errors, provider errors, timeouts and blank completions all
    /// surface as [`QuillError::Llm`]. Nothing is retried.
    pub async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        let messages = [Message::user(prompt)];
        let started = Instant::now();

        let outcome = tokio::time::timeout(
            self.timeout,
            self.client.complete(model, &messages, &self.options),
        )
        .await;

        let text = match outcome {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(model, error = %e, "Gateway call failed");
                return Err(e);
            }
            Err(_) => {
                warn!(model, timeout_secs = self.timeout.as_secs_f64(), "Gateway call timed out");
                return Err(QuillError::llm(format!(
                    "Model {} timed out after {:.1}s",
                    model,
                    self.timeout.as_secs_f64()
                )));
            }
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(QuillError::llm(format!("Empty completion from {}", model)));
        }

        debug!(
            model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            chars = text.len(),
            "Gateway call completed"
        );
        Ok(text.to_string())
    }
}
