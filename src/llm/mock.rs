//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on the model id or prompt
//! content, and records every call so tests can assert which stages ran.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{QuillError, Result};
use crate::llm::prompt::{CLASSIFY_REPLY_INSTRUCTION, GUARD_REPLY_INSTRUCTION, SQL_MARKER};
use crate::llm::types::{CompletionOptions, Message, Role};
use crate::llm::LlmClient;

/// One recorded completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    /// Model the request was addressed to.
    pub model: String,
    /// Prompt text (last user message).
    pub prompt: String,
    /// Decoding options sent with the request.
    pub options: CompletionOptions,
}

#[derive(Debug, Clone)]
enum Matcher {
    Model(String),
    Pattern(String),
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Error(String),
}

/// Mock LLM client that returns canned responses.
///
/// Clones share the call log, so a test can keep one handle while the
/// pipeline owns another.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    rules: Vec<(Matcher, Reply)>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the prompt contains `pattern` (case-insensitive), the mock returns `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.rules.push((
            Matcher::Pattern(pattern.into()),
            Reply::Text(response.into()),
        ));
        self
    }

    /// Returns `response` for every call addressed to `model`.
    pub fn with_model_response(
        mut self,
        model: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.rules
            .push((Matcher::Model(model.into()), Reply::Text(response.into())));
        self
    }

    /// Fails every call addressed to `model` with an LLM error.
    pub fn with_model_error(mut self, model: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules
            .push((Matcher::Model(model.into()), Reply::Error(message.into())));
        self
    }

    /// Sleeps before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Models called so far, in order.
    pub fn models_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.model).collect()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    fn find_rule(&self, model: &str, prompt: &str) -> Option<&Reply> {
        let prompt_lower = prompt.to_lowercase();
        self.rules
            .iter()
            .find(|(matcher, _)| match matcher {
                Matcher::Model(m) => m == model,
                Matcher::Pattern(p) => prompt_lower.contains(&p.to_lowercase()),
            })
            .map(|(_, reply)| reply)
    }

    /// Generates a default response by recognising the stage prompt.
    fn default_response(prompt: &str) -> String {
        if prompt.contains(GUARD_REPLY_INSTRUCTION) {
            return "VALID".to_string();
        }

        if prompt.contains(CLASSIFY_REPLY_INSTRUCTION) {
            let question = prompt.rsplit("Question:").next().unwrap_or("").to_lowercase();
            let structural = ["table", "column", "schema", "relationship", "foreign key"];
            return if structural.iter().any(|w| question.contains(w)) {
                "META".to_string()
            } else {
                "DATA".to_string()
            };
        }

        if prompt.contains(SQL_MARKER) {
            return "SELECT name FROM sqlite_master WHERE type = 'table';".to_string();
        }

        "This is a mock answer.".to_string()
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String> {
        let prompt = Self::extract_user_input(messages);

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(MockCall {
                model: model.to_string(),
                prompt: prompt.clone(),
                options: *options,
            });
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.find_rule(model, &prompt) {
            Some(Reply::Text(text)) => Ok(text.clone()),
            Some(Reply::Error(message)) => Err(QuillError::llm(message.clone())),
            None => Ok(Self::default_response(&prompt)),
        }
    }
}
