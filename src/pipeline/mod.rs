//! Question routing pipeline.
//!
//! Sequences the stages for one question:
//!
//! ```text
//! Guardrail -> Classifier -> META: answer from schema
//!                         -> DATA: generate SQL -> filter -> execute -> format -> answer
//! ```
//!
//! The pipeline holds no per-question state, so one instance can serve
//! many invocations concurrently.

mod outcome;

pub use outcome::{Classification, PipelineOutcome};

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{Config, ModelRoster};
use crate::db::{DatabaseClient, QueryResult};
use crate::error::Result;
use crate::llm::{self, prompt, Gateway};
use crate::query::{format_tsv, QueryExecutor};
use crate::schema::SchemaText;

/// Explicit settings the pipeline is constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Model identifier per stage.
    pub models: ModelRoster,
    /// What the database holds, named in the guardrail prompt.
    pub description: String,
}

impl PipelineConfig {
    /// Extracts the pipeline settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            models: config.llm.models.clone(),
            description: config.database.description.clone(),
        }
    }
}

/// Artifacts of a successful data-branch run.
#[derive(Debug, Clone, PartialEq)]
pub struct DataAnswer {
    /// Statement that was executed.
    pub sql: String,
    /// Rows it returned.
    pub results: QueryResult,
    /// Synthesized answer.
    pub text: String,
}

/// The routing pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    gateway: Gateway,
    executor: QueryExecutor,
    schema: SchemaText,
}

impl Pipeline {
    /// Creates a pipeline over an already loaded schema.
    pub fn new(
        config: PipelineConfig,
        gateway: Gateway,
        db: Arc<dyn DatabaseClient>,
        schema: SchemaText,
    ) -> Self {
        Self {
            config,
            gateway,
            executor: QueryExecutor::new(db),
            schema,
        }
    }

    /// Handles one question end to end.
    ///
    /// Always returns exactly one outcome; stage errors become
    /// [`PipelineOutcome::Failed`].
    pub async fn handle(&self, question: &str) -> PipelineOutcome {
        let started = Instant::now();
        let outcome = match self.route(question).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(category = error.category(), error = %error, "Pipeline failed");
                PipelineOutcome::Failed { error }
            }
        };

        info!(
            outcome = outcome.kind(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Question handled"
        );
        outcome
    }

    /// Handles many questions with at most `concurrency` in flight.
    ///
    /// Outcomes are returned in input order.
    pub async fn handle_batch<S: AsRef<str>>(
        &self,
        questions: &[S],
        concurrency: usize,
    ) -> Vec<PipelineOutcome> {
        stream::iter(questions)
            .map(|question| self.handle(question.as_ref()))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    async fn route(&self, question: &str) -> Result<PipelineOutcome> {
        if !self.validate(question).await? {
            return Ok(PipelineOutcome::Rejected);
        }

        match self.classify(question).await? {
            Classification::Meta => Ok(PipelineOutcome::MetaAnswer {
                text: self.answer_from_schema(question).await?,
            }),
            Classification::Data => {
                let DataAnswer { sql, results, text } = self.answer_from_data(question).await?;
                Ok(PipelineOutcome::DataAnswer { text, sql, results })
            }
        }
    }

    /// Guardrail: true only when the guard model answers exactly `VALID`.
    pub async fn validate(&self, question: &str) -> Result<bool> {
        let prompt = prompt::guard_prompt(question, &self.config.description);
        let response = self
            .gateway
            .complete(&self.config.models.guard, &prompt)
            .await?;

        let accepted = llm::is_valid_verdict(&response);
        if accepted {
            debug!(stage = "guard", "Question accepted");
        } else {
            info!(stage = "guard", verdict = %response, "Question rejected");
        }
        Ok(accepted)
    }

    /// Classifier: META or DATA, with DATA as the fallback.
    pub async fn classify(&self, question: &str) -> Result<Classification> {
        let prompt = prompt::classify_prompt(question);
        let response = self
            .gateway
            .complete(&self.config.models.classify, &prompt)
            .await?;

        let classification = Classification::from_response(&response);
        info!(stage = "classify", %classification, "Question classified");
        Ok(classification)
    }

    /// Meta branch: answers from the schema text alone. Never touches the database.
    pub async fn answer_from_schema(&self, question: &str) -> Result<String> {
        let prompt = prompt::meta_answer_prompt(question, self.schema.as_str());
        self.gateway
            .complete(&self.config.models.answer, &prompt)
            .await
    }

    /// Data branch: generate, filter, execute, format, then synthesize.
    pub async fn answer_from_data(&self, question: &str) -> Result<DataAnswer> {
        let prompt = prompt::sql_prompt(question, self.schema.as_str());
        let raw = self
            .gateway
            .complete(&self.config.models.sql, &prompt)
            .await?;

        let sql = llm::extract_sql(&raw);
        info!(stage = "generate", sql_len = sql.len(), "SQL generated");
        debug!(sql = %sql, "Generated statement");

        let results = self.executor.execute(&sql).await?;
        let block = format_tsv(&results);

        let prompt = prompt::data_answer_prompt(question, &block);
        let text = self
            .gateway
            .complete(&self.config.models.answer, &prompt)
            .await?;

        Ok(DataAnswer { sql, results, text })
    }
}
