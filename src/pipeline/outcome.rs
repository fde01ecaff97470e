//! Result types produced by one pipeline invocation.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::db::QueryResult;
use crate::error::{QuillError, Result};

/// Which branch a question is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    /// About the database structure; answered from the schema alone.
    Meta,
    /// Needs row data; answered by running a query.
    Data,
}

impl Classification {
    /// Interprets a classifier response. Anything not mentioning META is DATA.
    pub fn from_response(response: &str) -> Self {
        if crate::llm::is_meta(response) {
            Self::Meta
        } else {
            Self::Data
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Meta => write!(f, "META"),
            Self::Data => write!(f, "DATA"),
        }
    }
}

/// The single result of handling one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// The guardrail refused the question.
    Rejected,
    /// A structural question answered from the schema; no SQL ran.
    MetaAnswer {
        text: String,
    },
    /// A data question answered from query results.
    DataAnswer {
        text: String,
        sql: String,
        results: QueryResult,
    },
    /// A stage failed; no answer was synthesized.
    Failed {
        #[serde(serialize_with = "serialize_error")]
        error: QuillError,
    },
}

impl PipelineOutcome {
    /// Returns the natural-language answer, if one was produced.
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::MetaAnswer { text } | Self::DataAnswer { text, .. } => Some(text),
            Self::Rejected | Self::Failed { .. } => None,
        }
    }

    /// Returns true when the outcome carries an answer.
    pub fn is_answer(&self) -> bool {
        self.answer().is_some()
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rejected => "rejected",
            Self::MetaAnswer { .. } => "meta_answer",
            Self::DataAnswer { .. } => "data_answer",
            Self::Failed { .. } => "failed",
        }
    }

    /// Converts the outcome into the answer text, or the error that prevented it.
    ///
    /// `Rejected` becomes [`QuillError::GuardrailRejected`].
    pub fn into_answer(self) -> Result<String> {
        match self {
            Self::MetaAnswer { text } | Self::DataAnswer { text, .. } => Ok(text),
            Self::Rejected => Err(QuillError::guardrail(
                "the question is off-topic or unsafe for this database",
            )),
            Self::Failed { error } => Err(error),
        }
    }
}

impl From<QuillError> for PipelineOutcome {
    fn from(error: QuillError) -> Self {
        Self::Failed { error }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    category: &'static str,
    message: String,
    rejection: bool,
}

fn serialize_error<S: Serializer>(
    error: &QuillError,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    ErrorBody {
        category: error.category(),
        message: error.to_string(),
        rejection: error.is_rejection(),
    }
    .serialize(serializer)
}
