//! Error types for Kialo ingestion.

use std::path::PathBuf;

use crate::ids::StatementId;

pub type Result<T, E = KialoError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum KialoError {
    /// The export has no line 1, so there is no topic to read.
    #[error("document has {line_count} line(s); the topic is expected on line 2")]
    MissingTopic { line_count: usize },

    #[error("negating {statement}: {source}")]
    Negation {
        statement: StatementId,
        #[source]
        source: NegationError,
    },

    /// An id produced by this parse run could not be resolved again.
    /// Always a logic defect, never bad input.
    #[error("internal consistency: {id} referenced by {referenced_by} has no statement")]
    UnresolvedStatement { id: String, referenced_by: String },

    #[error("internal consistency: premise references unknown argument {argument}")]
    UnresolvedArgument { argument: String },

    #[error("invalid {kind} id `{value}`")]
    InvalidId { kind: &'static str, value: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of the negation collaborator. Never substituted with empty text.
#[derive(Debug, thiserror::Error)]
pub enum NegationError {
    #[error("negator returned empty text")]
    Empty,
    #[error("negation backend unavailable: {0}")]
    Unavailable(String),
    #[error("invalid negation response: {0}")]
    InvalidResponse(String),
}
