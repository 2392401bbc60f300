//! Error taxonomy for the retrieval core.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed query expression (mismatched parentheses).
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Operator arity violation or a final stack that does not hold exactly one set.
    #[error("query evaluation error: {0}")]
    QueryEvaluation(String),

    /// Missing, truncated or corrupt persisted index.
    #[error("failed to load index from {path}: {reason}")]
    IndexLoad { path: String, reason: String },

    /// Query text or operand that is not valid UTF-8, or normalizes to nothing.
    #[error("input encoding error: {0}")]
    InputEncoding(String),

    /// Handle used after release, against the wrong service, or in the wrong state.
    #[error("resource lifecycle error: {0}")]
    ResourceLifecycle(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SearchError {
    /// Short machine-readable tag, used by the HTTP layer.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::Syntax(_) => "syntax",
            SearchError::QueryEvaluation(_) => "query_evaluation",
            SearchError::IndexLoad { .. } => "index_load",
            SearchError::InputEncoding(_) => "input_encoding",
            SearchError::ResourceLifecycle(_) => "resource_lifecycle",
            SearchError::Io(_) => "io",
            SearchError::Serialization(_) => "serialization",
        }
    }

    /// True for failures caused by the query text rather than the engine.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            SearchError::Syntax(_) | SearchError::QueryEvaluation(_) | SearchError::InputEncoding(_)
        )
    }

    pub(crate) fn index_load(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        SearchError::IndexLoad { path: path.to_string(), reason: reason.to_string() }
    }
}

impl From<bincode::Error> for SearchError {
    fn from(e: bincode::Error) -> Self {
        SearchError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_errors_are_classified() {
        assert!(SearchError::Syntax("x".into()).is_query_error());
        assert!(SearchError::InputEncoding("x".into()).is_query_error());
        assert!(!SearchError::ResourceLifecycle("x".into()).is_query_error());
        assert_eq!(SearchError::index_load("a.bin", "missing").kind(), "index_load");
    }
}
