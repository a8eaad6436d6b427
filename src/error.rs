//! Typed errors for the extraction pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur during extraction operations.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Completion service unavailable or failed
    #[error("completion service error: {0}")]
    Completion(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Retrieval index unavailable or failed
    #[error("retrieval error: {0}")]
    Retrieval(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// No balanced JSON object found in a completion response
    #[error("no JSON object in completion response")]
    MissingJson,

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error - the one fatal, construction-time failure
    #[error("config error: {0}")]
    Config(String),
}

impl ExtractionError {
    /// Wrap an arbitrary error as a completion-service failure.
    pub fn completion(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Completion(Box::new(err))
    }

    /// Wrap an arbitrary error as a retrieval failure.
    pub fn retrieval(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Retrieval(Box::new(err))
    }
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtractionError::Config("OPENAI_API_KEY not set".to_string());
        assert_eq!(err.to_string(), "config error: OPENAI_API_KEY not set");

        let err = ExtractionError::MissingJson;
        assert!(err.to_string().contains("JSON"));
    }

    #[test]
    fn test_json_error_converts() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: ExtractionError = parse_err.into();
        assert!(matches!(err, ExtractionError::JsonParse(_)));
    }
}
