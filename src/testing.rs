//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the extraction library
//! without making real model or network calls.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::error::{ExtractionError, Result};
use crate::segment::Chunk;
use crate::traits::{Completion, CompletionOptions, Retriever, ScoredChunk};

/// A scripted step registered on [`MockCompletion`].
enum Script {
    Respond(String),
    Fail,
}

/// A mock completion client for testing.
///
/// Responses are keyed by a substring of the user prompt; the most recently
/// registered matching entry wins, so a test can override an earlier script.
/// Unscripted prompts return an error, which keeps silent test drift from
/// going unnoticed.
#[derive(Default)]
pub struct MockCompletion {
    scripts: Arc<RwLock<Vec<(String, Script)>>>,

    /// User prompts seen, in call order.
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockCompletion {
    /// Create a new mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with `response` to any user prompt containing `key`.
    pub fn with_response(self, key: impl Into<String>, response: impl Into<String>) -> Self {
        self.scripts
            .write()
            .unwrap()
            .push((key.into(), Script::Respond(response.into())));
        self
    }

    /// Fail any user prompt containing `key`.
    pub fn with_failure(self, key: impl Into<String>) -> Self {
        self.scripts
            .write()
            .unwrap()
            .push((key.into(), Script::Fail));
        self
    }

    /// All user prompts seen, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// The most recent user prompt, if any call was made.
    pub fn last_user_prompt(&self) -> Option<String> {
        self.calls.read().unwrap().last().cloned()
    }
}

#[async_trait]
impl Completion for MockCompletion {
    async fn complete(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String> {
        self.calls.write().unwrap().push(user_prompt.to_string());

        let scripts = self.scripts.read().unwrap();
        for (key, script) in scripts.iter().rev() {
            if user_prompt.contains(key.as_str()) {
                return match script {
                    Script::Respond(response) => Ok(response.clone()),
                    Script::Fail => Err(ExtractionError::Completion(
                        format!("scripted failure for key {key:?}").into(),
                    )),
                };
            }
        }

        let lead: String = user_prompt.chars().take(80).collect();
        Err(ExtractionError::Completion(
            format!("no scripted response matches prompt starting {lead:?}").into(),
        ))
    }
}

/// A mock retrieval index for testing.
///
/// Returns the configured context for every query; `index` and `clear`
/// record their invocations and succeed.
#[derive(Default)]
pub struct MockRetriever {
    context: Option<String>,
    indexed: Arc<RwLock<Vec<Chunk>>>,
    cleared: Arc<RwLock<usize>>,
}

impl MockRetriever {
    /// Create a mock that returns no hits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `context` as the single hit for every query.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Chunks handed to `index` so far.
    pub fn indexed_chunks(&self) -> Vec<Chunk> {
        self.indexed.read().unwrap().clone()
    }

    /// Number of `clear` calls.
    pub fn clear_count(&self) -> usize {
        *self.cleared.read().unwrap()
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn index(&self, chunks: &[Chunk]) -> Result<()> {
        self.indexed.write().unwrap().extend(chunks.iter().cloned());
        Ok(())
    }

    async fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<ScoredChunk>> {
        Ok(self
            .context
            .iter()
            .map(|c| ScoredChunk {
                document: c.clone(),
                similarity: 1.0,
                id: "mock-chunk".to_string(),
            })
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        *self.cleared.write().unwrap() += 1;
        self.indexed.write().unwrap().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_completion_keys_on_substring() {
        let mock = MockCompletion::new().with_response("summarize", "a summary".to_string());

        let response = mock
            .complete("system", "please summarize this", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(response, "a summary");
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_completion_last_registration_wins() {
        let mock = MockCompletion::new()
            .with_response("summarize", "first")
            .with_response("summarize", "second");

        let response = mock
            .complete("system", "summarize", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(response, "second");
    }

    #[tokio::test]
    async fn test_mock_completion_unscripted_errors() {
        let mock = MockCompletion::new();
        let result = mock
            .complete("system", "anything", &CompletionOptions::default())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_completion_scripted_failure() {
        let mock = MockCompletion::new().with_failure("summarize");
        let result = mock
            .complete("system", "summarize", &CompletionOptions::default())
            .await;
        assert!(matches!(result, Err(ExtractionError::Completion(_))));
    }

    #[tokio::test]
    async fn test_mock_retriever_tracks_index_and_clear() {
        let mock = MockRetriever::new().with_context("ctx");
        mock.index(&[Chunk::new(0, "chunk")]).await.unwrap();
        assert_eq!(mock.indexed_chunks().len(), 1);

        let context = mock.context("query", 3).await.unwrap();
        assert_eq!(context, "ctx");

        mock.clear().await.unwrap();
        assert_eq!(mock.clear_count(), 1);
        assert!(mock.indexed_chunks().is_empty());
    }
}
