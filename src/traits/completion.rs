//! Completion trait for LLM operations.
//!
//! The pipeline never talks to a specific provider directly. Every agent goes
//! through this trait, which wraps a single chat-style completion call.
//! Implementations wrap specific providers (OpenAI, Anthropic, local models)
//! and handle transport specifics.

use async_trait::async_trait;

use crate::error::{ExtractionError, Result};

/// Per-call options for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Model override (None = implementation default)
    pub model: Option<String>,

    /// Sampling temperature. Extraction agents run low (0.1-0.3).
    pub temperature: f32,

    /// Maximum tokens in the response.
    pub max_tokens: Option<u32>,

    /// Hint that the response must be a JSON object.
    ///
    /// Callers must still tolerate stray prose around the JSON - see
    /// [`find_json_object`]. Not every provider honors the hint.
    pub json_mode: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.2,
            max_tokens: None,
            json_mode: false,
        }
    }
}

impl CompletionOptions {
    /// Options for a strict JSON-output call.
    pub fn json() -> Self {
        Self {
            json_mode: true,
            temperature: 0.1,
            ..Default::default()
        }
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max response tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Override the model for this call.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Completion trait for LLM calls.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Run one chat completion and return the raw response text.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String>;
}

/// Locate the first balanced `{...}` object in a completion response.
///
/// Model output is rarely machine-clean even in json mode - responses often
/// carry leading commentary or trailing markdown fences. This takes the slice
/// from the first `{` to the last `}`, which is how the extraction agents
/// recover the payload.
pub fn find_json_object(text: &str) -> Result<&str> {
    let start = text.find('{').ok_or(ExtractionError::MissingJson)?;
    let end = text.rfind('}').ok_or(ExtractionError::MissingJson)?;
    if end < start {
        return Err(ExtractionError::MissingJson);
    }
    Ok(&text[start..=end])
}
