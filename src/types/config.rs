//! Configuration for the extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::segment::{CHUNK_TOKENS, OVERLAP_TOKENS};

/// Tuning knobs for a pipeline run.
///
/// The defaults match the sizes the pipeline was calibrated with; most
/// callers never touch this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Target chunk size in estimated tokens. Default: 1024.
    pub chunk_tokens: usize,

    /// Overlap between consecutive chunks in estimated tokens. Default: 128.
    pub overlap_tokens: usize,

    /// At most this many chunks are summarized for the paper overview,
    /// sampled evenly across the document. Default: 10.
    pub max_sampled_chunks: usize,

    /// Retrieval depth for context-gathering searches. Default: 6.
    pub retrieval_top_k: usize,

    /// Minimum section length before a task falls back to the overview.
    /// Default: 80.
    pub min_section_chars: usize,

    /// Length floor for the abstract, which is naturally short. Default: 50.
    pub min_abstract_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_tokens: CHUNK_TOKENS,
            overlap_tokens: OVERLAP_TOKENS,
            max_sampled_chunks: 10,
            retrieval_top_k: 6,
            min_section_chars: 80,
            min_abstract_chars: 50,
        }
    }
}

impl PipelineConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk size and overlap in estimated tokens.
    pub fn with_chunking(mut self, chunk_tokens: usize, overlap_tokens: usize) -> Self {
        self.chunk_tokens = chunk_tokens;
        self.overlap_tokens = overlap_tokens;
        self
    }

    /// Set the overview sample cap.
    pub fn with_max_sampled_chunks(mut self, max: usize) -> Self {
        self.max_sampled_chunks = max;
        self
    }

    /// Set the retrieval depth.
    pub fn with_retrieval_top_k(mut self, top_k: usize) -> Self {
        self.retrieval_top_k = top_k;
        self
    }
}
