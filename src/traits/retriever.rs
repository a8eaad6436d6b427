//! Retriever trait for the external vector index.
//!
//! The retrieval index is an external collaborator: the pipeline hands it the
//! chunk corpus once per document run and queries it for agent context. The
//! embedding mechanism behind `search` is an implementation detail - callers
//! must not assume a specific dimensionality, only that similarity lands
//! in [0, 1].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::segment::Chunk;

/// A chunk returned from a retrieval search, with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The chunk text.
    pub document: String,

    /// Cosine-derived similarity in [0, 1].
    pub similarity: f32,

    /// Stable chunk identifier within the indexed corpus.
    pub id: String,
}

/// Retrieval index over a document's chunk corpus.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Index a chunk corpus, replacing whatever was indexed before.
    async fn index(&self, chunks: &[Chunk]) -> Result<()>;

    /// Return the top-k chunks most relevant to the query.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>>;

    /// Drop all indexed chunks.
    async fn clear(&self) -> Result<()>;

    /// Concatenate the top-k search hits into one context string.
    ///
    /// This is the form the extraction agents consume.
    async fn context(&self, query: &str, top_k: usize) -> Result<String> {
        let results = self.search(query, top_k).await?;
        Ok(results
            .iter()
            .map(|r| r.document.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}
