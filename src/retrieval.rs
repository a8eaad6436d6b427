//! In-process retrieval index.
//!
//! Term-overlap scoring over lowercased word sets. Deliberately simple: it
//! runs with no model or network dependency, and similarity is normalized to
//! [0, 1] so callers can threshold against it the same way they would with an
//! embedding-backed index.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ExtractionError, Result};
use crate::segment::Chunk;
use crate::traits::{Retriever, ScoredChunk};

struct IndexedChunk {
    id: Uuid,
    text: String,
    terms: HashSet<String>,
}

/// Retrieval index backed by process memory.
#[derive(Default)]
pub struct MemoryIndex {
    chunks: RwLock<Vec<IndexedChunk>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Lowercased alphanumeric terms of three or more characters.
fn terms_of(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(str::to_string)
        .collect()
}

/// Fraction of query terms present in the chunk, in [0, 1].
fn overlap_score(query_terms: &HashSet<String>, chunk_terms: &HashSet<String>) -> f32 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let hits = query_terms.intersection(chunk_terms).count();
    hits as f32 / query_terms.len() as f32
}

#[async_trait]
impl Retriever for MemoryIndex {
    async fn index(&self, chunks: &[Chunk]) -> Result<()> {
        let mut store = self
            .chunks
            .write()
            .map_err(|_| ExtractionError::Retrieval("index lock poisoned".into()))?;
        for chunk in chunks {
            store.push(IndexedChunk {
                id: Uuid::new_v4(),
                text: chunk.text.clone(),
                terms: terms_of(&chunk.text),
            });
        }
        debug!(indexed = chunks.len(), total = store.len(), "chunks indexed");
        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
        let query_terms = terms_of(query);
        let store = self
            .chunks
            .read()
            .map_err(|_| ExtractionError::Retrieval("index lock poisoned".into()))?;

        let mut scored: Vec<ScoredChunk> = store
            .iter()
            .map(|chunk| ScoredChunk {
                id: chunk.id.to_string(),
                document: chunk.text.clone(),
                similarity: overlap_score(&query_terms, &chunk.terms),
            })
            .filter(|s| s.similarity > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn clear(&self) -> Result<()> {
        let mut store = self
            .chunks
            .write()
            .map_err(|_| ExtractionError::Retrieval("index lock poisoned".into()))?;
        store.clear();
        Ok(())
    }
}
