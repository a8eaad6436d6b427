//! Stage 1: chunk summarization fan-out and the overview combiner.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::pipeline::agents::parse_response;
use crate::pipeline::prompts;
use crate::segment::{Chunk, ParsedDocument};
use crate::traits::{Completion, CompletionOptions};

const SUMMARIZE_SYSTEM_PROMPT: &str =
    "You are a medical research assistant summarizing part of a clinical trial paper. \
     Respond with JSON only.";

const COMBINE_SYSTEM_PROMPT: &str =
    "You are a medical research assistant synthesizing a clinical trial paper overview.";

/// Summary of one sampled chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkSummary {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
}

/// Evenly-strided sample of up to `max_chunks` chunks.
///
/// Long papers are sampled rather than exhaustively summarized; the stride
/// keeps coverage spread from front matter to references.
pub fn sample_chunks(chunks: &[Chunk], max_chunks: usize) -> Vec<&Chunk> {
    let stride = (chunks.len() / max_chunks.max(1)).max(1);
    chunks.iter().step_by(stride).take(max_chunks).collect()
}

/// Stage 1: summarize sampled chunks in parallel, then combine into a paper
/// overview.
///
/// Infallible by construction: a failed or garbled chunk summary degrades to
/// an empty [`ChunkSummary`], and a failed combiner call degrades to the
/// concatenated part summaries. Section fallbacks downstream cover the
/// worst case of an entirely empty overview.
pub async fn build_overview(
    completion: &dyn Completion,
    document: &ParsedDocument,
    max_chunks: usize,
) -> String {
    let sampled = sample_chunks(&document.chunks, max_chunks);
    let total = sampled.len();
    info!(
        sampled = total,
        available = document.chunks.len(),
        "summarizing sampled chunks"
    );

    let tasks = sampled.iter().enumerate().map(|(i, chunk)| async move {
        let prompt = prompts::format_summarize_chunk_prompt(&chunk.text, i + 1, total);
        let response = completion
            .complete(SUMMARIZE_SYSTEM_PROMPT, &prompt, &CompletionOptions::json())
            .await?;
        parse_response::<ChunkSummary>(&response)
    });

    let summaries: Vec<(usize, ChunkSummary)> = join_all(tasks)
        .await
        .into_iter()
        .enumerate()
        .map(|(i, outcome)| match outcome {
            Ok(summary) => (i + 1, summary),
            Err(error) => {
                warn!(part = i + 1, %error, "chunk summary failed, using empty summary");
                (i + 1, ChunkSummary::default())
            }
        })
        .collect();

    combine_summaries(completion, &summaries).await
}

/// Combine per-part summaries into a single overview, falling back to plain
/// concatenation when the combiner call fails.
async fn combine_summaries(
    completion: &dyn Completion,
    summaries: &[(usize, ChunkSummary)],
) -> String {
    let parts: Vec<(usize, String)> = summaries
        .iter()
        .filter(|(_, s)| !s.summary.trim().is_empty())
        .map(|(part, s)| (*part, s.summary.clone()))
        .collect();

    let key_points: Vec<String> = summaries
        .iter()
        .flat_map(|(_, s)| s.key_points.iter().cloned())
        .take(20)
        .collect();

    let prompt = prompts::format_combine_prompt(&parts, &key_points);
    match completion
        .complete(COMBINE_SYSTEM_PROMPT, &prompt, &CompletionOptions::default())
        .await
    {
        Ok(overview) => overview,
        Err(error) => {
            warn!(%error, "combiner failed, concatenating part summaries");
            parts
                .iter()
                .map(|(part, text)| format!("Part {part}: {text}"))
                .collect::<Vec<_>>()
                .join("\n\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockCompletion;

    fn doc_with_chunks(n: usize) -> ParsedDocument {
        let sentences: Vec<String> = (0..n * 40)
            .map(|i| format!("Sentence number {i} carries roughly one hundred characters of padding text for the chunker to pack."))
            .collect();
        ParsedDocument::from_text(sentences.join(" "))
    }

    #[test]
    fn test_sample_chunks_caps_at_limit() {
        let doc = doc_with_chunks(30);
        assert!(doc.chunks.len() > 10);
        let sampled = sample_chunks(&doc.chunks, 10);
        assert!(sampled.len() <= 10);
        assert_eq!(sampled[0].index, 0);
    }

    #[test]
    fn test_sample_chunks_short_document_takes_all() {
        let doc = doc_with_chunks(2);
        let sampled = sample_chunks(&doc.chunks, 10);
        assert_eq!(sampled.len(), doc.chunks.len());
    }

    #[tokio::test]
    async fn test_build_overview_uses_combiner() {
        let completion = MockCompletion::new()
            .with_response(
                "You are summarizing Part",
                "{\"summary\": \"part summary\", \"key_points\": [\"kp\"]}".to_string(),
            )
            .with_response("combining summaries", "THE OVERVIEW".to_string());
        let doc = doc_with_chunks(2);

        let overview = build_overview(&completion, &doc, 10).await;
        assert_eq!(overview, "THE OVERVIEW");
    }

    #[tokio::test]
    async fn test_build_overview_concat_fallback() {
        let completion = MockCompletion::new()
            .with_response(
                "You are summarizing Part",
                "{\"summary\": \"part summary\", \"key_points\": []}".to_string(),
            )
            .with_failure("combining summaries");
        let doc = doc_with_chunks(2);

        let overview = build_overview(&completion, &doc, 10).await;
        assert!(overview.contains("Part 1: part summary"));
    }

    #[tokio::test]
    async fn test_garbled_chunk_summary_degrades() {
        let completion = MockCompletion::new()
            .with_response("You are summarizing Part", "not json".to_string())
            .with_response("combining summaries", "OVERVIEW".to_string());
        let doc = doc_with_chunks(1);

        let overview = build_overview(&completion, &doc, 10).await;
        assert_eq!(overview, "OVERVIEW");
    }
}
