//! Text segmentation - chunking and section detection.
//!
//! Splits raw paper text into overlapping, token-bounded chunks and locates
//! canonical sections (abstract, methods, results, ...) by first-occurrence
//! header search. The output of this module - the [`ParsedDocument`] - is the
//! read-only context shared by every later pipeline stage.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Canonical section headers, searched case-insensitively.
pub const SECTION_HEADERS: [&str; 8] = [
    "abstract",
    "background",
    "introduction",
    "methods",
    "results",
    "discussion",
    "conclusions",
    "references",
];

/// Default chunk size in tokens.
pub const CHUNK_TOKENS: usize = 1024;

/// Default overlap between consecutive chunks, in tokens.
pub const OVERLAP_TOKENS: usize = 128;

/// Rough character-per-token ratio for the fallback estimator.
const CHARS_PER_TOKEN: usize = 4;

lazy_static! {
    // Word-bounded, case-insensitive matchers for each canonical header.
    static ref SECTION_REGEXES: Vec<(&'static str, Regex)> = SECTION_HEADERS
        .iter()
        .map(|header| {
            let re = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(header)))
                .case_insensitive(true)
                .build()
                .unwrap();
            (*header, re)
        })
        .collect();
}

/// Mapping from canonical section name to its start offset in the full text.
///
/// Insertion order follows [`SECTION_HEADERS`], so iteration is deterministic.
/// A section's end is the smallest start offset greater than its own, or
/// end-of-text.
pub type SectionMap = IndexMap<String, usize>;

/// An ordered fragment of document text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable position of this chunk in the document.
    pub index: usize,

    /// The chunk text, including overlap carried from the previous chunk.
    pub text: String,
}

impl Chunk {
    /// Create a chunk at the given position.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Pluggable token estimation.
///
/// Estimates only need to be approximate, but must be monotonic: longer text
/// never yields a smaller estimate.
pub trait TokenEstimator: Send + Sync {
    /// Estimate the token count of `text`.
    fn estimate(&self, text: &str) -> usize;
}

/// Character-count estimator (len / 4).
///
/// The fallback when no real tokenizer is wired in; good enough for chunk
/// sizing, and trivially monotonic.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharEstimator;

impl TokenEstimator for CharEstimator {
    fn estimate(&self, text: &str) -> usize {
        text.len() / CHARS_PER_TOKEN
    }
}

/// Summary statistics for a parsed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStats {
    pub total_chars: usize,
    pub total_tokens: usize,
    pub num_chunks: usize,
    pub avg_tokens_per_chunk: f64,
}

/// The parsed document: raw text, section map, and chunk list.
///
/// Built once per run and then read-only - no pipeline stage mutates it, so
/// it can be shared across fan-out tasks without locking.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Full document text.
    pub raw_text: String,

    /// Detected section start offsets.
    pub sections: SectionMap,

    /// Overlapping token-bounded chunks.
    pub chunks: Vec<Chunk>,

    /// Size statistics.
    pub stats: DocumentStats,
}

impl ParsedDocument {
    /// Parse raw text with default chunk sizing.
    ///
    /// Empty or whitespace-only input yields zero chunks and an empty section
    /// map rather than an error - callers degrade, they don't crash.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_text_with(text, CHUNK_TOKENS, OVERLAP_TOKENS, &CharEstimator)
    }

    /// Parse raw text with explicit chunk sizing and token estimator.
    pub fn from_text_with(
        text: impl Into<String>,
        target_tokens: usize,
        overlap_tokens: usize,
        estimator: &dyn TokenEstimator,
    ) -> Self {
        let raw_text = text.into();
        let sections = detect_sections(&raw_text);
        let chunks = chunk_text(&raw_text, target_tokens, overlap_tokens, estimator);

        let total_tokens = estimator.estimate(&raw_text);
        let stats = DocumentStats {
            total_chars: raw_text.len(),
            total_tokens,
            num_chunks: chunks.len(),
            avg_tokens_per_chunk: if chunks.is_empty() {
                0.0
            } else {
                total_tokens as f64 / chunks.len() as f64
            },
        };

        debug!(
            chars = stats.total_chars,
            chunks = stats.num_chunks,
            sections = sections.len(),
            "parsed document"
        );

        Self {
            raw_text,
            sections,
            chunks,
            stats,
        }
    }

    /// Text of a named section, using the precomputed section map.
    pub fn section(&self, name: &str) -> String {
        extract_section_from_map(&self.raw_text, &self.sections, name)
    }

    /// Leading text of the document (roughly the first page).
    pub fn lead_text(&self, max_chars: usize) -> &str {
        let mut end = max_chars.min(self.raw_text.len());
        while !self.raw_text.is_char_boundary(end) {
            end -= 1;
        }
        &self.raw_text[..end]
    }

    /// True when nothing usable was parsed.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Detect canonical section headers in `text`.
///
/// Case-insensitive, word-boundary, first occurrence wins. Headers that do
/// not appear are simply absent from the map.
pub fn detect_sections(text: &str) -> SectionMap {
    let mut sections = SectionMap::new();

    for (header, re) in SECTION_REGEXES.iter() {
        match re.find(text) {
            Some(m) => {
                sections.insert(header.to_string(), m.start());
            }
            None => {
                debug!(section = *header, "section not found in document");
            }
        }
    }

    sections
}

/// Extract a named section from `text`, detecting sections internally.
///
/// Returns an empty string when the section is absent.
pub fn extract_section(text: &str, section_name: &str) -> String {
    let sections = detect_sections(text);
    extract_section_from_map(text, &sections, section_name)
}

/// Extract a named section using a precomputed section map.
///
/// The section runs from its own start to the smallest start offset of any
/// other detected section after it, or end-of-text.
pub fn extract_section_from_map(text: &str, sections: &SectionMap, section_name: &str) -> String {
    let name = section_name.to_lowercase();
    let Some(&start) = sections.get(&name) else {
        return String::new();
    };

    let end = sections
        .values()
        .copied()
        .filter(|&pos| pos > start)
        .min()
        .unwrap_or(text.len());

    text[start..end].trim().to_string()
}

/// Split `text` into overlapping chunks on sentence boundaries.
///
/// Sentences are greedily appended while the estimated token count stays at
/// or below `target_tokens`. On overflow the chunk is closed and the next one
/// is seeded with the last `overlap_tokens`-worth of characters from it, so
/// context survives chunk boundaries. No sentence is ever dropped - a single
/// oversized sentence becomes its own chunk.
pub fn chunk_text(
    text: &str,
    target_tokens: usize,
    overlap_tokens: usize,
    estimator: &dyn TokenEstimator,
) -> Vec<Chunk> {
    let overlap_chars = overlap_tokens * CHARS_PER_TOKEN;
    let sentences = split_sentences(text);

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for sentence in sentences {
        let candidate = if current.is_empty() {
            sentence.to_string()
        } else {
            format!("{} {}", current, sentence)
        };

        if estimator.estimate(&candidate) <= target_tokens {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            chunks.push(current.trim().to_string());
        }

        current = match chunks.last() {
            Some(prev) => format!("{} {}", tail_chars(prev, overlap_chars), sentence),
            None => sentence.to_string(),
        };
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
        .into_iter()
        .filter(|c| !c.is_empty())
        .enumerate()
        .map(|(i, text)| Chunk::new(i, text))
        .collect()
}

/// Last `max_chars` characters of `text`, respecting char boundaries.
fn tail_chars(text: &str, max_chars: usize) -> &str {
    if text.len() <= max_chars {
        return text;
    }
    let mut start = text.len() - max_chars;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

/// Split text into sentences at `.`, `!`, or `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if matches!(bytes[i], b'.' | b'!' | b'?') {
            // Consume the punctuation run, then any whitespace
            let mut end = i + 1;
            while end < bytes.len() && matches!(bytes[end], b'.' | b'!' | b'?') {
                end += 1;
            }
            if end < bytes.len() && bytes[end].is_ascii_whitespace() {
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                while end < bytes.len() && bytes[end].is_ascii_whitespace() {
                    end += 1;
                }
                start = end;
                i = end;
                continue;
            }
            i = end;
        } else {
            i += 1;
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }

    sentences
}
