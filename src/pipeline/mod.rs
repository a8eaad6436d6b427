//! The extraction pipeline: classification, staged extraction, fact check.

pub mod agents;
pub mod classify;
pub mod fact_check;
pub mod orchestrator;
pub mod overview;
pub mod prompts;
pub mod structured;

pub use agents::ExtractedData;
pub use orchestrator::TrialExtractor;
pub use overview::ChunkSummary;
pub use structured::StructuredExtraction;
