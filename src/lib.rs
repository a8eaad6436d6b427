//! Clinical-Trial Extraction Library
//!
//! A classification-guided pipeline that turns raw clinical trial paper text
//! into a structured trial record with a validation sidecar.
//!
//! # Design Philosophy
//!
//! **"Classify first, extract guided"**
//!
//! - The study's shape (arms, outcome counts) is classified up front and fed
//!   into the extraction prompts, so the model is told what to look for
//! - Loose model output is accepted and typed after the fact; unrecognized
//!   enum values degrade to `Unknown`, they never fail the run
//! - Stages are hard barriers; tasks within a stage fail independently
//! - Validation findings are advisory and never rewrite extracted data
//!
//! # Usage
//!
//! ```rust,ignore
//! use trial_extraction::{MemoryIndex, TrialExtractor};
//! use trial_extraction::ai::OpenAI;
//!
//! let completion = OpenAI::from_env()?;
//! let extractor = TrialExtractor::new(completion, MemoryIndex::new());
//!
//! let report = extractor.run(&paper_text).await?;
//! println!("{} arms, {} issues", report.trial.num_arms(), report.validation_issues.len());
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (Completion, Retriever)
//! - [`types`] - The trial data model, classification, and report types
//! - [`segment`] - Chunking and section detection
//! - [`pipeline`] - Classification, staged extraction, and fact checking
//! - [`mapper`] - Loose extraction output to the typed trial record
//! - [`retrieval`] - In-process retrieval index
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod error;
pub mod mapper;
pub mod pipeline;
pub mod retrieval;
pub mod security;
pub mod segment;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ExtractionError, Result};
pub use traits::{find_json_object, Completion, CompletionOptions, Retriever, ScoredChunk};
pub use types::{
    ClinicalTrial, Confidence, ExtractionReport, MeasureType, Outcome, PipelineConfig,
    StudyClassification, TrialDesign,
};

// Re-export the segmenter outputs
pub use segment::{Chunk, ParsedDocument, SectionMap};

// Re-export pipeline components
pub use pipeline::{ExtractedData, TrialExtractor};

// Re-export the in-process index
pub use retrieval::MemoryIndex;

// Re-export testing utilities
pub use testing::{MockCompletion, MockRetriever};
