//! The three-stage extraction orchestrator.
//!
//! Stage 1 builds the paper overview, stage 2 fans five specialized tasks
//! out against section text, stage 3 runs the rule-based fact check. Stages
//! are hard barriers: stage N+1 never starts before every stage N task has
//! settled. Within a stage, a failed task degrades to an empty value and the
//! rest proceed.

use chrono::Utc;
use futures::join;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::mapper;
use crate::pipeline::agents::{
    parse_or_default, pick_text, Background, ExtractedData, KeyResults, Limitations,
    PaperMetadata, StudyDesign,
};
use crate::pipeline::classify::classify_study;
use crate::pipeline::fact_check;
use crate::pipeline::overview::build_overview;
use crate::pipeline::prompts;
use crate::pipeline::structured::extract_structured;
use crate::segment::{CharEstimator, ParsedDocument};
use crate::traits::{Completion, CompletionOptions, Retriever};
use crate::types::{ClinicalTrial, ExtractionReport, PipelineConfig, StudyClassification};

const STAGE2_SYSTEM_PROMPT: &str =
    "You are a medical data extraction assistant. Respond with JSON only.";

/// The full pipeline over a parsed document.
pub struct TrialExtractor<C, R> {
    completion: C,
    retriever: R,
    config: PipelineConfig,
}

impl<C, R> TrialExtractor<C, R>
where
    C: Completion,
    R: Retriever,
{
    /// Create an extractor over the given model client and retrieval index.
    pub fn new(completion: C, retriever: R) -> Self {
        Self::with_config(completion, retriever, PipelineConfig::default())
    }

    pub fn with_config(completion: C, retriever: R, config: PipelineConfig) -> Self {
        Self {
            completion,
            retriever,
            config,
        }
    }

    /// Run the full pipeline: index, classify, overview, specialized
    /// extraction, structured extraction, mapping, fact check.
    pub async fn run(&self, text: &str) -> Result<ExtractionReport> {
        let document = ParsedDocument::from_text_with(
            text,
            self.config.chunk_tokens,
            self.config.overlap_tokens,
            &CharEstimator,
        );
        if document.is_empty() {
            warn!("document has no chunkable text, returning empty report");
            return Ok(ExtractionReport {
                run_id: Uuid::now_v7(),
                trial: ClinicalTrial::default(),
                paper_overview: String::new(),
                validation_issues: vec![
                    "Document contained no extractable text".to_string(),
                ],
                extracted_at: Utc::now(),
            });
        }
        info!(
            chunks = document.chunks.len(),
            sections = document.sections.len(),
            "document segmented"
        );

        self.retriever.clear().await?;
        self.retriever.index(&document.chunks).await?;

        let classification = match classify_study(
            &self.completion,
            &self.retriever,
            &document,
            self.config.retrieval_top_k,
        )
        .await
        {
            Ok(classification) => classification,
            Err(error) => {
                warn!(%error, "classification failed, proceeding unguided");
                StudyClassification::default()
            }
        };

        // Stage 1: paper overview.
        let overview =
            build_overview(&self.completion, &document, self.config.max_sampled_chunks).await;

        // Stage 2: specialized extraction, five tasks in parallel.
        let data = self
            .run_specialized_tasks(&document, &overview)
            .await;

        // Shape-aware structured extraction over the retrieval index.
        let structured = extract_structured(
            &self.completion,
            &self.retriever,
            &classification,
            self.config.retrieval_top_k,
        )
        .await;

        let trial = mapper::create_clinical_trial(&classification, &data, &structured);

        // Stage 3: fact check. Advisory only, the trial is never rewritten.
        let validation_issues = fact_check::validate(&data);
        if !validation_issues.is_empty() {
            warn!(issues = validation_issues.len(), "fact check found issues");
        }

        info!(%trial, "extraction complete");
        Ok(ExtractionReport {
            run_id: Uuid::now_v7(),
            trial,
            paper_overview: overview,
            validation_issues,
            extracted_at: Utc::now(),
        })
    }

    /// Stage 2: the five specialized tasks over section text.
    ///
    /// Each task reads its own section, falling back to the overview when
    /// the section is missing or too short.
    async fn run_specialized_tasks(
        &self,
        document: &ParsedDocument,
        overview: &str,
    ) -> ExtractedData {
        let section_floor = self.config.min_section_chars;
        let abstract_text = pick_text(document, "abstract", overview, self.config.min_abstract_chars);
        let intro_text = pick_text(document, "introduction", overview, section_floor);
        let methods_text = pick_text(document, "methods", overview, section_floor);
        let results_text = pick_text(document, "results", overview, section_floor);
        let discussion_text = pick_text(document, "discussion", overview, section_floor);

        let metadata = self.run_task::<PaperMetadata>(
            "metadata",
            prompts::format_metadata_prompt(&abstract_text, overview),
        );
        let background = self.run_task::<Background>(
            "background",
            prompts::format_background_prompt(&intro_text, overview),
        );
        let design = self.run_task::<StudyDesign>(
            "design",
            prompts::format_design_prompt(&methods_text, overview),
        );
        let results = self.run_task::<KeyResults>(
            "results",
            prompts::format_results_prompt(&results_text, overview),
        );
        let limitations = self.run_task::<Limitations>(
            "limitations",
            prompts::format_limitations_prompt(&discussion_text, overview),
        );

        let (metadata, background, design, results, limitations) =
            join!(metadata, background, design, results, limitations);

        ExtractedData {
            metadata,
            background,
            design,
            results,
            limitations,
        }
    }

    /// Run one stage 2 task, degrading to `T::default()` on any failure.
    async fn run_task<T>(&self, task: &str, prompt: String) -> T
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match self
            .completion
            .complete(STAGE2_SYSTEM_PROMPT, &prompt, &CompletionOptions::json())
            .await
        {
            Ok(response) => parse_or_default(task, &response),
            Err(error) => {
                warn!(task, %error, "task completion failed, using empty value");
                T::default()
            }
        }
    }
}
