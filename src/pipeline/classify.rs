//! Study shape classification.
//!
//! Runs before the extraction stages so the structured extraction prompts
//! can be parameterized with the expected arm and outcome counts.

use tracing::{debug, warn};

use crate::error::Result;
use crate::pipeline::prompts;
use crate::segment::ParsedDocument;
use crate::traits::{find_json_object, Completion, CompletionOptions, Retriever};
use crate::types::StudyClassification;

/// Fallback window over the document head when retrieval returns nothing.
const CLASSIFY_LEAD_CHARS: usize = 8000;

/// Classify the study's type and structure.
///
/// Context is gathered from the retrieval index; when the index yields
/// nothing the head of the document is used instead. A classification that
/// fails internal consistency checks is logged and returned as-is, since a
/// partially wrong shape still beats no guidance at all.
pub async fn classify_study(
    completion: &dyn Completion,
    retriever: &dyn Retriever,
    document: &ParsedDocument,
    top_k: usize,
) -> Result<StudyClassification> {
    let mut context = retriever
        .context(prompts::CLASSIFY_CONTEXT_QUERY, top_k)
        .await?;
    if context.trim().is_empty() {
        context = document.lead_text(CLASSIFY_LEAD_CHARS).to_string();
    }

    let prompt = prompts::format_classify_prompt(&context);
    let response = completion
        .complete(
            prompts::CLASSIFY_SYSTEM_PROMPT,
            &prompt,
            &CompletionOptions::json(),
        )
        .await?;

    let json = find_json_object(&response)?;
    let classification: StudyClassification = serde_json::from_str(json)?;

    if classification.validate() {
        debug!(summary = %classification.summarize(), "study classified");
    } else {
        warn!(
            summary = %classification.summarize(),
            "classification failed consistency checks, proceeding with it anyway"
        );
    }

    Ok(classification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCompletion, MockRetriever};
    use crate::types::Confidence;

    fn classification_json() -> &'static str {
        r#"{
            "study_type": "randomized_controlled_trial",
            "design": "parallel",
            "num_arms": 2,
            "arm_labels": ["Drug A", "Placebo"],
            "num_primary_outcomes": 1,
            "primary_outcome_names": ["HbA1c change"],
            "num_secondary_outcomes": 0,
            "secondary_outcome_names": [],
            "has_safety_analysis": true,
            "has_pharmacokinetic_data": false,
            "follow_up_duration": "52 weeks",
            "special_design_features": "double-blind",
            "confidence": "high",
            "notes": ""
        }"#
    }

    #[tokio::test]
    async fn test_classify_parses_model_json() {
        let completion = MockCompletion::new().with_response(
            "STUDY TEXT",
            format!("Here you go:\n{}", classification_json()),
        );
        let retriever = MockRetriever::new().with_context("The trial randomized 200 patients.");
        let document = ParsedDocument::from_text("Methods\nA randomized trial.");

        let classification = classify_study(&completion, &retriever, &document, 8)
            .await
            .unwrap();
        assert_eq!(classification.num_arms, 2);
        assert_eq!(classification.confidence, Confidence::High);
        assert_eq!(classification.primary_outcome_names, vec!["HbA1c change"]);
    }

    #[tokio::test]
    async fn test_classify_falls_back_to_document_head() {
        let completion =
            MockCompletion::new().with_response("STUDY TEXT", classification_json().to_string());
        let retriever = MockRetriever::new();
        let document = ParsedDocument::from_text("Introduction\nA two-arm trial of Drug A.");

        classify_study(&completion, &retriever, &document, 8)
            .await
            .unwrap();

        let prompt = completion.last_user_prompt().unwrap();
        assert!(prompt.contains("two-arm trial of Drug A"));
    }

    #[tokio::test]
    async fn test_classify_propagates_missing_json() {
        let completion = MockCompletion::new().with_response("STUDY TEXT", "no json here".to_string());
        let retriever = MockRetriever::new().with_context("ctx");
        let document = ParsedDocument::from_text("text");

        let result = classify_study(&completion, &retriever, &document, 8).await;
        assert!(result.is_err());
    }
}
