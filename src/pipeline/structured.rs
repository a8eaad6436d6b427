//! Shape-aware structured extraction of outcomes, arms, safety and dosing.
//!
//! The prompts here are parameterized with the classifier's expected counts
//! and labels, so the model is told how many arms and outcomes to look for
//! instead of guessing. Responses stay loosely typed; [`crate::mapper`]
//! converts them into the strict trial model.

use futures::join;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::pipeline::agents::parse_or_default;
use crate::pipeline::prompts;
use crate::traits::{Completion, CompletionOptions, Retriever};
use crate::types::StudyClassification;
use indexmap::IndexMap;

/// Loosely-typed outcome as the model reports it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawOutcome {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub measure_type: String,
    #[serde(default)]
    pub estimate: Option<f64>,
    #[serde(default)]
    pub confidence_interval: Option<RawInterval>,
    #[serde(default)]
    pub p_value: Option<f64>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// Interval bounds as reported, before level defaulting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawInterval {
    #[serde(default)]
    pub lower: Option<f64>,
    #[serde(default)]
    pub upper: Option<f64>,
    #[serde(default)]
    pub level: Option<f64>,
}

/// Loosely-typed treatment arm.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawArm {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub n_allocated: Option<u32>,
    #[serde(default)]
    pub n_analyzed: Option<u32>,
    #[serde(default)]
    pub n_completed: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Per-arm incidence as reported.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawEventCount {
    #[serde(default)]
    pub percent: Option<f64>,
    #[serde(default)]
    pub count: Option<u32>,
}

/// Loosely-typed safety event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawSafetyEvent {
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub arm_data: IndexMap<String, RawEventCount>,
    #[serde(default)]
    pub serious: bool,
    #[serde(default)]
    pub led_to_discontinuation: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Loosely-typed dosing description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawDosing {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub dose: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub adjustments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OutcomesResponse {
    #[serde(default)]
    outcomes: Vec<RawOutcome>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ArmsResponse {
    #[serde(default)]
    arms: Vec<RawArm>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SafetyResponse {
    #[serde(default)]
    safety_events: Vec<RawSafetyEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DosingResponse {
    #[serde(default)]
    dosing: Option<RawDosing>,
}

/// Combined loosely-typed output of the structured extraction tasks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredExtraction {
    pub outcomes: Vec<RawOutcome>,
    pub arms: Vec<RawArm>,
    pub safety_events: Vec<RawSafetyEvent>,
    pub dosing: Option<RawDosing>,
}

/// Run the structured extraction tasks in parallel.
///
/// Each task degrades to an empty value on failure; the safety task is
/// skipped entirely when the classifier saw no safety analysis.
pub async fn extract_structured(
    completion: &dyn Completion,
    retriever: &dyn Retriever,
    classification: &StudyClassification,
    top_k: usize,
) -> StructuredExtraction {
    let outcomes_task = async {
        let context =
            gather_context(retriever, "outcomes", prompts::OUTCOMES_CONTEXT_QUERY, top_k).await;
        let prompt = prompts::format_outcomes_prompt(
            classification.num_primary_outcomes,
            &classification.primary_outcome_names,
            classification.num_secondary_outcomes,
            &classification.secondary_outcome_names,
            &context,
        );
        run_task::<OutcomesResponse>(completion, "outcomes", &prompt).await
    };

    let arms_task = async {
        let context = gather_context(retriever, "arms", prompts::ARMS_CONTEXT_QUERY, top_k).await;
        let prompt = prompts::format_arms_prompt(
            classification.num_arms,
            &classification.arm_labels,
            &context,
        );
        run_task::<ArmsResponse>(completion, "arms", &prompt).await
    };

    let safety_task = async {
        if !classification.has_safety_analysis {
            debug!("no safety analysis reported, skipping safety extraction");
            return SafetyResponse::default();
        }
        let context = gather_context(retriever, "safety", prompts::SAFETY_CONTEXT_QUERY, top_k).await;
        let prompt = prompts::format_safety_prompt(&context);
        run_task::<SafetyResponse>(completion, "safety", &prompt).await
    };

    let dosing_task = async {
        let context = gather_context(retriever, "dosing", prompts::DOSING_CONTEXT_QUERY, top_k).await;
        let prompt = prompts::format_dosing_prompt(&context);
        run_task::<DosingResponse>(completion, "dosing", &prompt).await
    };

    let (outcomes, arms, safety, dosing) =
        join!(outcomes_task, arms_task, safety_task, dosing_task);

    StructuredExtraction {
        outcomes: outcomes.outcomes,
        arms: arms.arms,
        safety_events: safety.safety_events,
        dosing: dosing.dosing,
    }
}

async fn gather_context(retriever: &dyn Retriever, task: &str, query: &str, top_k: usize) -> String {
    match retriever.context(query, top_k).await {
        Ok(context) => context,
        Err(error) => {
            warn!(task, %error, "context retrieval failed, extracting without it");
            String::new()
        }
    }
}

async fn run_task<T>(completion: &dyn Completion, task: &str, prompt: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    match completion
        .complete(
            prompts::STRUCTURED_SYSTEM_PROMPT,
            prompt,
            &CompletionOptions::json(),
        )
        .await
    {
        Ok(response) => parse_or_default(task, &response),
        Err(error) => {
            warn!(task, %error, "completion failed, using empty value");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCompletion, MockRetriever};

    fn two_arm_classification() -> StudyClassification {
        StudyClassification {
            study_type: "randomized_controlled_trial".to_string(),
            num_arms: 2,
            arm_labels: vec!["Drug A".to_string(), "Placebo".to_string()],
            num_primary_outcomes: 1,
            primary_outcome_names: vec!["MACE".to_string()],
            has_safety_analysis: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_extract_structured_all_tasks() {
        let completion = MockCompletion::new()
            .with_response(
                "Extract outcome data",
                r#"{"outcomes": [{"name": "MACE", "measure_type": "hazard_ratio", "estimate": 0.74, "is_primary": true}]}"#.to_string(),
            )
            .with_response(
                "Extract treatment arm",
                r#"{"arms": [{"label": "Drug A", "n_allocated": 100}, {"label": "Placebo", "n_allocated": 100}]}"#.to_string(),
            )
            .with_response(
                "adverse events and safety",
                r#"{"safety_events": [{"event_name": "Nausea", "event_type": "gastrointestinal", "arm_data": {"Drug A": {"percent": 12.0}}}]}"#.to_string(),
            )
            .with_response(
                "dosing/treatment regimen",
                r#"{"dosing": {"dose": "1.0 mg", "frequency": "weekly"}}"#.to_string(),
            );
        let retriever = MockRetriever::new().with_context("trial context");

        let extracted =
            extract_structured(&completion, &retriever, &two_arm_classification(), 6).await;
        assert_eq!(extracted.outcomes.len(), 1);
        assert!(extracted.outcomes[0].is_primary);
        assert_eq!(extracted.arms.len(), 2);
        assert_eq!(extracted.safety_events.len(), 1);
        assert_eq!(
            extracted.dosing.as_ref().and_then(|d| d.dose.as_deref()),
            Some("1.0 mg")
        );
    }

    #[tokio::test]
    async fn test_safety_skipped_without_safety_analysis() {
        let completion = MockCompletion::new()
            .with_response("Extract outcome data", r#"{"outcomes": []}"#.to_string())
            .with_response("Extract treatment arm", r#"{"arms": []}"#.to_string())
            .with_response("dosing/treatment regimen", r#"{"dosing": null}"#.to_string());
        let retriever = MockRetriever::new().with_context("ctx");

        let mut classification = two_arm_classification();
        classification.has_safety_analysis = false;

        let extracted = extract_structured(&completion, &retriever, &classification, 6).await;
        assert!(extracted.safety_events.is_empty());
        assert!(!completion
            .calls()
            .iter()
            .any(|call| call.contains("adverse events")));
    }

    #[tokio::test]
    async fn test_failed_task_degrades_to_empty() {
        let completion = MockCompletion::new()
            .with_failure("Extract outcome data")
            .with_response("Extract treatment arm", r#"{"arms": [{"label": "A"}]}"#.to_string())
            .with_response("adverse events and safety", r#"{"safety_events": []}"#.to_string())
            .with_response("dosing/treatment regimen", r#"{}"#.to_string());
        let retriever = MockRetriever::new().with_context("ctx");

        let extracted =
            extract_structured(&completion, &retriever, &two_arm_classification(), 6).await;
        assert!(extracted.outcomes.is_empty());
        assert_eq!(extracted.arms.len(), 1);
    }
}
