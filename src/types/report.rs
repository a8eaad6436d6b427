//! The final extraction artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::trial::ClinicalTrial;

/// Everything a document run produces: the typed trial record, the combined
/// paper overview from stage 1, and the fact-checker's sidecar issue list.
///
/// This is the one JSON tree the pipeline promises to produce
/// deterministically in shape (not in content). The trial fields serialize
/// inline, with `paper_overview` and `validation_issues` as siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Identifier for this pipeline run, time-ordered.
    pub run_id: Uuid,

    #[serde(flatten)]
    pub trial: ClinicalTrial,

    /// Combined overview produced by the summarize/combine stage.
    #[serde(default)]
    pub paper_overview: String,

    /// Fact-check findings. Never fatal; empty when all figures are in range.
    #[serde(default)]
    pub validation_issues: Vec<String>,

    /// When the run finished.
    pub extracted_at: DateTime<Utc>,
}

impl Default for ExtractionReport {
    fn default() -> Self {
        Self {
            run_id: Uuid::now_v7(),
            trial: ClinicalTrial::default(),
            paper_overview: String::new(),
            validation_issues: Vec::new(),
            extracted_at: Utc::now(),
        }
    }
}

impl ExtractionReport {
    /// True when the fact checker found nothing to flag.
    pub fn is_clean(&self) -> bool {
        self.validation_issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_siblings_at_top_level() {
        let report = ExtractionReport {
            paper_overview: "A two-arm trial.".into(),
            validation_issues: vec!["Population size must be > 0".into()],
            ..Default::default()
        };

        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("trial_info").is_some());
        assert_eq!(value["paper_overview"], "A two-arm trial.");
        assert_eq!(value["validation_issues"].as_array().unwrap().len(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_report_round_trip() {
        let report = ExtractionReport {
            paper_overview: "overview".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: ExtractionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
