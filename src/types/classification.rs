//! Study classification - the shape of a trial, inferred before extraction.
//!
//! Classification answers "what kind of study is this, and what should the
//! extraction agents be looking for?". It is advisory, not load-bearing: an
//! inconsistent classification is logged and used anyway, because downstream
//! extraction is still useful even when the counts are imprecise.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::trial::TrialDesign;

/// Classifier self-reported confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Inferred trial shape: design, arm count and labels, outcome counts and
/// names, and a few feature flags the extraction agents key off.
///
/// The count/label invariants (`arm_labels.len() == num_arms`, etc.) are
/// checked by [`validate`](Self::validate), not enforced - the classifier is
/// free-form model output and may be internally inconsistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StudyClassification {
    #[serde(default)]
    pub study_type: String,
    #[serde(default)]
    pub design: String,
    #[serde(default)]
    pub num_arms: usize,
    #[serde(default)]
    pub arm_labels: Vec<String>,
    #[serde(default)]
    pub num_primary_outcomes: usize,
    #[serde(default)]
    pub primary_outcome_names: Vec<String>,
    #[serde(default)]
    pub num_secondary_outcomes: usize,
    #[serde(default)]
    pub secondary_outcome_names: Vec<String>,
    #[serde(default)]
    pub has_safety_analysis: bool,
    #[serde(default)]
    pub has_pharmacokinetic_data: bool,
    #[serde(default)]
    pub follow_up_duration: Option<String>,
    #[serde(default)]
    pub special_design_features: Option<String>,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub notes: Option<String>,
}

impl StudyClassification {
    /// Check internal consistency of the classification.
    ///
    /// Returns false on any mismatch, never panics. Callers log and proceed
    /// with the unvalidated classification rather than aborting.
    pub fn validate(&self) -> bool {
        if self.num_arms < 1 {
            warn!("classification has < 1 arm");
            return false;
        }

        if self.arm_labels.len() != self.num_arms {
            warn!(
                num_arms = self.num_arms,
                labels = self.arm_labels.len(),
                "arm count doesn't match arm_labels length"
            );
            return false;
        }

        if self.num_primary_outcomes < 1 {
            warn!("classification has < 1 primary outcome");
            return false;
        }

        if self.primary_outcome_names.len() != self.num_primary_outcomes {
            warn!(
                count = self.num_primary_outcomes,
                names = self.primary_outcome_names.len(),
                "primary outcome count doesn't match names length"
            );
            return false;
        }

        // Secondary outcomes are optional, but counts must agree when present
        if self.num_secondary_outcomes > 0
            && self.secondary_outcome_names.len() != self.num_secondary_outcomes
        {
            warn!(
                count = self.num_secondary_outcomes,
                names = self.secondary_outcome_names.len(),
                "secondary outcome count doesn't match names length"
            );
            return false;
        }

        true
    }

    /// The design string as a typed [`TrialDesign`], degrading to `Unknown`.
    pub fn design_type(&self) -> TrialDesign {
        TrialDesign::parse(&self.design)
    }

    /// Human-readable digest, for logs and debugging.
    pub fn summarize(&self) -> String {
        format!(
            "Study Type: {}\nDesign: {}\nArms: {} ({})\nPrimary Outcomes: {} ({})\n\
             Secondary Outcomes: {}\nFollow-up: {}\nSafety Analysis: {}\n\
             Pharmacokinetic Data: {}\nConfidence: {:?}",
            self.study_type,
            self.design,
            self.num_arms,
            self.arm_labels.join(", "),
            self.num_primary_outcomes,
            self.primary_outcome_names.join(", "),
            self.num_secondary_outcomes,
            self.follow_up_duration.as_deref().unwrap_or("not specified"),
            self.has_safety_analysis,
            self.has_pharmacokinetic_data,
            self.confidence,
        )
    }
}
