//! The flexible clinical-trial record.
//!
//! This is the core data model: it must represent trials of arbitrary shape -
//! 2..N arms, N outcomes per bucket, N safety events - so everything with
//! variable cardinality is an ordered sequence, never a fixed positional
//! field. Enum values that originate in free-form model output always carry
//! an `Unknown` fallback; an unrecognized string degrades, it never fails
//! deserialization.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistical kind of an outcome estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MeasureType {
    // Effect measures for comparative studies
    HazardRatio,
    OddsRatio,
    RelativeRisk,
    RiskDifference,

    // Mean comparisons
    MeanDifference,
    StandardizedMeanDifference,

    // Binary outcomes
    EventRate,
    ResponseRate,
    Percentage,

    // Continuous outcomes
    Continuous,
    ChangeFromBaseline,

    // Pharmacokinetic
    Auc,
    Cmax,
    Tmax,
    HalfLife,
    Clearance,

    // Survival
    SurvivalRate,
    MedianSurvival,

    #[default]
    #[serde(other)]
    Unknown,
}

impl MeasureType {
    /// Parse a free-form measure-type string, degrading to `Unknown`.
    pub fn parse(s: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(s.trim().to_lowercase()))
            .unwrap_or(Self::Unknown)
    }

    /// The serialized (snake_case) name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HazardRatio => "hazard_ratio",
            Self::OddsRatio => "odds_ratio",
            Self::RelativeRisk => "relative_risk",
            Self::RiskDifference => "risk_difference",
            Self::MeanDifference => "mean_difference",
            Self::StandardizedMeanDifference => "standardized_mean_difference",
            Self::EventRate => "event_rate",
            Self::ResponseRate => "response_rate",
            Self::Percentage => "percentage",
            Self::Continuous => "continuous",
            Self::ChangeFromBaseline => "change_from_baseline",
            Self::Auc => "auc",
            Self::Cmax => "cmax",
            Self::Tmax => "tmax",
            Self::HalfLife => "half_life",
            Self::Clearance => "clearance",
            Self::SurvivalRate => "survival_rate",
            Self::MedianSurvival => "median_survival",
            Self::Unknown => "unknown",
        }
    }
}

/// Trial design type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrialDesign {
    #[serde(rename = "randomized_controlled_trial")]
    Rct,
    Parallel,
    Crossover,
    Factorial,
    #[serde(rename = "cluster_randomized_trial")]
    ClusterRct,

    Observational,
    Cohort,
    CaseControl,
    CrossSectional,

    Pharmacokinetic,
    #[serde(rename = "phase_1")]
    Phase1,
    #[serde(rename = "phase_2")]
    Phase2,
    #[serde(rename = "phase_3")]
    Phase3,
    #[serde(rename = "phase_4")]
    Phase4,

    #[default]
    #[serde(other)]
    Unknown,
}

impl TrialDesign {
    /// Parse a free-form design string, degrading to `Unknown`.
    pub fn parse(s: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(s.trim().to_lowercase()))
            .unwrap_or(Self::Unknown)
    }
}

fn default_ci_level() -> f64 {
    0.95
}

/// A confidence interval around an outcome estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    /// Interval level: 0.95, 0.90, 0.99, ...
    #[serde(default = "default_ci_level")]
    pub level: f64,
}

impl Default for ConfidenceInterval {
    fn default() -> Self {
        Self {
            lower: None,
            upper: None,
            level: default_ci_level(),
        }
    }
}

impl fmt::Display for ConfidenceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.lower, self.upper) {
            (Some(lo), Some(hi)) => write!(f, "({lo:.2}-{hi:.2})"),
            _ => write!(f, "n/a"),
        }
    }
}

/// A single outcome measure, primary or otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub name: String,
    pub measure_type: MeasureType,
    #[serde(default)]
    pub estimate: Option<f64>,
    #[serde(default, rename = "ci")]
    pub confidence_interval: Option<ConfidenceInterval>,
    #[serde(default)]
    pub p_value: Option<f64>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.estimate {
            Some(e) => write!(f, "{}: {e}", self.name)?,
            None => write!(f, "{}: n/a", self.name)?,
        }
        if let Some(ci) = &self.confidence_interval {
            write!(f, " {ci}")?;
        }
        if let Some(p) = self.p_value {
            write!(f, " (p={p})")?;
        }
        Ok(())
    }
}

/// Allocation and description of one trial arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ArmAllocation {
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

/// Per-arm incidence for a safety event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventCount {
    #[serde(default)]
    pub percent: Option<f64>,
    #[serde(default)]
    pub count: Option<u32>,
}

/// An adverse event or other safety signal, with per-arm incidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SafetyEvent {
    #[serde(rename = "name")]
    pub event_name: String,
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub serious: bool,
    #[serde(default, rename = "discontinuation")]
    pub led_to_discontinuation: bool,
    /// Incidence keyed by arm label. Ordered so serialization is stable.
    #[serde(default, rename = "arm_data")]
    pub arm_events: IndexMap<String, EventCount>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Dosing / intervention details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Dosing {
    pub description: String,
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

/// Trial identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrialInfo {
    pub title: String,
    #[serde(default)]
    pub trial_name: Option<String>,
    /// Drug or other intervention under study.
    #[serde(default)]
    pub drug: String,
    /// Disease or condition being treated.
    #[serde(default)]
    pub indication: String,
    #[serde(default)]
    pub publication: Option<String>,
}

/// Design metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DesignInfo {
    #[serde(rename = "type")]
    pub design: TrialDesign,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub follow_up: Option<String>,
    /// Registry identifier, e.g. an NCT number.
    #[serde(default)]
    pub registry_number: Option<String>,
}

/// Enrollment, arms, and demographics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Population {
    #[serde(default)]
    pub total_enrolled: Option<u32>,
    #[serde(default)]
    pub arms: Vec<ArmAllocation>,
    #[serde(default)]
    pub mean_age: Option<f64>,
    #[serde(default)]
    pub age_range: Option<String>,
    #[serde(default)]
    pub gender_distribution: Option<String>,
    #[serde(default)]
    pub inclusion: Option<String>,
    #[serde(default)]
    pub exclusion: Option<String>,
}

/// Outcomes bucketed by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OutcomeBuckets {
    #[serde(default)]
    pub primary: Vec<Outcome>,
    #[serde(default)]
    pub secondary: Vec<Outcome>,
    #[serde(default)]
    pub exploratory: Vec<Outcome>,
}

/// Safety analysis results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Safety {
    #[serde(default)]
    pub events: Vec<SafetyEvent>,
}

/// The root trial record.
///
/// Owns all child records by value. Constructed by the schema mapper,
/// populated as extraction results arrive, and never mutated after the
/// fact-check pass - validation issues live in a sidecar list on the
/// [`crate::types::ExtractionReport`], not in here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClinicalTrial {
    pub trial_info: TrialInfo,
    pub design: DesignInfo,
    pub population: Population,
    pub outcomes: OutcomeBuckets,
    pub safety: Safety,
    #[serde(default)]
    pub treatment: Option<Dosing>,
    /// Study rationale, one NEJM-style positioning sentence.
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub research_question: Option<String>,
    #[serde(default)]
    pub conclusions: Vec<String>,
    /// Author-reported limitations from the discussion.
    #[serde(default)]
    pub limitations: Vec<String>,
}

impl ClinicalTrial {
    /// Number of treatment arms.
    pub fn num_arms(&self) -> usize {
        self.population.arms.len()
    }

    /// Number of primary outcomes.
    pub fn num_primary_outcomes(&self) -> usize {
        self.outcomes.primary.len()
    }

    /// Number of secondary outcomes.
    pub fn num_secondary_outcomes(&self) -> usize {
        self.outcomes.secondary.len()
    }

    /// Number of safety events.
    pub fn num_safety_events(&self) -> usize {
        self.safety.events.len()
    }

    /// All outcomes in order: primary, secondary, exploratory.
    pub fn all_outcomes(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes
            .primary
            .iter()
            .chain(self.outcomes.secondary.iter())
            .chain(self.outcomes.exploratory.iter())
    }
}

// Single-line summary used in logs.
impl fmt::Display for ClinicalTrial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {:?} | {} arms | {} primary outcomes",
            self.trial_info.title,
            self.design.design,
            self.num_arms(),
            self.num_primary_outcomes()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_type_parse_known_and_unknown() {
        assert_eq!(MeasureType::parse("hazard_ratio"), MeasureType::HazardRatio);
        assert_eq!(MeasureType::parse("AUC"), MeasureType::Auc);
        assert_eq!(MeasureType::parse("  cmax "), MeasureType::Cmax);
        assert_eq!(MeasureType::parse("frobnication_index"), MeasureType::Unknown);
        assert_eq!(MeasureType::parse(""), MeasureType::Unknown);
    }

    #[test]
    fn test_trial_design_parse() {
        assert_eq!(
            TrialDesign::parse("randomized_controlled_trial"),
            TrialDesign::Rct
        );
        assert_eq!(TrialDesign::parse("crossover"), TrialDesign::Crossover);
        assert_eq!(TrialDesign::parse("phase_3"), TrialDesign::Phase3);
        assert_eq!(TrialDesign::parse("quantum"), TrialDesign::Unknown);
    }

    #[test]
    fn test_unknown_enum_string_round_trips_to_unknown() {
        // A previous serialization may carry enum strings we no longer (or
        // never did) recognize - they must degrade, not fail.
        let json = r#"{"name":"x","measure_type":"made_up_measure","is_primary":true}"#;
        let outcome: Outcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome.measure_type, MeasureType::Unknown);

        let again: Outcome =
            serde_json::from_str(&serde_json::to_string(&outcome).unwrap()).unwrap();
        assert_eq!(again.measure_type, MeasureType::Unknown);
        assert!(again.is_primary);
    }

    #[test]
    fn test_confidence_interval_display() {
        let ci = ConfidenceInterval {
            lower: Some(0.58),
            upper: Some(0.95),
            level: 0.95,
        };
        assert_eq!(ci.to_string(), "(0.58-0.95)");
        assert_eq!(ConfidenceInterval::default().to_string(), "n/a");
    }

    #[test]
    fn test_trial_counts() {
        let mut trial = ClinicalTrial::default();
        trial.population.arms.push(ArmAllocation {
            label: "Drug".into(),
            ..Default::default()
        });
        trial.population.arms.push(ArmAllocation {
            label: "Placebo".into(),
            ..Default::default()
        });
        trial.outcomes.primary.push(Outcome {
            name: "MACE".into(),
            measure_type: MeasureType::HazardRatio,
            estimate: Some(0.74),
            confidence_interval: None,
            p_value: None,
            units: None,
            definition: None,
            is_primary: true,
        });

        assert_eq!(trial.num_arms(), 2);
        assert_eq!(trial.num_primary_outcomes(), 1);
        assert_eq!(trial.num_secondary_outcomes(), 0);
        assert_eq!(trial.all_outcomes().count(), 1);
    }

    #[test]
    fn test_trial_serde_round_trip() {
        let mut trial = ClinicalTrial {
            trial_info: TrialInfo {
                title: "SELECT".into(),
                trial_name: Some("SELECT".into()),
                drug: "Semaglutide".into(),
                indication: "Cardiovascular disease".into(),
                publication: None,
            },
            ..Default::default()
        };
        trial.design.design = TrialDesign::Rct;
        trial.population.total_enrolled = Some(17604);
        trial.population.arms.push(ArmAllocation {
            label: "Semaglutide".into(),
            n_allocated: Some(8803),
            ..Default::default()
        });
        let mut event = SafetyEvent {
            event_name: "Nausea".into(),
            ..Default::default()
        };
        event.arm_events.insert(
            "Semaglutide".into(),
            EventCount {
                percent: Some(15.2),
                count: Some(1338),
            },
        );
        trial.safety.events.push(event);

        let json = serde_json::to_string(&trial).unwrap();
        let back: ClinicalTrial = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trial);
    }
}
