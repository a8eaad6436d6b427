//! Mapping from loosely-typed extraction output to the strict trial model.
//!
//! Free-form model strings become typed enums here, with unrecognized values
//! landing on the `Unknown` variants rather than failing. Mapping is pure and
//! deterministic: the same input always produces the same [`ClinicalTrial`].

use tracing::warn;

use crate::pipeline::agents::ExtractedData;
use crate::pipeline::structured::{
    RawArm, RawDosing, RawOutcome, RawSafetyEvent, StructuredExtraction,
};
use crate::types::{
    ArmAllocation, ClinicalTrial, ConfidenceInterval, Dosing, EventCount, MeasureType, Outcome,
    SafetyEvent, StudyClassification, TrialDesign,
};

/// Map one loose outcome into the typed model.
pub fn map_outcome(raw: &RawOutcome) -> Outcome {
    let measure_type = MeasureType::parse(&raw.measure_type);
    if measure_type == MeasureType::Unknown && !raw.measure_type.trim().is_empty() {
        warn!(
            outcome = %raw.name,
            reported = %raw.measure_type,
            "unrecognized measure type, mapping to unknown"
        );
    }

    let confidence_interval = raw.confidence_interval.as_ref().and_then(|ci| {
        match (ci.lower, ci.upper) {
            (Some(lower), Some(upper)) => Some(ConfidenceInterval {
                lower: Some(lower),
                upper: Some(upper),
                level: ci.level.unwrap_or(0.95),
            }),
            _ => None,
        }
    });

    Outcome {
        name: raw.name.clone(),
        measure_type,
        estimate: raw.estimate,
        confidence_interval,
        p_value: raw.p_value,
        units: raw.units.clone(),
        definition: raw.definition.clone(),
        is_primary: raw.is_primary,
    }
}

/// Map one loose arm allocation.
pub fn map_arm(raw: &RawArm) -> ArmAllocation {
    ArmAllocation {
        label: raw.label.clone(),
        n_allocated: raw.n_allocated,
        n_analyzed: raw.n_analyzed,
        n_completed: raw.n_completed,
        description: raw.description.clone(),
    }
}

/// Map one loose safety event.
pub fn map_safety_event(raw: &RawSafetyEvent) -> SafetyEvent {
    let arm_events = raw
        .arm_data
        .iter()
        .map(|(arm, counts)| {
            (
                arm.clone(),
                EventCount {
                    percent: counts.percent,
                    count: counts.count,
                },
            )
        })
        .collect();

    SafetyEvent {
        event_name: raw.event_name.clone(),
        event_type: none_if_empty(&raw.event_type),
        serious: raw.serious,
        led_to_discontinuation: raw.led_to_discontinuation,
        arm_events,
        notes: raw.notes.clone(),
    }
}

/// Map a loose dosing description.
pub fn map_dosing(raw: &RawDosing) -> Dosing {
    Dosing {
        description: raw.description.clone().unwrap_or_default(),
        dose: raw.dose.clone(),
        frequency: raw.frequency.clone(),
        duration: raw.duration.clone(),
        route: raw.route.clone(),
        adjustments: raw.adjustments.clone(),
    }
}

/// Assemble the full [`ClinicalTrial`] from the pipeline's outputs.
///
/// Outcomes are bucketed by their `is_primary` flag: primaries go to the
/// primary bucket, everything else to secondary. The exploratory bucket is
/// only filled when an outcome's name marks it as such.
pub fn create_clinical_trial(
    classification: &StudyClassification,
    data: &ExtractedData,
    structured: &StructuredExtraction,
) -> ClinicalTrial {
    let mut trial = ClinicalTrial::default();

    trial.trial_info.title = data.metadata.title.clone().unwrap_or_default();
    trial.trial_info.trial_name = data.metadata.trial_name.clone();
    trial.trial_info.drug = data.design.intervention.clone().unwrap_or_default();
    trial.trial_info.indication = data.design.condition.clone().unwrap_or_default();
    trial.trial_info.publication = publication_line(data);

    trial.design.design = map_design(classification);
    trial.design.duration = classification.follow_up_duration.clone();
    trial.design.follow_up = classification.follow_up_duration.clone();
    trial.design.registry_number = data.metadata.registry_number.clone();

    trial.population.total_enrolled = data
        .design
        .population_count()
        .and_then(|n| u32::try_from(n).ok());
    trial.population.arms = structured.arms.iter().map(map_arm).collect();
    trial.population.mean_age = data.design.mean_age;
    trial.population.age_range = data.design.age_range.clone();
    trial.population.gender_distribution = data.design.gender_distribution.clone();
    trial.population.inclusion = data.design.inclusion_criteria.clone();
    trial.population.exclusion = data.design.exclusion_criteria.clone();

    for raw in &structured.outcomes {
        let outcome = map_outcome(raw);
        if outcome.is_primary {
            trial.outcomes.primary.push(outcome);
        } else if outcome.name.to_lowercase().contains("exploratory") {
            trial.outcomes.exploratory.push(outcome);
        } else {
            trial.outcomes.secondary.push(outcome);
        }
    }

    trial.safety.events = structured.safety_events.iter().map(map_safety_event).collect();
    trial.treatment = structured.dosing.as_ref().map(map_dosing);

    trial.background = none_if_empty(&data.background.background);
    trial.research_question = none_if_empty(&data.background.research_question);
    if !data.results.main_finding.trim().is_empty() {
        trial.conclusions.push(data.results.main_finding.clone());
    }
    trial.limitations = data.limitations.limitations.clone();

    trial
}

/// Map the classifier's design strings to the typed design enum.
///
/// The design field carries the specific layout (parallel, crossover) while
/// study_type carries the broad category; the specific layout wins when it
/// parses.
pub fn map_design(classification: &StudyClassification) -> TrialDesign {
    let design = TrialDesign::parse(&classification.design);
    if design != TrialDesign::Unknown {
        return design;
    }
    let from_type = TrialDesign::parse(&classification.study_type);
    if from_type == TrialDesign::Unknown {
        warn!(
            design = %classification.design,
            study_type = %classification.study_type,
            "unrecognized trial design, mapping to unknown"
        );
    }
    from_type
}

fn publication_line(data: &ExtractedData) -> Option<String> {
    match (&data.metadata.journal, data.metadata.year) {
        (Some(journal), Some(year)) => Some(format!("{journal}, {year}")),
        (Some(journal), None) => Some(journal.clone()),
        (None, Some(year)) => Some(year.to_string()),
        (None, None) => None,
    }
}

fn none_if_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::structured::RawInterval;

    fn raw_outcome(name: &str, measure: &str, is_primary: bool) -> RawOutcome {
        RawOutcome {
            name: name.to_string(),
            measure_type: measure.to_string(),
            estimate: Some(0.74),
            confidence_interval: Some(RawInterval {
                lower: Some(0.58),
                upper: Some(0.95),
                level: None,
            }),
            p_value: Some(0.016),
            is_primary,
            ..Default::default()
        }
    }

    #[test]
    fn test_map_outcome_known_measure() {
        let outcome = map_outcome(&raw_outcome("MACE", "hazard_ratio", true));
        assert_eq!(outcome.measure_type, MeasureType::HazardRatio);
        let ci = outcome.confidence_interval.unwrap();
        assert_eq!(ci.level, 0.95);
        assert_eq!(ci.lower, Some(0.58));
    }

    #[test]
    fn test_map_outcome_unknown_measure() {
        let outcome = map_outcome(&raw_outcome("MACE", "made_up_measure", false));
        assert_eq!(outcome.measure_type, MeasureType::Unknown);
        assert_eq!(outcome.estimate, Some(0.74));
    }

    #[test]
    fn test_partial_interval_is_dropped() {
        let mut raw = raw_outcome("MACE", "hazard_ratio", true);
        raw.confidence_interval = Some(RawInterval {
            lower: Some(0.58),
            upper: None,
            level: None,
        });
        assert!(map_outcome(&raw).confidence_interval.is_none());
    }

    #[test]
    fn test_create_clinical_trial_buckets_outcomes() {
        let classification = StudyClassification {
            design: "parallel".to_string(),
            study_type: "randomized_controlled_trial".to_string(),
            follow_up_duration: Some("52 weeks".to_string()),
            ..Default::default()
        };
        let structured = StructuredExtraction {
            outcomes: vec![
                raw_outcome("MACE", "hazard_ratio", true),
                raw_outcome("HbA1c change", "mean_difference", false),
                raw_outcome("Exploratory biomarker panel", "continuous", false),
            ],
            arms: vec![RawArm {
                label: "Placebo".to_string(),
                n_allocated: Some(100),
                ..Default::default()
            }],
            ..Default::default()
        };

        let trial = create_clinical_trial(&classification, &ExtractedData::default(), &structured);
        assert_eq!(trial.num_primary_outcomes(), 1);
        assert_eq!(trial.num_secondary_outcomes(), 1);
        assert_eq!(trial.outcomes.exploratory.len(), 1);
        assert_eq!(trial.num_arms(), 1);
        assert_eq!(trial.design.design, TrialDesign::Parallel);
        assert_eq!(trial.design.follow_up.as_deref(), Some("52 weeks"));
    }

    #[test]
    fn test_background_and_limitations_land_in_trial() {
        let data = ExtractedData {
            background: crate::pipeline::agents::Background {
                background: "A randomized trial of X versus placebo.".to_string(),
                research_question: "Does X reduce events?".to_string(),
            },
            limitations: crate::pipeline::agents::Limitations {
                limitations: vec![
                    "Short follow-up".to_string(),
                    "Single-center enrollment".to_string(),
                ],
            },
            ..Default::default()
        };

        let trial = create_clinical_trial(
            &StudyClassification::default(),
            &data,
            &StructuredExtraction::default(),
        );
        assert_eq!(
            trial.background.as_deref(),
            Some("A randomized trial of X versus placebo.")
        );
        assert_eq!(trial.research_question.as_deref(), Some("Does X reduce events?"));
        assert_eq!(trial.limitations.len(), 2);
        assert_eq!(trial.limitations[0], "Short follow-up");
    }

    #[test]
    fn test_identifiers_and_population_details_mapped() {
        let data = ExtractedData {
            metadata: crate::pipeline::agents::PaperMetadata {
                title: Some("Semaglutide and Cardiovascular Outcomes".to_string()),
                trial_name: Some("SELECT".to_string()),
                registry_number: Some("NCT03574597".to_string()),
                ..Default::default()
            },
            design: crate::pipeline::agents::StudyDesign {
                intervention: Some("Semaglutide".to_string()),
                condition: Some("Obesity with cardiovascular disease".to_string()),
                inclusion_criteria: Some("Adults 45 or older with BMI >= 27".to_string()),
                exclusion_criteria: Some("Prior diabetes diagnosis".to_string()),
                mean_age: Some(61.6),
                age_range: Some("45 years or older".to_string()),
                gender_distribution: Some("72% male".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let trial = create_clinical_trial(
            &StudyClassification::default(),
            &data,
            &StructuredExtraction::default(),
        );
        assert_eq!(trial.trial_info.trial_name.as_deref(), Some("SELECT"));
        assert_eq!(
            trial.trial_info.indication,
            "Obesity with cardiovascular disease"
        );
        assert_eq!(trial.design.registry_number.as_deref(), Some("NCT03574597"));
        assert_eq!(trial.population.mean_age, Some(61.6));
        assert_eq!(trial.population.gender_distribution.as_deref(), Some("72% male"));
        assert_eq!(
            trial.population.inclusion.as_deref(),
            Some("Adults 45 or older with BMI >= 27")
        );
        assert_eq!(
            trial.population.exclusion.as_deref(),
            Some("Prior diabetes diagnosis")
        );
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let structured = StructuredExtraction {
            outcomes: vec![raw_outcome("MACE", "hazard_ratio", true)],
            ..Default::default()
        };
        let classification = StudyClassification::default();
        let data = ExtractedData::default();

        let first = create_clinical_trial(&classification, &data, &structured);
        let second = create_clinical_trial(&classification, &data, &structured);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_design_falls_back_to_study_type() {
        let classification = StudyClassification {
            design: "not_applicable".to_string(),
            study_type: "cohort".to_string(),
            ..Default::default()
        };
        assert_eq!(map_design(&classification), TrialDesign::Cohort);
    }
}
