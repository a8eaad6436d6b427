//! Stage 3: rule-based plausibility checks over the extracted data.
//!
//! Purely mechanical; no model call. Findings are advisory and never mutate
//! the extracted values.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::pipeline::agents::ExtractedData;

const MAX_POPULATION: i64 = 1_000_000;
const MAX_HAZARD_RATIO: f64 = 10.0;
const MAX_PERCENT: f64 = 100.0;
const MAX_AGE: u32 = 120;

lazy_static! {
    // "HR 0.74" or "hazard ratio: 0.74"
    static ref HAZARD_RATIO_REGEX: Regex = Regex::new(
        r"(?i)(?:HR|hazard\s+ratio)[:\s]+([0-9.]+)"
    ).unwrap();

    // "p=0.016", "p < 0.001"
    static ref P_VALUE_REGEX: Regex = Regex::new(
        r"(?i)p\s*[=<>]\s*0\.(\d+)"
    ).unwrap();

    static ref PERCENT_REGEX: Regex = Regex::new(
        r"(\d+(\.\d+)?)\s*%"
    ).unwrap();

    // "aged 55", "age 67"
    static ref AGE_REGEX: Regex = Regex::new(
        r"(?i)(?:age|aged)\s+(\d+)"
    ).unwrap();
}

/// Run every plausibility rule and collect the findings.
pub fn validate(data: &ExtractedData) -> Vec<String> {
    let mut issues = Vec::new();

    check_population(data, &mut issues);

    let finding_texts = gather_finding_texts(data);
    for text in &finding_texts {
        check_hazard_ratios(text, &mut issues);
        check_p_values(text, &mut issues);
        check_percentages(text, &mut issues);
        check_ages(text, &mut issues);
    }

    debug!(issues = issues.len(), "fact check complete");
    issues
}

/// Every free-text finding the numeric rules scan.
fn gather_finding_texts(data: &ExtractedData) -> Vec<String> {
    let mut texts = Vec::new();
    if !data.results.main_finding.trim().is_empty() {
        texts.push(data.results.main_finding.clone());
    }
    texts.extend(data.results.key_results.iter().cloned());
    if let Some(events) = &data.results.adverse_events {
        texts.extend(events.iter().cloned());
    }
    texts
}

fn check_population(data: &ExtractedData, issues: &mut Vec<String>) {
    if let Some(n) = data.design.population_count() {
        if n <= 0 {
            issues.push(format!("Population size {n} is not a positive number"));
        } else if n > MAX_POPULATION {
            issues.push(format!(
                "Population size {n} exceeds plausible bound of {MAX_POPULATION}"
            ));
        }
    }
}

fn check_hazard_ratios(text: &str, issues: &mut Vec<String>) {
    for captures in HAZARD_RATIO_REGEX.captures_iter(text) {
        let Some(value) = captures.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) else {
            continue;
        };
        if value <= 0.0 || value > MAX_HAZARD_RATIO {
            issues.push(format!(
                "Hazard ratio {value} is outside the plausible range (0, {MAX_HAZARD_RATIO}]"
            ));
        }
    }
}

fn check_p_values(text: &str, issues: &mut Vec<String>) {
    for captures in P_VALUE_REGEX.captures_iter(text) {
        let Some(value) = captures
            .get(1)
            .and_then(|m| format!("0.{}", m.as_str()).parse::<f64>().ok())
        else {
            continue;
        };
        if !(0.0..=1.0).contains(&value) {
            issues.push(format!("P-value {value} is outside the range 0-1"));
        }
    }
}

fn check_percentages(text: &str, issues: &mut Vec<String>) {
    for captures in PERCENT_REGEX.captures_iter(text) {
        let Some(value) = captures.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) else {
            continue;
        };
        if value > MAX_PERCENT {
            issues.push(format!("Percentage {value}% exceeds 100%"));
        }
    }
}

fn check_ages(text: &str, issues: &mut Vec<String>) {
    for captures in AGE_REGEX.captures_iter(text) {
        let Some(value) = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        if value > MAX_AGE {
            issues.push(format!("Age {value} is outside the plausible range 0-{MAX_AGE}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::agents::{KeyResults, StudyDesign};

    fn data_with_finding(finding: &str) -> ExtractedData {
        ExtractedData {
            results: KeyResults {
                main_finding: finding.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_data_produces_no_issues() {
        let data = data_with_finding(
            "HR 0.74 (95% CI 0.58-0.95), p=0.016, in patients aged 55 with 12.4% event rate",
        );
        assert!(validate(&data).is_empty());
    }

    #[test]
    fn test_implausible_values_each_flagged() {
        let data = data_with_finding("HR 15.0 with p=0.5 and 130% reduction in patients aged 150");
        let issues = validate(&data);
        assert_eq!(issues.len(), 3);
        assert!(issues[0].contains("Hazard ratio 15"));
        assert!(issues[1].contains("130% exceeds"));
        assert!(issues[2].contains("Age 150"));
    }

    #[test]
    fn test_p_values_within_unit_interval_pass() {
        // The matcher only admits 0.x forms, all inside [0, 1]; the range
        // comparison stays as the guard should the matcher ever widen.
        for text in ["p=0.001", "p < 0.05", "P = 0.999", "p>0.5"] {
            let issues = validate(&data_with_finding(text));
            assert!(issues.is_empty(), "unexpected issue for {text}: {issues:?}");
        }
    }

    #[test]
    fn test_population_bounds() {
        let mut data = ExtractedData::default();
        data.design = serde_json::from_str::<StudyDesign>("{\"population_size\": 2000000}")
            .expect("valid json");
        let issues = validate(&data);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("exceeds plausible bound"));

        data.design =
            serde_json::from_str::<StudyDesign>("{\"population_size\": 0}").expect("valid json");
        let issues = validate(&data);
        assert!(issues[0].contains("not a positive number"));
    }

    #[test]
    fn test_hazard_ratio_spelled_out() {
        let data = data_with_finding("The hazard ratio: 12.5 was reported.");
        let issues = validate(&data);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_key_results_and_adverse_events_scanned() {
        let mut data = ExtractedData::default();
        data.results.key_results = vec!["Secondary endpoint HR 11.0".to_string()];
        data.results.adverse_events = Some(vec!["Nausea in 105% of patients".to_string()]);
        let issues = validate(&data);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_empty_data_is_clean() {
        assert!(validate(&ExtractedData::default()).is_empty());
    }
}
