//! Response types and parsing for the stage 2 specialized extraction tasks.
//!
//! Each task gets a raw response struct whose fields are all defaulted, so a
//! model that omits or mangles a field degrades to an empty value instead of
//! failing the whole stage.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::segment::ParsedDocument;
use crate::traits::find_json_object;

/// Minimum section length before falling back to the paper overview.
pub const MIN_SECTION_CHARS: usize = 80;

/// The abstract is naturally short, so it gets a lower floor.
pub const MIN_ABSTRACT_CHARS: usize = 50;

/// Lead text used when both the section and the overview are empty.
const LEAD_FALLBACK_CHARS: usize = 4000;

/// Paper metadata extracted from the abstract and overview.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaperMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub study_type: Option<String>,
    #[serde(default)]
    pub trial_name: Option<String>,
    #[serde(default)]
    pub registry_number: Option<String>,
}

/// Background and research question from the introduction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Background {
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub research_question: String,
}

/// Study design details from the methods section, including the population
/// eligibility and demographic fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StudyDesign {
    #[serde(default)]
    pub population_size: Option<serde_json::Value>,
    #[serde(default)]
    pub intervention: Option<String>,
    #[serde(default)]
    pub comparator: Option<String>,
    #[serde(default)]
    pub primary_outcomes: Vec<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub inclusion_criteria: Option<String>,
    #[serde(default)]
    pub exclusion_criteria: Option<String>,
    #[serde(default)]
    pub mean_age: Option<f64>,
    #[serde(default)]
    pub age_range: Option<String>,
    #[serde(default)]
    pub gender_distribution: Option<String>,
}

impl StudyDesign {
    /// Coerce the loosely-typed population size to an integer.
    ///
    /// Models sometimes return `"3,731"` or `"3731 participants"` where a
    /// number was requested.
    pub fn population_count(&self) -> Option<i64> {
        match self.population_size.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => {
                let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
                digits.parse().ok()
            }
            _ => None,
        }
    }
}

/// Key findings from the results section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KeyResults {
    #[serde(default)]
    pub main_finding: String,
    #[serde(default)]
    pub key_results: Vec<String>,
    #[serde(default)]
    pub adverse_events: Option<Vec<String>>,
}

/// Author-reported limitations from the discussion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Limitations {
    #[serde(default)]
    pub limitations: Vec<String>,
}

/// Combined output of the five stage 2 tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedData {
    pub metadata: PaperMetadata,
    pub background: Background,
    pub design: StudyDesign,
    pub results: KeyResults,
    pub limitations: Limitations,
}

/// Parse a model response into `T`, recovering the JSON object from
/// surrounding prose first.
pub fn parse_response<T>(raw: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let json = find_json_object(raw)?;
    Ok(serde_json::from_str(json)?)
}

/// Parse a model response, degrading to `T::default()` on failure.
///
/// Stage 2 tasks are independent; one garbled response should not sink the
/// other four. The failure is logged and the caller gets an empty value.
pub fn parse_or_default<T>(task: &str, raw: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    match parse_response(raw) {
        Ok(value) => value,
        Err(error) => {
            warn!(task, %error, "failed to parse task response, using empty value");
            T::default()
        }
    }
}

/// Pick section text for a task, falling back to the overview when the
/// detected section is missing or too thin to be useful, and to the lead of
/// the document when the overview itself is empty.
pub fn pick_text(
    document: &ParsedDocument,
    section: &str,
    overview: &str,
    min_chars: usize,
) -> String {
    let text = document.section(section);
    if text.trim().len() >= min_chars {
        text
    } else if !overview.trim().is_empty() {
        overview.to_string()
    } else {
        document.lead_text(LEAD_FALLBACK_CHARS).to_string()
    }
}
