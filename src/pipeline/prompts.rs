//! LLM prompts for the extraction pipeline.
//!
//! All prompts request JSON output; callers still recover the payload with
//! [`crate::traits::find_json_object`] because model output is never assumed
//! to be machine-clean.

use sha2::{Digest, Sha256};

/// System prompt for the study classifier.
pub const CLASSIFY_SYSTEM_PROMPT: &str = "You are an expert clinical study analyst with deep \
knowledge of study designs. Your task is to classify the study type and structure from the \
provided text. Return ONLY valid JSON with no commentary, explanations, or extra text.";

/// Retrieval query used to gather classifier context.
pub const CLASSIFY_CONTEXT_QUERY: &str =
    "study design type structure arms outcomes follow-up duration methodology";

/// Prompt for classifying study shape.
pub const CLASSIFY_PROMPT: &str = r#"Analyze this study and classify it. Answer these questions:

1. What is the STUDY TYPE? (e.g., "randomized_controlled_trial", "observational", "cohort", "case_control", "cross_sectional")
2. What is the DESIGN? (e.g., "parallel", "crossover", "factorial", or "not_applicable")
3. How many TREATMENT ARMS? List the arm labels.
4. How many PRIMARY OUTCOMES? What are they?
5. How many SECONDARY OUTCOMES? List them.
6. Is there SAFETY/ADVERSE EVENT analysis?
7. Is there PHARMACOKINETIC data (AUC, Cmax, etc.)?
8. What is the FOLLOW-UP DURATION?
9. Any special design features? (e.g., "multicenter", "double-blind", "adaptive")
10. How confident are you in this classification? (high/medium/low)

Return this JSON (and ONLY this JSON):
{
  "study_type": "randomized_controlled_trial|observational|cohort|case_control|cross_sectional|other",
  "design": "parallel|crossover|factorial|not_applicable|other",
  "num_arms": 0,
  "arm_labels": ["...", "..."],
  "num_primary_outcomes": 0,
  "primary_outcome_names": ["..."],
  "num_secondary_outcomes": 0,
  "secondary_outcome_names": ["..."],
  "has_safety_analysis": false,
  "has_pharmacokinetic_data": false,
  "follow_up_duration": "...",
  "special_design_features": "...",
  "confidence": "high|medium|low",
  "notes": "..."
}

STUDY TEXT:
{context}"#;

/// Prompt for summarizing one document chunk (stage 1 fan-out).
pub const SUMMARIZE_CHUNK_PROMPT: &str = r#"You are summarizing Part {chunk_number}/{total_chunks} of a clinical trial research paper.

Paper Text (Part {chunk_number}):
{chunk_text}

Create a concise summary of this part in 200-300 words. Focus on:
- Main topics covered in this section
- Key findings or information presented
- Study design details if present
- Results or conclusions from this part

Then list 3-5 key points from this part.

Respond in JSON format:
{
    "summary": "200-300 word summary here",
    "key_points": ["point 1", "point 2", "point 3"]
}"#;

/// Prompt for combining chunk summaries into the paper overview (stage 1 fan-in).
pub const COMBINE_PROMPT: &str = r#"You are combining summaries from all parts of a clinical trial research paper.

Part Summaries:
{summaries}

Key Points from All Parts:
{key_points}

Create a comprehensive 1-2 page overview of this paper. Include:

1. **Study Overview**: What is this study about? (2-3 sentences)
2. **Study Design**: Type of study, population, intervention, comparator
3. **Methods**: Key methodological details
4. **Main Findings**: Primary outcomes and results
5. **Implications**: What does this study mean?
6. **Limitations**: Any obvious limitations mentioned

Make it cohesive - not just a list of summaries. This overview will be used by
specialized agents to extract specific data, so be thorough and clear.

Keep it under 1000 words."#;

/// Prompt for the metadata extraction task.
pub const METADATA_PROMPT: &str = r#"Extract metadata from this research paper abstract and overview.

Abstract:
{abstract}

Paper Overview:
{overview}

Extract the following fields:
1. title: The paper title (exact as written)
2. authors: List of author names (from abstract if available)
3. journal: Journal name (if mentioned)
4. year: Publication year (as number)
5. doi: DOI (as string, without URL)
6. study_type: Type of study - one of: RCT, observational, cohort, case-control, meta-analysis, other
7. trial_name: The trial's acronym or short name (e.g., "SELECT", "SUSTAIN-6"), if it has one
8. registry_number: Trial registry identifier (e.g., an NCT number), if mentioned

IMPORTANT: Only extract information that is clearly present in the text.
If a field is not found, use null.

Respond in JSON:
{
    "title": "exact title",
    "authors": ["Author One", "Author Two"],
    "journal": "Journal Name",
    "year": 2023,
    "doi": "10.xxxx/xxxxx",
    "study_type": "RCT",
    "trial_name": "SELECT",
    "registry_number": "NCT03574597"
}"#;

/// Prompt for the background extraction task.
pub const BACKGROUND_PROMPT: &str = r#"You are a medical journal editor. From the content below, generate:

1. background: ONE single sentence that mirrors NEJM/JACC positioning blurbs. It must:
   - specify study design elements (randomized, double-blind, head-to-head, etc.)
   - mention intervention and comparator, including drug class or delivery if relevant
   - name the target disease/population and risk profile
   - articulate the unmet clinical problem or rationale
   - stay factual, 25-40 words, no statistics, no outcomes, no extra commentary
2. research_question: 1-2 sentences that clearly capture the clinical hypothesis being tested.

INTRODUCTION:
{introduction}

PAPER OVERVIEW:
{overview}

Respond in JSON only:
{
    "background": "...",
    "research_question": "The main research question..."
}"#;

/// Prompt for the design extraction task.
pub const DESIGN_PROMPT: &str = r#"Extract study design information from this methods section.

Methods Section:
{methods}

Paper Overview:
{overview}

Extract:
1. population_size: Total number of participants (as integer, or null if not found)
2. intervention: Name/description of the intervention or treatment group (string)
3. comparator: Name/description of the comparison group (string)
4. primary_outcomes: List of primary outcomes measured (list of strings, 1-5 items)
5. condition: The disease or condition being treated (string)
6. inclusion_criteria: Key inclusion criteria, summarized in one sentence
7. exclusion_criteria: Key exclusion criteria, summarized in one sentence
8. mean_age: Mean or median participant age (as number, or null)
9. age_range: Age range or eligibility bounds, e.g. "45-75 years"
10. gender_distribution: Sex/gender breakdown, e.g. "61% male"

Be specific and use exact terminology from the paper.
If information is not clearly stated, use null.

Respond in JSON:
{
    "population_size": 3731,
    "intervention": "Semaglutide 1.0 mg weekly",
    "comparator": "Placebo",
    "primary_outcomes": [
        "Major adverse cardiovascular events"
    ],
    "condition": "Type 2 diabetes with high cardiovascular risk",
    "inclusion_criteria": "Adults with type 2 diabetes and established cardiovascular disease",
    "exclusion_criteria": "Prior pancreatitis or severe renal impairment",
    "mean_age": 64.6,
    "age_range": "50 years or older",
    "gender_distribution": "61% male"
}"#;

/// Prompt for the results extraction task.
pub const RESULTS_PROMPT: &str = r#"Extract key results and findings from this results section.

Results Section:
{results}

Paper Overview:
{overview}

Extract:
1. main_finding: The single most important finding from the study.
   Include effect size and confidence interval if available. (1-2 sentences)
2. key_results: List of 3-5 important secondary findings or results.
   Include numbers/statistics where available.
3. adverse_events: List of notable adverse events mentioned, or null if not discussed.

Focus on actual results, not interpretation. Extract numbers as stated in the paper.

Respond in JSON:
{
    "main_finding": "...",
    "key_results": ["...", "..."],
    "adverse_events": ["...", "..."]
}"#;

/// Prompt for the limitations extraction task.
pub const LIMITATIONS_PROMPT: &str = r#"Extract study limitations from this discussion section.

Discussion Section:
{discussion}

Paper Overview:
{overview}

Extract 3-5 key limitations mentioned by the authors. Include:
- Study design limitations (e.g., open-label, single-arm)
- Population limitations (e.g., limited to specific groups)
- Statistical/methodological concerns (e.g., short follow-up, potential bias)
- Generalizability issues

Each limitation should be concise (1-2 sentences) but specific.

Respond in JSON:
{
    "limitations": [
        "...",
        "..."
    ]
}"#;

/// System prompt shared by the shape-aware structured extraction tasks.
pub const STRUCTURED_SYSTEM_PROMPT: &str = "You are an evidence extraction assistant for \
clinical trials. Return ONLY valid JSON with no commentary.";

/// Retrieval query for outcome extraction.
pub const OUTCOMES_CONTEXT_QUERY: &str =
    "primary secondary outcomes effect estimates confidence intervals p-values results";

/// Prompt for shape-aware outcome extraction.
pub const OUTCOMES_PROMPT: &str = r#"Extract outcome data from the trial results.

Expected outcomes:
- Primary outcomes ({num_primary}): {primary_names}
- Secondary outcomes ({num_secondary}): {secondary_names}

For each outcome, extract:
1. Outcome name/label
2. Effect measure (e.g., hazard ratio, odds ratio, mean difference, event rate, etc.)
3. Numeric estimate
4. Confidence interval (95% unless otherwise specified)
5. P-value (if reported)
6. Units

Return as JSON:
{
  "outcomes": [
    {
      "name": "...",
      "measure_type": "hazard_ratio|odds_ratio|mean_difference|event_rate|continuous|auc|cmax|other",
      "estimate": 0.0,
      "confidence_interval": {"lower": 0.0, "upper": 0.0},
      "p_value": 0.05,
      "units": "...",
      "is_primary": true
    }
  ]
}

CONTEXT:
{context}"#;

/// Retrieval query for arm extraction.
pub const ARMS_CONTEXT_QUERY: &str = "treatment arms allocation randomization enrollment sample size";

/// Prompt for shape-aware arm extraction.
pub const ARMS_PROMPT: &str = r#"Extract treatment arm allocation data.

Expected arms ({num_arms}): {arm_labels}

For each arm, extract:
1. Arm label/name
2. Total allocated
3. Total analyzed
4. Total completed
5. Brief description of intervention

Return as JSON:
{
  "arms": [
    {
      "label": "...",
      "n_allocated": 0,
      "n_analyzed": 0,
      "n_completed": 0,
      "description": "..."
    }
  ]
}

CONTEXT:
{context}"#;

/// Retrieval query for safety extraction.
pub const SAFETY_CONTEXT_QUERY: &str = "adverse events safety serious events discontinuations \
side effects gastrointestinal cardiovascular laboratory";

/// Prompt for safety-event extraction.
pub const SAFETY_PROMPT: &str = r#"Extract all reported adverse events and safety data.

For each event, extract:
1. Event name
2. Event type (gastrointestinal, cardiovascular, laboratory, serious, discontinuation, etc.)
3. Incidence in each arm (count and/or percentage)
4. Whether it led to discontinuation
5. Whether it was a serious adverse event

Return as JSON:
{
  "safety_events": [
    {
      "event_name": "...",
      "event_type": "gastrointestinal|cardiovascular|laboratory|serious|discontinuation|other",
      "arm_data": {
        "arm_label": {"percent": 0.0, "count": 0}
      },
      "serious": false,
      "led_to_discontinuation": false,
      "notes": "..."
    }
  ]
}

CONTEXT:
{context}"#;

/// Retrieval query for dosing extraction.
pub const DOSING_CONTEXT_QUERY: &str = "dosing dose frequency route duration treatment regimen";

/// Prompt for dosing extraction.
pub const DOSING_PROMPT: &str = r#"Extract the dosing/treatment regimen for the intervention.

Return as JSON:
{
  "dosing": {
    "description": "...",
    "dose": "...",
    "frequency": "...",
    "duration": "...",
    "route": "...",
    "adjustments": "..."
  }
}

CONTEXT:
{context}"#;

/// Format the classifier prompt.
pub fn format_classify_prompt(context: &str) -> String {
    CLASSIFY_PROMPT.replace("{context}", context)
}

/// Format the chunk summarization prompt.
pub fn format_summarize_chunk_prompt(
    chunk_text: &str,
    chunk_number: usize,
    total_chunks: usize,
) -> String {
    SUMMARIZE_CHUNK_PROMPT
        .replace("{chunk_number}", &chunk_number.to_string())
        .replace("{total_chunks}", &total_chunks.to_string())
        .replace("{chunk_text}", chunk_text)
}

/// Format the combiner prompt from per-part summaries and pooled key points.
pub fn format_combine_prompt(summaries: &[(usize, String)], key_points: &[String]) -> String {
    let summaries_text = summaries
        .iter()
        .map(|(part, text)| format!("Part {part}:\n{text}"))
        .collect::<Vec<_>>()
        .join("\n\n");

    let key_points_text = key_points
        .iter()
        .map(|p| format!("- {p}"))
        .collect::<Vec<_>>()
        .join("\n");

    COMBINE_PROMPT
        .replace("{summaries}", &summaries_text)
        .replace("{key_points}", &key_points_text)
}

/// Format the metadata prompt.
pub fn format_metadata_prompt(abstract_text: &str, overview: &str) -> String {
    METADATA_PROMPT
        .replace("{abstract}", truncate(abstract_text, 1000))
        .replace("{overview}", truncate(overview, 1500))
}

/// Format the background prompt.
pub fn format_background_prompt(intro_text: &str, overview: &str) -> String {
    BACKGROUND_PROMPT
        .replace("{introduction}", truncate(intro_text, 1500))
        .replace("{overview}", truncate(overview, 1000))
}

/// Format the design prompt.
pub fn format_design_prompt(methods_text: &str, overview: &str) -> String {
    DESIGN_PROMPT
        .replace("{methods}", truncate(methods_text, 2000))
        .replace("{overview}", truncate(overview, 1000))
}

/// Format the results prompt.
pub fn format_results_prompt(results_text: &str, overview: &str) -> String {
    RESULTS_PROMPT
        .replace("{results}", truncate(results_text, 2000))
        .replace("{overview}", truncate(overview, 1000))
}

/// Format the limitations prompt.
pub fn format_limitations_prompt(discussion_text: &str, overview: &str) -> String {
    LIMITATIONS_PROMPT
        .replace("{discussion}", truncate(discussion_text, 2000))
        .replace("{overview}", truncate(overview, 1000))
}

/// Format the shape-aware outcomes prompt from the classification counts.
pub fn format_outcomes_prompt(
    num_primary: usize,
    primary_names: &[String],
    num_secondary: usize,
    secondary_names: &[String],
    context: &str,
) -> String {
    let primary = if primary_names.is_empty() {
        "To be identified".to_string()
    } else {
        primary_names.join(", ")
    };
    let secondary = if secondary_names.is_empty() {
        "None".to_string()
    } else {
        secondary_names.join(", ")
    };

    OUTCOMES_PROMPT
        .replace("{num_primary}", &num_primary.to_string())
        .replace("{primary_names}", &primary)
        .replace("{num_secondary}", &num_secondary.to_string())
        .replace("{secondary_names}", &secondary)
        .replace("{context}", context)
}

/// Format the shape-aware arms prompt.
pub fn format_arms_prompt(num_arms: usize, arm_labels: &[String], context: &str) -> String {
    let labels = if arm_labels.is_empty() {
        "To be identified".to_string()
    } else {
        arm_labels.join(", ")
    };

    ARMS_PROMPT
        .replace("{num_arms}", &num_arms.to_string())
        .replace("{arm_labels}", &labels)
        .replace("{context}", context)
}

/// Format the safety prompt.
pub fn format_safety_prompt(context: &str) -> String {
    SAFETY_PROMPT.replace("{context}", context)
}

/// Format the dosing prompt.
pub fn format_dosing_prompt(context: &str) -> String {
    DOSING_PROMPT.replace("{context}", context)
}

/// Hash of the chunk-summarization prompt, for cache invalidation.
pub fn summarize_prompt_hash() -> String {
    let mut hasher = Sha256::new();
    hasher.update(SUMMARIZE_CHUNK_PROMPT.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Truncate to at most `max_chars`, respecting char boundaries.
fn truncate(text: &str, max_chars: usize) -> &str {
    let mut end = max_chars.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
