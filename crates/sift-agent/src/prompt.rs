//! Prompt assembly for the screening evaluator.

use std::fmt::Write as _;

use sift_core::entities::Article;
use sift_core::enums::CriterionType;

use crate::evaluator::{CriterionSpec, ScreeningResult};

const GUIDELINES: &str = "\
# EVALUATION GUIDELINES

## Inclusion criteria
- met=true: the article satisfies the criterion
- met=false: the article does not satisfy the criterion
- met=null: the available text does not tell

## Exclusion criteria
- met=true: the article triggers the exclusion
- met=false: the article does not trigger it
- met=null: the available text does not tell

## Overall decision
- include: ALL inclusion criteria met AND NO exclusion criterion triggered
- exclude: ANY inclusion criterion not met OR ANY exclusion criterion triggered
- uncertain: the text does not allow a confident determination

Prefer uncertain over a guess; a human reviewer will look at uncertain articles.
Confidence scores (0.0 to 1.0) must reflect how explicit the evidence is.
When excluding, set primary_exclusion_reason to the code of the most important
criterion.
";

fn write_criteria_section(out: &mut String, heading: &str, criteria: &[&CriterionSpec]) {
    let _ = writeln!(out, "## {heading}\n");
    for criterion in criteria {
        let _ = writeln!(out, "**{}**: {}", criterion.code, criterion.description);
        if let Some(rationale) = criterion.rationale.as_deref().filter(|r| !r.is_empty()) {
            let _ = writeln!(out, "  *Rationale*: {rationale}");
        }
        out.push('\n');
    }
}

/// JSON schema the evaluator's answer must satisfy.
#[must_use]
pub fn output_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(ScreeningResult)).unwrap_or_default()
}

/// System prompt carrying the review question, the criteria and the output contract.
#[must_use]
pub fn system_prompt(review_question: &str, criteria: &[CriterionSpec]) -> String {
    let (inclusion, exclusion): (Vec<_>, Vec<_>) = criteria
        .iter()
        .partition(|c| c.criterion_type == CriterionType::Inclusion);

    let mut out = String::from(
        "You are an expert systematic review screener helping researchers evaluate \
         academic articles.\n\n",
    );
    let _ = writeln!(out, "# RESEARCH QUESTION\n{review_question}\n");
    out.push_str(
        "# TASK\nEvaluate the article against EVERY criterion below and give, for each, \
         whether it is met, your confidence and your reasoning.\n\n",
    );
    write_criteria_section(&mut out, "INCLUSION CRITERIA", &inclusion);
    write_criteria_section(&mut out, "EXCLUSION CRITERIA", &exclusion);
    out.push_str(GUIDELINES);
    let schema = serde_json::to_string_pretty(&output_schema()).unwrap_or_default();
    let _ = write!(
        out,
        "\n# OUTPUT\nAnswer with a single JSON object and nothing else, matching this schema:\n{schema}\n"
    );
    out
}

/// Article text shown to the evaluator. `full_text` is appended when present.
#[must_use]
pub fn article_text(article: &Article, full_text: Option<&str>) -> String {
    let mut parts = vec![format!("# {}\n", article.title)];
    if !article.authors.is_empty() {
        parts.push(format!("**Authors**: {}\n", article.authors.join(", ")));
    }
    if let Some(year) = article.year {
        parts.push(format!("**Year**: {year}\n"));
    }
    if let Some(abstract_text) = article.abstract_text.as_deref().filter(|a| !a.is_empty()) {
        parts.push(format!("\n## Abstract\n\n{abstract_text}\n"));
    }
    if let Some(full_text) = full_text.filter(|t| !t.trim().is_empty()) {
        parts.push(format!("\n## Full Text\n\n{full_text}\n"));
    }
    parts.join("\n")
}
