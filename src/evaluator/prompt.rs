// src/evaluator/prompt.rs - Deterministic judging prompt

use std::borrow::Cow;
use std::fmt::Write;

use super::rubric::{Criterion, NormalizedWeights};
use crate::core::types::AnswerItem;

/// Appended to any answer cut at the character limit.
pub const TRIM_MARKER: &str = "\n\n[...trimmed for judging...]";

/// Cut `text` to at most `max_chars` characters (not bytes), marking the cut.
pub fn truncate_answer(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        None => Cow::Borrowed(text),
        Some((byte_idx, _)) => Cow::Owned(format!("{}{}", &text[..byte_idx], TRIM_MARKER)),
    }
}

/// Render the judging prompt for one question group.
///
/// Same inputs always give the same bytes: nothing time- or run-dependent goes in.
pub fn build_prompt(
    question: &str,
    items: &[AnswerItem],
    weights: &NormalizedWeights,
    max_chars_per_answer: usize,
) -> String {
    let mut out = String::with_capacity(2048);

    out.push_str(
        "You are an impartial judge. Several models answered the same question.\n\
         Evaluate every answer with the quantitative rubric below and output **JSON only**.\n\n",
    );

    out.push_str("## Question\n");
    out.push_str(question);
    out.push_str("\n\n## Answers\n");

    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        let _ = writeln!(out, "### Answer {} - \"{}\"", i + 1, item.model);
        out.push_str(&truncate_answer(&item.answer_text, max_chars_per_answer));
    }

    out.push_str("\n\n## Criteria and weights\n");
    for (criterion, _) in weights.iter() {
        let _ = writeln!(
            out,
            "- {}: {:.1}% ({})",
            criterion,
            weights.percent(criterion),
            criterion.description()
        );
    }
    out.push_str(
        "- Score each criterion from 0 to 5 (decimals allowed); the total (0-100) is the weighted sum.\n\
         - Do not reward length or rhetoric for its own sake.\n\
         - Break ties in favour of the more accurate, better grounded, more concrete answer.\n",
    );

    out.push_str("\n## Output (JSON only)\n");
    out.push_str(&output_schema());
    out
}

fn output_schema() -> String {
    let criteria = Criterion::ALL
        .iter()
        .map(|c| format!("\"{c}\": number"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{{\n  \"criteria_scores\": {{ \"<model>\": {{ {criteria} }} }},\n  \
         \"total_scores\": {{ \"<model>\": number }},\n  \
         \"ranking\": [\"<1st model>\", \"<2nd model>\", ...],\n  \
         \"reasons\": {{ \"<model>\": \"short justification\" }}\n}}"
    )
}
