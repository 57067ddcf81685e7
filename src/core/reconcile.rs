// src/core/reconcile.rs - Map a judge verdict back onto score rows

use chrono::{DateTime, Utc};

use super::grouping::ScoredIndex;
use super::types::{QuestionGroup, ScoreRow};
use crate::evaluator::{Criterion, CriterionScores, JudgeVerdict, NormalizedWeights};

/// Criterion scores run 0..5; totals run 0..100.
const CRITERION_TO_TOTAL: f64 = 20.0;

/// Judge totals further than this from the recomputed weighted sum get a warning.
const TOTAL_TOLERANCE: f64 = 1.0;

/// Weighted total on the 0..100 scale.
pub fn weighted_total(scores: &CriterionScores, weights: &NormalizedWeights) -> f64 {
    weights
        .iter()
        .map(|(c, w)| w * scores.get(c))
        .sum::<f64>()
        * CRITERION_TO_TOTAL
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Builds score rows for a judged group.
pub struct Reconciler {
    judge_model: String,
    weights: NormalizedWeights,
}

impl Reconciler {
    pub fn new(judge_model: impl Into<String>, weights: NormalizedWeights) -> Self {
        Self {
            judge_model: judge_model.into(),
            weights,
        }
    }

    /// One row per item in the group, in group order.
    ///
    /// A model the judge skipped gets zeros rather than an error so the batch
    /// keeps moving. Criterion values are stored as given; the total is rounded
    /// to two decimals.
    pub fn score_rows(
        &self,
        group: &QuestionGroup,
        verdict: &JudgeVerdict,
        judged_at: DateTime<Utc>,
    ) -> Vec<ScoreRow> {
        group
            .items
            .iter()
            .map(|item| {
                let model = item.model.as_str();
                if !verdict.has_model(model) {
                    tracing::warn!(
                        question_id = %group.question_id,
                        model,
                        "Judge returned no scores for model; recording zeros"
                    );
                }

                let scores = verdict.criteria_for(model);
                let total = verdict.total_for(model).unwrap_or(0.0);
                let expected = weighted_total(&scores, &self.weights);
                if verdict.has_model(model) && (total - expected).abs() > TOTAL_TOLERANCE {
                    tracing::warn!(
                        question_id = %group.question_id,
                        model,
                        judge_total = total,
                        weighted_total = round2(expected),
                        "Judge total disagrees with weighted criteria"
                    );
                }

                ScoreRow {
                    question_id: group.question_id.clone(),
                    model: item.model.clone(),
                    accuracy: scores.get(Criterion::Accuracy),
                    completeness: scores.get(Criterion::Completeness),
                    evidence: scores.get(Criterion::Evidence),
                    actionability: scores.get(Criterion::Actionability),
                    clarity: scores.get(Criterion::Clarity),
                    safety: scores.get(Criterion::Safety),
                    total: round2(total),
                    reason: verdict.reason_for(model).to_string(),
                    judge_model: self.judge_model.clone(),
                    judged_at,
                }
            })
            .collect()
    }
}

/// Drop rows whose identity key is already stored, unless forced.
///
/// Groups are re-judged whole for context; only the new pairs get written.
pub fn rows_to_persist(rows: Vec<ScoreRow>, scored: &ScoredIndex, force: bool) -> Vec<ScoreRow> {
    if force {
        return rows;
    }
    rows.into_iter()
        .filter(|r| !scored.contains(&r.key()))
        .collect()
}
