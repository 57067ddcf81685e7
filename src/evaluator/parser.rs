// src/evaluator/parser.rs - Parse judge output into a typed verdict

use std::collections::HashMap;

use serde_json::Value;

use super::rubric::Criterion;
use crate::infra::errors::JudgeBenchError;

/// Strip one leading and one trailing markdown code fence, if present.
pub fn strip_code_fence(text: &str) -> &str {
    let mut s = text.trim();

    if let Some(rest) = s.strip_prefix("```") {
        // Drop the info string ("json", "JSON", ...) up to the first newline.
        s = match rest.find('\n') {
            Some(nl) if rest[..nl].chars().all(|c| c.is_ascii_alphanumeric()) => &rest[nl + 1..],
            _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Turn raw judge text into a JSON value. Empty text or invalid JSON is
/// `MalformedJudgeOutput`, which callers must not retry.
pub fn parse_judge_output(text: &str) -> Result<Value, JudgeBenchError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(JudgeBenchError::malformed("judge returned no text"));
    }
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        JudgeBenchError::malformed(format!("{e}; output starts with: {preview}"))
    })
}

/// Per-criterion scores for one model, 0..5 each.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CriterionScores([f64; 6]);

impl CriterionScores {
    pub fn get(&self, criterion: Criterion) -> f64 {
        self.0[criterion as usize]
    }

    pub fn set(&mut self, criterion: Criterion, score: f64) {
        self.0[criterion as usize] = score;
    }

    fn from_value(value: &Value) -> Self {
        let mut scores = Self::default();
        for c in Criterion::ALL {
            scores.set(c, coerce_number(value.get(c.as_str())));
        }
        scores
    }
}

/// The judge's answer, keyed by model name. Lookups never fail: a model the
/// judge left out reads as all zeros with an empty reason.
#[derive(Debug, Clone, Default)]
pub struct JudgeVerdict {
    criteria_scores: HashMap<String, CriterionScores>,
    total_scores: HashMap<String, f64>,
    ranking: Vec<String>,
    reasons: HashMap<String, String>,
}

impl JudgeVerdict {
    pub fn from_value(value: &Value) -> Self {
        let criteria_scores = object_entries(value, "criteria_scores")
            .map(|(model, v)| (model.clone(), CriterionScores::from_value(v)))
            .collect();
        let total_scores = object_entries(value, "total_scores")
            .map(|(model, v)| (model.clone(), coerce_number(Some(v))))
            .collect();
        let reasons = object_entries(value, "reasons")
            .map(|(model, v)| {
                let text = match v {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (model.clone(), text)
            })
            .collect();
        let ranking = value
            .get("ranking")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            criteria_scores,
            total_scores,
            ranking,
            reasons,
        }
    }

    pub fn criteria_for(&self, model: &str) -> CriterionScores {
        self.criteria_scores.get(model).copied().unwrap_or_default()
    }

    pub fn total_for(&self, model: &str) -> Option<f64> {
        self.total_scores.get(model).copied()
    }

    pub fn reason_for(&self, model: &str) -> &str {
        self.reasons.get(model).map(String::as_str).unwrap_or("")
    }

    pub fn ranking(&self) -> &[String] {
        &self.ranking
    }

    pub fn has_model(&self, model: &str) -> bool {
        self.criteria_scores.contains_key(model) || self.total_scores.contains_key(model)
    }
}

fn object_entries<'a>(
    value: &'a Value,
    field: &str,
) -> impl Iterator<Item = (&'a String, &'a Value)> + 'a {
    value
        .get(field)
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|m| m.iter())
}

/// Numbers pass through, numeric strings are parsed, anything else is 0.
fn coerce_number(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}
