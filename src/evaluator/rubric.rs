// src/evaluator/rubric.rs - Rubric criteria and weight normalization

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The fixed set of scoring criteria, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Accuracy,
    Completeness,
    Evidence,
    Actionability,
    Clarity,
    Safety,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Criterion::Accuracy,
        Criterion::Completeness,
        Criterion::Evidence,
        Criterion::Actionability,
        Criterion::Clarity,
        Criterion::Safety,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::Accuracy => "accuracy",
            Criterion::Completeness => "completeness",
            Criterion::Evidence => "evidence",
            Criterion::Actionability => "actionability",
            Criterion::Clarity => "clarity",
            Criterion::Safety => "safety",
        }
    }

    pub fn parse(name: &str) -> Option<Criterion> {
        Criterion::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// One-line description shown to the judge.
    pub fn description(self) -> &'static str {
        match self {
            Criterion::Accuracy => "facts, figures and reasoning are correct",
            Criterion::Completeness => "every requested sub-point is covered",
            Criterion::Evidence => "claims are sourced, grounded and consistent",
            Criterion::Actionability => "concrete steps, risks and alternatives",
            Criterion::Clarity => "clear structure and wording",
            Criterion::Safety => "no policy violations",
        }
    }

    /// Relative weight used when the configuration does not mention this criterion.
    pub fn default_weight(self) -> f64 {
        match self {
            Criterion::Accuracy => 35.0,
            Criterion::Completeness => 20.0,
            Criterion::Evidence => 20.0,
            Criterion::Actionability => 15.0,
            Criterion::Clarity => 10.0,
            Criterion::Safety => 0.0,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Criterion weights as fractions of 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedWeights([f64; 6]);

impl NormalizedWeights {
    /// Merge partial overrides over the defaults and normalize.
    ///
    /// Non-numeric, negative or missing values count as 0. Unknown criterion
    /// names are ignored. An all-zero configuration yields all-zero fractions.
    pub fn from_overrides(overrides: &BTreeMap<String, serde_json::Value>) -> Self {
        let mut raw = Criterion::ALL.map(Criterion::default_weight);

        for (name, value) in overrides {
            match Criterion::parse(name) {
                Some(c) => raw[c.index()] = coerce_weight(value),
                None => tracing::warn!(criterion = %name, "Ignoring weight for unknown criterion"),
            }
        }

        Self::normalize(raw)
    }

    /// The default rubric (35/20/20/15/10/0).
    pub fn defaults() -> Self {
        Self::normalize(Criterion::ALL.map(Criterion::default_weight))
    }

    fn normalize(raw: [f64; 6]) -> Self {
        let sum: f64 = raw.iter().sum();
        let total = if sum > 0.0 { sum } else { 1.0 };
        Self(raw.map(|w| w / total))
    }

    pub fn get(&self, criterion: Criterion) -> f64 {
        self.0[criterion.index()]
    }

    pub fn percent(&self, criterion: Criterion) -> f64 {
        self.get(criterion) * 100.0
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Criterion, f64)> + '_ {
        Criterion::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

impl Default for NormalizedWeights {
    fn default() -> Self {
        Self::defaults()
    }
}

fn coerce_weight(value: &serde_json::Value) -> f64 {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() && n > 0.0 {
        n
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn overrides(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_defaults_sum_to_one() {
        let w = NormalizedWeights::defaults();
        assert!((w.sum() - 1.0).abs() < 1e-9);
        assert!((w.get(Criterion::Accuracy) - 0.35).abs() < 1e-9);
        assert_eq!(w.get(Criterion::Safety), 0.0);
    }

    #[test]
    fn test_partial_override_renormalizes() {
        let w = NormalizedWeights::from_overrides(&overrides(&[("safety", json!(100))]));
        // 35+20+20+15+10+100 = 200
        assert!((w.get(Criterion::Safety) - 0.5).abs() < 1e-9);
        assert!((w.get(Criterion::Accuracy) - 0.175).abs() < 1e-9);
        assert!((w.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_zero_does_not_panic() {
        let all_zero: Vec<(&str, serde_json::Value)> =
            Criterion::ALL.iter().map(|c| (c.as_str(), json!(0))).collect();
        let w = NormalizedWeights::from_overrides(&overrides(&all_zero));
        assert_eq!(w.sum(), 0.0);
        for (_, frac) in w.iter() {
            assert_eq!(frac, 0.0);
        }
    }

    #[test]
    fn test_garbage_values_count_as_zero() {
        let w = NormalizedWeights::from_overrides(&overrides(&[
            ("accuracy", json!("abc")),
            ("completeness", json!(-5)),
            ("evidence", json!(null)),
            ("clarity", json!("10")),
        ]));
        assert_eq!(w.get(Criterion::Accuracy), 0.0);
        assert_eq!(w.get(Criterion::Completeness), 0.0);
        assert_eq!(w.get(Criterion::Evidence), 0.0);
        // actionability 15 + clarity 10 remain
        assert!((w.get(Criterion::Actionability) - 0.6).abs() < 1e-9);
        assert!((w.get(Criterion::Clarity) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_criterion_ignored() {
        let w = NormalizedWeights::from_overrides(&overrides(&[("style", json!(1000))]));
        assert_eq!(w, NormalizedWeights::defaults());
    }

    #[test]
    fn test_sums_to_one_for_many_configs() {
        for a in [0.0, 0.5, 3.0, 77.0] {
            for s in [0.0, 1.0, 40.0] {
                let w = NormalizedWeights::from_overrides(&overrides(&[
                    ("accuracy", json!(a)),
                    ("safety", json!(s)),
                ]));
                assert!((w.sum() - 1.0).abs() < 1e-9, "a={a} s={s}");
            }
        }
    }

    #[test]
    fn test_criterion_parse_case_insensitive() {
        assert_eq!(Criterion::parse("Accuracy"), Some(Criterion::Accuracy));
        assert_eq!(Criterion::parse(" SAFETY "), Some(Criterion::Safety));
        assert_eq!(Criterion::parse("tone"), None);
    }
}
