// src/infra/config.rs - Configuration loading (TOML file + environment)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::infra::errors::JudgeBenchError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub judge: JudgeConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub rubric: RubricConfig,

    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    /// Answers longer than this many characters are trimmed in the prompt.
    pub max_chars_per_answer: usize,
    pub max_attempts: u32,
    /// Linear backoff step: attempt N waits N * step.
    pub retry_step_ms: u64,
    /// Per-request timeout for one judge call.
    pub timeout_secs: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-pro".into(),
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            temperature: 0.2,
            top_p: 0.9,
            max_output_tokens: 2048,
            max_chars_per_answer: 4000,
            max_attempts: 5,
            retry_step_ms: 1000,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_secs: 30,
        }
    }
}

/// Partial weight overrides; values stay raw JSON so non-numeric entries degrade to 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RubricConfig {
    #[serde(default)]
    pub weights: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub force_reeval: bool,
    /// Number of question groups judged at once. 1 = strictly sequential.
    pub concurrency: usize,
    pub snapshot_path: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            force_reeval: false,
            concurrency: 1,
            snapshot_path: PathBuf::from(paths::DEFAULT_SNAPSHOT_PATH),
        }
    }
}

impl Config {
    /// Load from an explicit file, else the default config file if present,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => match paths::config_file_path() {
                Some(p) if p.exists() => Self::load_from(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Overlay environment-style settings. `lookup` abstracts the process
    /// environment so tests can feed their own map.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), JudgeBenchError> {
        if let Some(v) = non_empty(lookup("GEMINI_API_KEY")) {
            self.judge.api_key = Some(v);
        }
        if let Some(v) = non_empty(lookup("JUDGE_MODEL")) {
            self.judge.model = v;
        }
        if let Some(v) = non_empty(lookup("MAX_CHARS_PER_ANSWER")) {
            self.judge.max_chars_per_answer = parse_env("MAX_CHARS_PER_ANSWER", &v)?;
        }
        if let Some(v) = non_empty(lookup("GAS_URL")) {
            self.store.url = Some(v);
        }
        if let Some(v) = non_empty(lookup("GAS_TOKEN")) {
            self.store.token = Some(v);
        }
        if let Some(v) = non_empty(lookup("WEIGHTS_JSON")) {
            self.merge_weights_json(&v);
        }
        if let Some(v) = non_empty(lookup("FORCE_REEVAL")) {
            self.run.force_reeval = parse_flag(&v);
        }
        if let Some(v) = non_empty(lookup("JUDGE_CONCURRENCY")) {
            self.run.concurrency = parse_env("JUDGE_CONCURRENCY", &v)?;
        }
        if let Some(v) = non_empty(lookup("SUMMARY_PATH")) {
            self.run.snapshot_path = PathBuf::from(v);
        }
        Ok(())
    }

    /// Merge a JSON object of weights over the current overrides.
    /// Anything that is not a JSON object is ignored.
    pub fn merge_weights_json(&mut self, raw: &str) {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Object(map)) => {
                self.rubric.weights.extend(map);
            }
            Ok(_) => tracing::warn!("WEIGHTS_JSON is not a JSON object; using default weights"),
            Err(e) => tracing::warn!("WEIGHTS_JSON unparseable ({e}); using default weights"),
        }
    }

    /// API key for the judge, or a fatal config error.
    pub fn require_judge(&self) -> Result<&str, JudgeBenchError> {
        self.judge
            .api_key
            .as_deref()
            .ok_or_else(|| JudgeBenchError::Config("GEMINI_API_KEY is not set".into()))
    }

    /// Store URL, validated, or a fatal config error.
    pub fn require_store(&self) -> Result<url::Url, JudgeBenchError> {
        let raw = self
            .store
            .url
            .as_deref()
            .ok_or_else(|| JudgeBenchError::Config("GAS_URL is not set".into()))?;
        url::Url::parse(raw)
            .map_err(|e| JudgeBenchError::Config(format!("GAS_URL '{raw}' is invalid: {e}")))
    }

    /// Shared store token, or a fatal config error.
    pub fn require_token(&self) -> Result<&str, JudgeBenchError> {
        self.store
            .token
            .as_deref()
            .ok_or_else(|| JudgeBenchError::Config("GAS_TOKEN is not set".into()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, JudgeBenchError> {
    value
        .trim()
        .parse()
        .map_err(|_| JudgeBenchError::Config(format!("{key}='{value}' is not a valid number")))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.judge.model, "gemini-2.5-pro");
        assert_eq!(c.judge.max_chars_per_answer, 4000);
        assert_eq!(c.judge.max_attempts, 5);
        assert_eq!(c.judge.retry_step_ms, 1000);
        assert_eq!(c.judge.max_output_tokens, 2048);
        assert!(!c.run.force_reeval);
        assert_eq!(c.run.concurrency, 1);
        assert_eq!(c.run.snapshot_path, PathBuf::from("site/summary.json"));
        assert!(c.rubric.weights.is_empty());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.judge.max_attempts, 5);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[judge]
model = "gemini-2.5-flash"
max_chars_per_answer = 1200
temperature = 0.0

[store]
url = "https://script.example.com/exec"
token = "secret"

[rubric.weights]
accuracy = 50
safety = 10

[run]
force_reeval = true
concurrency = 4
snapshot_path = "out/summary.json"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.judge.model, "gemini-2.5-flash");
        assert_eq!(config.judge.max_chars_per_answer, 1200);
        // Unset fields in a present section keep their defaults.
        assert_eq!(config.judge.max_attempts, 5);
        assert_eq!(config.store.token.as_deref(), Some("secret"));
        assert_eq!(config.rubric.weights["accuracy"], serde_json::json!(50));
        assert!(config.run.force_reeval);
        assert_eq!(config.run.concurrency, 4);
    }

    #[test]
    fn test_env_overrides() {
        let mut c = Config::default();
        c.apply_env(env(&[
            ("GEMINI_API_KEY", "key-1"),
            ("GAS_URL", "https://script.example.com/exec"),
            ("GAS_TOKEN", "tok"),
            ("MAX_CHARS_PER_ANSWER", "800"),
            ("FORCE_REEVAL", "TRUE"),
            ("JUDGE_MODEL", "gemini-2.5-flash"),
        ]))
        .unwrap();
        assert_eq!(c.require_judge().unwrap(), "key-1");
        assert_eq!(c.require_token().unwrap(), "tok");
        assert_eq!(c.judge.max_chars_per_answer, 800);
        assert_eq!(c.judge.model, "gemini-2.5-flash");
        assert!(c.run.force_reeval);
    }

    #[test]
    fn test_force_flag_only_truthy_values() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" Yes "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("on"));
    }

    #[test]
    fn test_bad_number_is_config_error() {
        let mut c = Config::default();
        let err = c
            .apply_env(env(&[("MAX_CHARS_PER_ANSWER", "lots")]))
            .unwrap_err();
        assert!(matches!(err, JudgeBenchError::Config(_)));
    }

    #[test]
    fn test_weights_json_merges_over_file_weights() {
        let mut c = Config::default();
        c.rubric
            .weights
            .insert("accuracy".into(), serde_json::json!(10));
        c.merge_weights_json(r#"{"clarity": 30, "accuracy": 40}"#);
        assert_eq!(c.rubric.weights["accuracy"], serde_json::json!(40));
        assert_eq!(c.rubric.weights["clarity"], serde_json::json!(30));
    }

    #[test]
    fn test_malformed_weights_json_ignored() {
        let mut c = Config::default();
        c.merge_weights_json("{not json");
        c.merge_weights_json("[1, 2]");
        assert!(c.rubric.weights.is_empty());
    }

    #[test]
    fn test_missing_secrets_are_fatal() {
        let c = Config::default();
        assert!(matches!(c.require_judge(), Err(JudgeBenchError::Config(_))));
        assert!(matches!(c.require_store(), Err(JudgeBenchError::Config(_))));
        assert!(matches!(c.require_token(), Err(JudgeBenchError::Config(_))));
    }

    #[test]
    fn test_invalid_store_url_rejected() {
        let mut c = Config::default();
        c.store.url = Some("not a url".into());
        assert!(matches!(c.require_store(), Err(JudgeBenchError::Config(_))));
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let mut c = Config::default();
        c.apply_env(env(&[("GEMINI_API_KEY", "  "), ("SUMMARY_PATH", "")]))
            .unwrap();
        assert!(c.judge.api_key.is_none());
        assert_eq!(c.run.snapshot_path, PathBuf::from("site/summary.json"));
    }

    #[test]
    fn test_blank_force_env_keeps_file_setting() {
        let mut c: Config = toml::from_str("[run]\nforce_reeval = true\n").unwrap();
        c.apply_env(env(&[("FORCE_REEVAL", "")])).unwrap();
        assert!(c.run.force_reeval);

        c.apply_env(env(&[("FORCE_REEVAL", "false")])).unwrap();
        assert!(!c.run.force_reeval);
    }

    #[test]
    fn test_timeouts_default_and_override() {
        let c = Config::default();
        assert_eq!(c.judge.timeout_secs, 120);
        assert_eq!(c.store.timeout_secs, 30);

        let c: Config = toml::from_str("[judge]\ntimeout_secs = 10\n[store]\nurl = \"https://x.example/exec\"\n").unwrap();
        assert_eq!(c.judge.timeout_secs, 10);
        assert_eq!(c.store.timeout_secs, 30);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }
}
