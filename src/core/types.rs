// src/core/types.rs - Shared data types for the judging pipeline

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One raw answer row as stored in the `raw` sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRow {
    #[serde(deserialize_with = "lenient_string")]
    pub question_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(deserialize_with = "lenient_string")]
    pub model: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub answer_text: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
}

/// An existing row from the `scores` sheet. Only the identity matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredRef {
    #[serde(deserialize_with = "lenient_string")]
    pub question_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub model: String,
}

/// `(question_id, model)`: the unit that gets scored at most once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub question_id: String,
    pub model: String,
}

impl IdentityKey {
    pub fn new(question_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            model: model.into(),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@@{}", self.question_id, self.model)
    }
}

impl From<&ScoredRef> for IdentityKey {
    fn from(r: &ScoredRef) -> Self {
        IdentityKey::new(&r.question_id, &r.model)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerItem {
    pub model: String,
    pub answer_text: String,
}

/// All answers to one question, judged together.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionGroup {
    pub question_id: String,
    pub question: String,
    pub items: Vec<AnswerItem>,
}

impl QuestionGroup {
    pub fn key_for(&self, item: &AnswerItem) -> IdentityKey {
        IdentityKey::new(&self.question_id, &item.model)
    }
}

/// One persisted score, one per identity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub question_id: String,
    pub model: String,
    pub accuracy: f64,
    pub completeness: f64,
    pub evidence: f64,
    pub actionability: f64,
    pub clarity: f64,
    pub safety: f64,
    pub total: f64,
    pub reason: String,
    pub judge_model: String,
    pub judged_at: DateTime<Utc>,
}

impl ScoreRow {
    pub fn key(&self) -> IdentityKey {
        IdentityKey::new(&self.question_id, &self.model)
    }
}

/// Why a single group did not get persisted.
#[derive(Debug, Clone)]
pub struct GroupFailure {
    pub question_id: String,
    pub error: String,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub pending_groups: usize,
    pub judged_groups: usize,
    pub rows_persisted: usize,
    pub failed: Vec<GroupFailure>,
    pub snapshot_path: Option<PathBuf>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Lifecycle events emitted by the batch orchestrator.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Fetched {
        raw_rows: usize,
        scored_rows: usize,
    },
    Pending {
        groups: usize,
    },
    GroupJudged {
        question_id: String,
        persisted: usize,
    },
    GroupFailed {
        question_id: String,
        error: String,
    },
    SnapshotWritten {
        path: PathBuf,
    },
}

/// Accept strings, numbers and booleans for text columns; null becomes "".
/// Spreadsheet-backed stores happily turn "42" into 42.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

/// Like `lenient_string` for optional columns: null and "" become `None`.
pub(crate) fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = lenient_string(deserializer)?;
    Ok(if s.is_empty() { None } else { Some(s) })
}
