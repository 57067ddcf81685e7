// src/store/mod.rs - Answer/score store seam

pub mod http;

use async_trait::async_trait;

use crate::core::types::ScoreRow;
use crate::infra::errors::JudgeBenchError;

pub use http::HttpStore;

/// The two logical tables held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sheet {
    Raw,
    Scores,
}

impl Sheet {
    pub fn as_str(self) -> &'static str {
        match self {
            Sheet::Raw => "raw",
            Sheet::Scores => "scores",
        }
    }
}

/// Remote append-only row store. Rows come back as loose JSON so callers
/// decide how strictly to decode them.
#[async_trait]
pub trait AnswerStore: Send + Sync {
    async fn get_rows(&self, sheet: Sheet) -> Result<Vec<serde_json::Value>, JudgeBenchError>;

    /// Aggregate summary, passed through to the dashboard untouched.
    async fn get_summary(&self) -> Result<serde_json::Value, JudgeBenchError>;

    /// Append score rows. Returns how many the store says it inserted.
    async fn append_scores(&self, rows: &[ScoreRow]) -> Result<usize, JudgeBenchError>;

    /// Append arbitrary rows to a sheet (ingestion path).
    async fn append_rows(
        &self,
        sheet: Sheet,
        rows: &[serde_json::Value],
    ) -> Result<usize, JudgeBenchError>;
}

/// Decode loose rows, skipping (and logging) any that don't fit `T`.
pub fn decode_rows<T: serde::de::DeserializeOwned>(
    sheet: Sheet,
    rows: Vec<serde_json::Value>,
) -> Vec<T> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(i, row)| match serde_json::from_value(row) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(sheet = sheet.as_str(), row = i, "Skipping undecodable row: {e}");
                None
            }
        })
        .collect()
}
