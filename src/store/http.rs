// src/store/http.rs - HTTP row store client
//
// GET  ?action=getRows&sheet={raw|scores}  -> { rows: [...] }
// GET  ?action=getSummary                   -> summary JSON (opaque)
// POST { action, token, sheet?, rows }      -> { ok, inserted } | { ok: false, error }
//
// POST bodies go out as text/plain: script-hosted endpoints reject a JSON
// content type on cross-origin writes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{AnswerStore, Sheet};
use crate::core::types::ScoreRow;
use crate::infra::errors::JudgeBenchError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpStore {
    client: Client,
    url: url::Url,
    token: Option<String>,
    timeout: Duration,
}

#[derive(Deserialize)]
struct RowsResp {
    #[serde(default)]
    rows: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct AppendReq<'a, R: Serialize> {
    action: &'a str,
    token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sheet: Option<&'a str>,
    rows: &'a [R],
}

#[derive(Deserialize)]
struct AppendResp {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    inserted: Option<usize>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpStore {
    pub fn new(url: url::Url, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url,
            token,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound every store request; a timeout surfaces as a `Store` error with status 0.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn token(&self, action: &str) -> Result<&str, JudgeBenchError> {
        self.token.as_deref().ok_or_else(|| {
            JudgeBenchError::Config(format!("store token required for {action}"))
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        action: &str,
        query: &[(&str, &str)],
    ) -> Result<T, JudgeBenchError> {
        let response = self
            .client
            .get(self.url.clone())
            .query(&[("action", action)])
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(action, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeBenchError::Store {
                action: action.into(),
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| JudgeBenchError::Store {
            action: action.into(),
            status: status.as_u16(),
            message: format!("invalid JSON: {e}"),
        })
    }

    async fn post_append<R: Serialize + Sync>(
        &self,
        action: &str,
        sheet: Option<Sheet>,
        rows: &[R],
    ) -> Result<usize, JudgeBenchError> {
        let body = serde_json::to_string(&AppendReq {
            action,
            token: self.token(action)?,
            sheet: sheet.map(Sheet::as_str),
            rows,
        })?;

        let response = self
            .client
            .post(self.url.clone())
            .header("content-type", "text/plain;charset=utf-8")
            .timeout(self.timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(action, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeBenchError::Store {
                action: action.into(),
                status: status.as_u16(),
                message: body,
            });
        }

        let resp: AppendResp = response.json().await.map_err(|e| JudgeBenchError::Store {
            action: action.into(),
            status: status.as_u16(),
            message: format!("invalid JSON: {e}"),
        })?;

        if !resp.ok {
            return Err(JudgeBenchError::StoreRejected {
                action: action.into(),
                error: resp.error.unwrap_or_else(|| "unknown error".into()),
            });
        }
        Ok(resp.inserted.unwrap_or(rows.len()))
    }
}

fn transport_error(action: &str, e: reqwest::Error) -> JudgeBenchError {
    JudgeBenchError::Store {
        action: action.into(),
        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
        message: e.to_string(),
    }
}

#[async_trait]
impl AnswerStore for HttpStore {
    async fn get_rows(&self, sheet: Sheet) -> Result<Vec<serde_json::Value>, JudgeBenchError> {
        let resp: RowsResp = self
            .get_json("getRows", &[("sheet", sheet.as_str())])
            .await?;
        Ok(resp.rows)
    }

    async fn get_summary(&self) -> Result<serde_json::Value, JudgeBenchError> {
        self.get_json("getSummary", &[]).await
    }

    async fn append_scores(&self, rows: &[ScoreRow]) -> Result<usize, JudgeBenchError> {
        self.post_append("appendScores", None, rows).await
    }

    async fn append_rows(
        &self,
        sheet: Sheet,
        rows: &[serde_json::Value],
    ) -> Result<usize, JudgeBenchError> {
        self.post_append("appendRows", Some(sheet), rows).await
    }
}
