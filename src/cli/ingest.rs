// src/cli/ingest.rs - Forward answer rows from a CSV or JSON file to the raw sheet

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::infra::config::Config;
use crate::store::{AnswerStore, Sheet};

/// One uploaded row. Every column is forwarded as-is.
pub type UploadRow = Map<String, Value>;

const REQUIRED_COLUMNS: [&str; 2] = ["question_id", "model"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Json,
    /// Header row first: `question_id,question,model,answer_text[,...]`
    Csv,
}

impl UploadFormat {
    /// `.csv` (any case) is CSV; anything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => UploadFormat::Csv,
            _ => UploadFormat::Json,
        }
    }
}

/// Parse an upload into rows ready for `appendRows`.
///
/// JSON is either an array of objects or `{ "rows": [...] }`. Each row must
/// carry a non-blank `question_id` and `model`; a missing `created_at` is
/// stamped with `now`.
pub fn parse_rows(text: &str, format: UploadFormat, now: &str) -> anyhow::Result<Vec<UploadRow>> {
    let rows = match format {
        UploadFormat::Json => json_rows(text)?,
        UploadFormat::Csv => csv_rows(text)?,
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            for column in REQUIRED_COLUMNS {
                if is_blank(row.get(column)) {
                    anyhow::bail!("row {}: missing `{}`", i + 1, column);
                }
            }
            if is_blank(row.get("created_at")) {
                row.insert("created_at".into(), Value::String(now.to_string()));
            }
            Ok(row)
        })
        .collect()
}

fn json_rows(text: &str) -> anyhow::Result<Vec<UploadRow>> {
    let rows = match serde_json::from_str::<Value>(text)? {
        Value::Array(rows) => rows,
        Value::Object(mut obj) => match obj.remove("rows") {
            Some(Value::Array(rows)) => rows,
            _ => anyhow::bail!("expected a JSON array or an object with a `rows` array"),
        },
        _ => anyhow::bail!("expected a JSON array or an object with a `rows` array"),
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Object(map) => Ok(map),
            other => anyhow::bail!("row {}: expected an object, got {}", i + 1, other),
        })
        .collect()
}

fn csv_rows(text: &str) -> anyhow::Result<Vec<UploadRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    reader
        .records()
        .enumerate()
        .map(|(i, record)| {
            let record = record.map_err(|e| anyhow::anyhow!("row {}: {}", i + 1, e))?;
            Ok(headers
                .iter()
                .zip(record.iter())
                .map(|(column, value)| (column.to_string(), Value::String(value.to_string())))
                .collect())
        })
        .collect()
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

pub async fn run_ingest(config: &Config, file: &Path) -> anyhow::Result<()> {
    config.require_token()?;
    let store = super::run::build_store(config)?;

    let text = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", file.display(), e))?;
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let rows = parse_rows(&text, UploadFormat::from_path(file), &now)?;
    if rows.is_empty() {
        println!("No rows in {}", file.display());
        return Ok(());
    }

    let values: Vec<Value> = rows.into_iter().map(Value::Object).collect();
    let inserted = store.append_rows(Sheet::Raw, &values).await?;
    tracing::info!(file = %file.display(), inserted, "rows ingested");
    println!("Uploaded {} row(s)", inserted);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const NOW: &str = "2026-01-01T00:00:00.000Z";

    fn json_in(text: &str) -> anyhow::Result<Vec<UploadRow>> {
        parse_rows(text, UploadFormat::Json, NOW)
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(UploadFormat::from_path(Path::new("answers.CSV")), UploadFormat::Csv);
        assert_eq!(UploadFormat::from_path(Path::new("answers.json")), UploadFormat::Json);
        assert_eq!(UploadFormat::from_path(Path::new("answers")), UploadFormat::Json);
    }

    #[test]
    fn test_array_input_stamped() {
        let rows =
            json_in(r#"[{"question_id": 1, "question": "Q", "model": "a", "answer_text": "x"}]"#)
                .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["question_id"], json!(1));
        assert_eq!(rows[0]["created_at"], json!(NOW));
    }

    #[test]
    fn test_rows_object_keeps_existing_timestamp() {
        let rows =
            json_in(r#"{"rows": [{"question_id": "q", "model": "a", "created_at": "2025-05-05"}]}"#)
                .unwrap();
        assert_eq!(rows[0]["created_at"], json!("2025-05-05"));
    }

    #[test]
    fn test_extra_json_columns_forwarded() {
        let rows = json_in(
            r#"[{"question_id": "q1", "model": "a", "answer_text": "x", "latency_ms": 812, "tags": ["rust"]}]"#,
        )
        .unwrap();
        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({
                "question_id": "q1",
                "model": "a",
                "answer_text": "x",
                "latency_ms": 812,
                "tags": ["rust"],
                "created_at": NOW
            })
        );
    }

    #[test]
    fn test_bad_row_reports_position() {
        let err = json_in(r#"[{"question_id": "q", "model": "a"}, {"model": "b"}]"#).unwrap_err();
        assert_eq!(err.to_string(), "row 2: missing `question_id`");

        let err = json_in(r#"[{"question_id": "q", "model": ""}]"#).unwrap_err();
        assert_eq!(err.to_string(), "row 1: missing `model`");

        let err = json_in(r#"[{"question_id": "q", "model": "a"}, 7]"#).unwrap_err();
        assert!(err.to_string().starts_with("row 2:"));
    }

    #[test]
    fn test_scalar_rejected() {
        assert!(json_in("42").is_err());
        assert!(json_in(r#"{"data": []}"#).is_err());
    }

    #[test]
    fn test_csv_with_header_row() {
        let text = "question_id,question,model,answer_text\n\
                    q1,What is Pin?,alpha,\"Pins a value, so it cannot move\"\n\
                    \n\
                    q1,What is Pin?,beta,A pointer wrapper\n";
        let rows = parse_rows(text, UploadFormat::Csv, NOW).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["model"], json!("alpha"));
        assert_eq!(rows[0]["answer_text"], json!("Pins a value, so it cannot move"));
        assert_eq!(rows[1]["created_at"], json!(NOW));
    }

    #[test]
    fn test_csv_extra_columns_and_timestamp_kept() {
        let text = "question_id, model ,answer_text,source,created_at\n\
                    q2,gamma,ok,batch-7,2025-12-31T00:00:00Z\n";
        let rows = parse_rows(text, UploadFormat::Csv, NOW).unwrap();

        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({
                "question_id": "q2",
                "model": "gamma",
                "answer_text": "ok",
                "source": "batch-7",
                "created_at": "2025-12-31T00:00:00Z"
            })
        );
    }

    #[test]
    fn test_csv_short_row_missing_model() {
        let text = "question_id,question,model,answer_text\nq3,Orphan question\n";
        let err = parse_rows(text, UploadFormat::Csv, NOW).unwrap_err();
        assert_eq!(err.to_string(), "row 1: missing `model`");
    }
}
