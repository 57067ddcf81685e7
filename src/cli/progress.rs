// src/cli/progress.rs - Terminal progress renderer for batch runs

use crate::core::types::{BatchEvent, BatchReport};

/// Render one event as a single progress line.
pub fn format_event(event: &BatchEvent) -> String {
    match event {
        BatchEvent::Fetched {
            raw_rows,
            scored_rows,
        } => format!("[fetch] {} answer row(s), {} score row(s)", raw_rows, scored_rows),
        BatchEvent::Pending { groups } => format!("[plan] {} pending group(s)", groups),
        BatchEvent::GroupJudged {
            question_id,
            persisted,
        } => format!("[judged] {} -> {} new row(s)", question_id, persisted),
        BatchEvent::GroupFailed { question_id, error } => {
            format!("[failed] {}: {}", question_id, error)
        }
        BatchEvent::SnapshotWritten { path } => format!("[summary] {}", path.display()),
    }
}

/// Build a progress callback that writes formatted output to stderr.
///
/// Progress goes to stderr so stdout stays clean for the report.
pub fn terminal_progress() -> impl Fn(BatchEvent) + Send + Sync + 'static {
    move |event| eprintln!("{}", format_event(&event))
}

/// One-line batch summary.
pub fn format_report(report: &BatchReport) -> String {
    let mut line = format!(
        "[done] groups={} judged={} failed={} rows={}",
        report.pending_groups,
        report.judged_groups,
        report.failed.len(),
        report.rows_persisted,
    );
    if let Some(ref path) = report.snapshot_path {
        line.push_str(&format!(" snapshot={}", path.display()));
    }
    line
}
