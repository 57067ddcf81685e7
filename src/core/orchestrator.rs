// src/core/orchestrator.rs - Batch controller
//
// Idle -> FetchingPending -> JudgingGroup* -> Summarizing -> Done
//
// Each group runs judge -> reconcile -> persist on its own. A failure there
// is logged and recorded in the report; the batch moves on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;

use super::grouping::{group_by_question, pending_groups, ScoredIndex};
use super::reconcile::{rows_to_persist, Reconciler};
use super::snapshot::write_snapshot;
use super::types::*;
use crate::evaluator::{JudgeClient, JudgeVerdict};
use crate::infra::config::RunConfig;
use crate::infra::errors::JudgeBenchError;
use crate::store::{decode_rows, AnswerStore, Sheet};

/// Everything fetched at batch start. Dedup decisions for the whole batch
/// use this one snapshot.
#[derive(Debug, Clone)]
pub struct PendingWork {
    pub groups: Vec<QuestionGroup>,
    pub scored: ScoredIndex,
    pub raw_rows: usize,
    pub scored_rows: usize,
}

/// Drives one judging batch against a store and a judge.
pub struct BatchOrchestrator {
    store: Arc<dyn AnswerStore>,
    judge: JudgeClient,
    reconciler: Reconciler,
    force: bool,
    concurrency: usize,
    snapshot_path: PathBuf,
    /// Optional callback for real-time progress events.
    on_progress: Option<Box<dyn Fn(BatchEvent) + Send + Sync>>,
}

impl BatchOrchestrator {
    pub fn new(store: Arc<dyn AnswerStore>, judge: JudgeClient, run: &RunConfig) -> Self {
        let reconciler = Reconciler::new(judge.model_id(), *judge.weights());
        Self {
            store,
            judge,
            reconciler,
            force: run.force_reeval,
            concurrency: run.concurrency.max(1),
            snapshot_path: run.snapshot_path.clone(),
            on_progress: None,
        }
    }

    /// Set a callback for real-time progress events.
    pub fn with_progress(mut self, cb: impl Fn(BatchEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    /// Run the full batch: fetch, judge every pending group, refresh the summary.
    pub async fn run(&self) -> Result<BatchReport, JudgeBenchError> {
        let PendingWork {
            groups,
            scored,
            raw_rows,
            scored_rows,
        } = fetch_pending(self.store.as_ref(), self.force).await?;
        self.emit(BatchEvent::Fetched {
            raw_rows,
            scored_rows,
        });
        self.emit(BatchEvent::Pending {
            groups: groups.len(),
        });

        let mut report = BatchReport {
            pending_groups: groups.len(),
            ..Default::default()
        };

        let scored = &scored;
        let outcomes: Vec<(String, Result<usize, JudgeBenchError>)> =
            futures::stream::iter(groups)
                .map(|group| async move {
                    let result = self.process_group(&group, scored).await;
                    (group.question_id, result)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        for (question_id, outcome) in outcomes {
            match outcome {
                Ok(persisted) => {
                    report.judged_groups += 1;
                    report.rows_persisted += persisted;
                }
                Err(e) => report.failed.push(GroupFailure {
                    question_id,
                    error: e.to_string(),
                }),
            }
        }

        refresh_summary(self.store.as_ref(), &self.snapshot_path).await?;
        self.emit(BatchEvent::SnapshotWritten {
            path: self.snapshot_path.clone(),
        });
        report.snapshot_path = Some(self.snapshot_path.clone());
        Ok(report)
    }

    /// Judge, reconcile and persist one group. Returns rows persisted.
    async fn process_group(
        &self,
        group: &QuestionGroup,
        scored: &ScoredIndex,
    ) -> Result<usize, JudgeBenchError> {
        let result = self.judge_and_persist(group, scored).await;
        match &result {
            Ok(persisted) => {
                tracing::info!(question_id = %group.question_id, persisted, "judged");
                self.emit(BatchEvent::GroupJudged {
                    question_id: group.question_id.clone(),
                    persisted: *persisted,
                });
            }
            Err(e) => {
                tracing::error!(question_id = %group.question_id, "judge fail: {e}");
                self.emit(BatchEvent::GroupFailed {
                    question_id: group.question_id.clone(),
                    error: e.to_string(),
                });
            }
        }
        result
    }

    async fn judge_and_persist(
        &self,
        group: &QuestionGroup,
        scored: &ScoredIndex,
    ) -> Result<usize, JudgeBenchError> {
        let raw = self.judge.judge(group).await?;
        let verdict = JudgeVerdict::from_value(&raw);
        let rows = self.reconciler.score_rows(group, &verdict, Utc::now());
        let rows = rows_to_persist(rows, scored, self.force);

        if rows.is_empty() {
            return Ok(0);
        }
        let inserted = self.store.append_scores(&rows).await?;
        if inserted != rows.len() {
            tracing::warn!(
                question_id = %group.question_id,
                sent = rows.len(),
                inserted,
                "Store inserted a different number of rows than sent"
            );
        }
        Ok(rows.len())
    }
}

/// Fetch raw and scored rows once and work out which groups need judging.
/// Any store failure here aborts: without both tables nothing is safe to judge.
pub async fn fetch_pending(
    store: &dyn AnswerStore,
    force: bool,
) -> Result<PendingWork, JudgeBenchError> {
    let raw: Vec<AnswerRow> = decode_rows(Sheet::Raw, store.get_rows(Sheet::Raw).await?);
    let scored_refs: Vec<ScoredRef> =
        decode_rows(Sheet::Scores, store.get_rows(Sheet::Scores).await?);

    let scored = ScoredIndex::from_rows(&scored_refs);
    let groups = pending_groups(group_by_question(&raw), &scored, force);

    tracing::info!(
        raw_rows = raw.len(),
        scored_rows = scored_refs.len(),
        force,
        "pending groups: {}",
        groups.len()
    );

    Ok(PendingWork {
        groups,
        scored,
        raw_rows: raw.len(),
        scored_rows: scored_refs.len(),
    })
}

/// Ask the store for a fresh summary and write it to `path`.
pub async fn refresh_summary(store: &dyn AnswerStore, path: &Path) -> Result<(), JudgeBenchError> {
    let summary = store.get_summary().await?;
    write_snapshot(path, &summary)?;
    tracing::info!(path = %path.display(), "summary snapshot written");
    Ok(())
}
