// src/cli/run.rs - Wire config into components and run batch commands

use std::sync::Arc;
use std::time::Duration;

use crate::core::grouping::unscored_models;
use crate::core::orchestrator::{fetch_pending, refresh_summary, BatchOrchestrator};
use crate::evaluator::{JudgeClient, NormalizedWeights};
use crate::infra::config::Config;
use crate::infra::errors::JudgeBenchError;
use crate::provider::google::GoogleProvider;
use crate::provider::retry::{RetryPolicy, RetryProvider};
use crate::provider::ModelProvider;
use crate::store::{AnswerStore, HttpStore};

use super::progress::{format_report, terminal_progress};

/// Gemini behind the linear retry policy from config.
pub fn build_provider(config: &Config) -> Result<Arc<dyn ModelProvider>, JudgeBenchError> {
    let api_key = config.require_judge()?;
    let google = Arc::new(
        GoogleProvider::with_base_url(api_key.to_string(), config.judge.base_url.clone())
            .with_timeout(Duration::from_secs(config.judge.timeout_secs)),
    );
    let policy = RetryPolicy::linear(
        config.judge.max_attempts,
        Duration::from_millis(config.judge.retry_step_ms),
    );
    Ok(Arc::new(RetryProvider::with_policy(google, policy)))
}

pub fn build_judge(config: &Config, provider: Arc<dyn ModelProvider>) -> JudgeClient {
    let weights = NormalizedWeights::from_overrides(&config.rubric.weights);
    JudgeClient::new(provider, &config.judge, weights)
}

pub fn build_store(config: &Config) -> Result<Arc<dyn AnswerStore>, JudgeBenchError> {
    let url = config.require_store()?;
    let store = HttpStore::new(url, config.store.token.clone())
        .with_timeout(Duration::from_secs(config.store.timeout_secs));
    Ok(Arc::new(store))
}

/// The default command: judge everything pending, then refresh the summary.
pub async fn run_batch(config: &Config) -> anyhow::Result<()> {
    // All three secrets up front: a batch never starts half-configured.
    let provider = build_provider(config)?;
    config.require_token()?;
    let store = build_store(config)?;

    let orchestrator = BatchOrchestrator::new(store, build_judge(config, provider), &config.run)
        .with_progress(terminal_progress());
    let report = orchestrator.run().await?;

    println!("{}", format_report(&report));
    for failure in &report.failed {
        tracing::warn!(question_id = %failure.question_id, "not scored this run: {}", failure.error);
    }
    Ok(())
}

/// Dry run: show which groups would be judged and which models are new.
pub async fn run_pending(config: &Config) -> anyhow::Result<()> {
    let store = build_store(config)?;
    let work = fetch_pending(store.as_ref(), config.run.force_reeval).await?;
    if work.groups.is_empty() {
        println!("Nothing pending ({} answer rows, {} scored).", work.raw_rows, work.scored_rows);
        return Ok(());
    }
    for group in &work.groups {
        let new_models = unscored_models(group, &work.scored);
        println!(
            "{:<16} {} answer(s), unscored: {}",
            group.question_id,
            group.items.len(),
            if new_models.is_empty() {
                "-".to_string()
            } else {
                new_models.join(", ")
            }
        );
    }
    println!("{} pending group(s)", work.groups.len());
    Ok(())
}

/// Refresh only the summary snapshot.
pub async fn run_summary(config: &Config) -> anyhow::Result<()> {
    let store = build_store(config)?;
    refresh_summary(store.as_ref(), &config.run.snapshot_path).await?;
    println!("Summary written to {}", config.run.snapshot_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_provider_requires_api_key() {
        let err = build_provider(&Config::default()).err().unwrap();
        assert!(matches!(err, JudgeBenchError::Config(_)));
    }

    #[test]
    fn test_build_store_requires_url() {
        let err = build_store(&Config::default()).err().unwrap();
        assert!(matches!(err, JudgeBenchError::Config(_)));
    }

    #[test]
    fn test_build_judge_uses_config_weights() {
        let mut config = Config::default();
        config.judge.api_key = Some("key".into());
        config
            .rubric
            .weights
            .insert("safety".into(), serde_json::json!(100));
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.id(), "google");

        let judge = build_judge(&config, provider);
        assert!((judge.weights().get(crate::evaluator::Criterion::Safety) - 0.5).abs() < 1e-9);
        assert_eq!(judge.model_id(), "gemini-2.5-pro");
    }

    #[test]
    fn test_build_store_accepts_valid_url() {
        let mut config = Config::default();
        config.store.url = Some("https://script.example.com/exec".into());
        assert!(build_store(&config).is_ok());
    }
}
