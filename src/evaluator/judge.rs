// src/evaluator/judge.rs - LLM judge execution

use std::sync::Arc;

use super::parser::parse_judge_output;
use super::prompt::build_prompt;
use super::rubric::NormalizedWeights;
use crate::core::types::QuestionGroup;
use crate::infra::config::JudgeConfig;
use crate::infra::errors::JudgeBenchError;
use crate::provider::{ChatRequest, Message, ModelProvider};

/// Sends one question group to the judge and returns its parsed JSON.
///
/// Retries belong to the provider (see `RetryProvider`); this layer turns
/// text into JSON and nothing more. Interpreting the JSON is the reconciler's job.
pub struct JudgeClient {
    provider: Arc<dyn ModelProvider>,
    model_id: String,
    weights: NormalizedWeights,
    max_chars_per_answer: usize,
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

impl JudgeClient {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        config: &JudgeConfig,
        weights: NormalizedWeights,
    ) -> Self {
        Self {
            provider,
            model_id: config.model.clone(),
            weights,
            max_chars_per_answer: config.max_chars_per_answer,
            temperature: config.temperature,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        }
    }

    /// Identifier stamped on every score row.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn weights(&self) -> &NormalizedWeights {
        &self.weights
    }

    pub fn render_prompt(&self, group: &QuestionGroup) -> String {
        build_prompt(
            &group.question,
            &group.items,
            &self.weights,
            self.max_chars_per_answer,
        )
    }

    pub fn build_request(&self, group: &QuestionGroup) -> ChatRequest {
        ChatRequest {
            model: self.model_id.clone(),
            messages: vec![Message::user(self.render_prompt(group))],
            max_tokens: Some(self.max_output_tokens),
            temperature: Some(self.temperature),
            top_p: Some(self.top_p),
            json_output: true,
        }
    }

    /// One judge call for the whole group.
    pub async fn judge(&self, group: &QuestionGroup) -> Result<serde_json::Value, JudgeBenchError> {
        let response = self.provider.chat(self.build_request(group)).await?;

        tracing::debug!(
            question_id = %group.question_id,
            tokens = response.usage.total(),
            "Judge responded"
        );

        parse_judge_output(&response.content)
    }
}
