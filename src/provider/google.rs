// src/provider/google.rs - Google Generative AI (Gemini) judge backend

use std::time::Duration;

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse, ModelProvider, Role, TokenUsage};
use crate::infra::errors::JudgeBenchError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub struct GoogleProvider {
    api_key: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    /// Bound each generateContent call. A timeout fails the call; it is not retried.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the Gemini request body from a ChatRequest.
    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let contents: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": m.content }],
                })
            })
            .collect();

        let mut gen_config = serde_json::json!({});
        if let Some(temp) = request.temperature {
            gen_config["temperature"] = serde_json::json!(temp);
        }
        if let Some(top_p) = request.top_p {
            gen_config["topP"] = serde_json::json!(top_p);
        }
        if let Some(max_tokens) = request.max_tokens {
            gen_config["maxOutputTokens"] = serde_json::json!(max_tokens);
        }
        if request.json_output {
            gen_config["responseMimeType"] = serde_json::json!("application/json");
        }

        serde_json::json!({
            "contents": contents,
            "generationConfig": gen_config,
        })
    }
}

#[async_trait]
impl ModelProvider for GoogleProvider {
    fn id(&self) -> &str {
        "google"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, JudgeBenchError> {
        let body = self.build_request_body(&request);
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| JudgeBenchError::Provider {
                provider: "google".into(),
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status {
                reqwest::StatusCode::TOO_MANY_REQUESTS => JudgeBenchError::RateLimited {
                    provider: "google".into(),
                    status: status.as_u16(),
                    body: error_body,
                },
                reqwest::StatusCode::SERVICE_UNAVAILABLE => JudgeBenchError::Unavailable {
                    provider: "google".into(),
                    status: status.as_u16(),
                    body: error_body,
                },
                _ => JudgeBenchError::Provider {
                    provider: "google".into(),
                    status: Some(status.as_u16()),
                    message: format!("HTTP {}: {}", status, error_body),
                },
            });
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| JudgeBenchError::malformed(format!("response is not JSON: {e}")))?;

        // Text lives in candidates[0].content.parts[*].text
        let content: String = resp["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
            .unwrap_or_default();

        let usage = TokenUsage {
            input_tokens: resp["usageMetadata"]["promptTokenCount"]
                .as_u64()
                .unwrap_or(0) as u32,
            output_tokens: resp["usageMetadata"]["candidatesTokenCount"]
                .as_u64()
                .unwrap_or(0) as u32,
        };

        Ok(ChatResponse { content, usage })
    }
}
