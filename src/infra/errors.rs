// src/infra/errors.rs - Error types for judgebench

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JudgeBenchError {
    // Judge transport errors (retriable)
    #[error("Rate limited by '{provider}' (HTTP {status}): {body}")]
    RateLimited {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("'{provider}' unavailable (HTTP {status}): {body}")]
    Unavailable {
        provider: String,
        status: u16,
        body: String,
    },

    // Judge errors (not retriable)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("'{provider}' still failing after {attempts} attempts (HTTP {status}): {body}")]
    RetriesExhausted {
        provider: String,
        attempts: u32,
        status: u16,
        body: String,
    },

    #[error("Malformed judge output: {reason}")]
    MalformedJudgeOutput { reason: String },

    // Store errors
    #[error("Store {action} failed (HTTP {status}): {message}")]
    Store {
        action: String,
        status: u16,
        message: String,
    },

    #[error("Store rejected {action}: {error}")]
    StoreRejected { action: String, error: String },

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JudgeBenchError {
    /// Only rate-limit and service-unavailable signals are worth another attempt.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            JudgeBenchError::RateLimited { .. } | JudgeBenchError::Unavailable { .. }
        )
    }

    /// HTTP status and body of a transient failure, if this is one.
    pub fn transient_status(&self) -> Option<(u16, &str)> {
        match self {
            JudgeBenchError::RateLimited { status, body, .. }
            | JudgeBenchError::Unavailable { status, body, .. } => Some((*status, body.as_str())),
            _ => None,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        JudgeBenchError::MalformedJudgeOutput {
            reason: reason.into(),
        }
    }
}
