//! Error types for LLM provider implementations.

use agent_core::CoreError;
use thiserror::Error;

/// Result type for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when talking to an LLM provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Model not found or not pulled.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Provider service unavailable (e.g., Ollama not running).
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Invalid response from provider.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// General provider error.
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LlmError::ServiceUnavailable(_) => true,
            _ => false,
        }
    }
}

/// Provider failures surface to agents as client errors.
impl From<LlmError> for CoreError {
    fn from(err: LlmError) -> Self {
        CoreError::Client(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::ServiceUnavailable("503".into()).is_retryable());
        assert!(!LlmError::ModelNotFound("llama3".into()).is_retryable());
        assert!(!LlmError::InvalidResponse("not json".into()).is_retryable());
    }

    #[test]
    fn test_converts_to_client_error() {
        let core: CoreError = LlmError::ModelNotFound("llama3".into()).into();
        match core {
            CoreError::Client(msg) => assert_eq!(msg, "Model not found: llama3"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
