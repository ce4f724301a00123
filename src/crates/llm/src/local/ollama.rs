//! Ollama client implementation.
//!
//! Sends a [`Transcript`] to Ollama's `/api/chat` endpoint with streaming
//! off and returns the assistant's reply text.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::local::OllamaClient;
//! use llm::config::LocalLlmConfig;
//! use agent_core::{LlmClient, Transcript};
//!
//! let client = OllamaClient::new(LocalLlmConfig::new("http://localhost:11434", "llama3.1"))?;
//! let reply = client
//!     .ask(&Transcript::new("You are terse.", "What is Rust?"))
//!     .await?;
//! ```

use crate::config::LocalLlmConfig;
use crate::error::{LlmError, Result};
use agent_core::{CoreError, LlmClient, Transcript};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Ollama client for local LLM inference.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    config: LocalLlmConfig,
    client: Client,
}

impl OllamaClient {
    /// Create a new Ollama client with the given configuration.
    pub fn new(config: LocalLlmConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, client })
    }

    /// Client configuration.
    pub fn config(&self) -> &LocalLlmConfig {
        &self.config
    }

    /// Model used for chat requests.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Check if the Ollama server is running.
    ///
    /// An unreachable server is `Ok(false)`, not an error.
    pub async fn check_health(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url());
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                debug!(error = %e, "Ollama health check failed");
                Ok(false)
            }
        }
    }

    /// List models the server has pulled.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.base_url());
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, body));
        }

        let tags: OllamaTagsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(tags.models)
    }

    /// Send `transcript` and return the reply text, retrying transient failures.
    pub async fn chat(&self, transcript: &Transcript) -> Result<String> {
        let request = self.build_request(transcript);
        let mut attempt = 0;

        loop {
            match self.send_chat(&request).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = RETRY_BASE_DELAY.saturating_mul(2u32.saturating_pow(attempt));
                    warn!(attempt = attempt + 1, error = %e, ?delay, "Retrying Ollama request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn build_request(&self, transcript: &Transcript) -> OllamaRequest {
        let messages = transcript
            .messages()
            .iter()
            .map(|m| OllamaMessage {
                role: m.role().as_str().to_string(),
                content: m.content().to_string(),
            })
            .collect();

        OllamaRequest {
            model: self.config.model.clone(),
            messages,
            stream: false,
            format: self.config.json_mode.then(|| "json".to_string()),
            options: self
                .config
                .temperature
                .map(|temperature| OllamaOptions { temperature }),
        }
    }

    async fn send_chat(&self, request: &OllamaRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url());
        debug!(model = %request.model, url = %url, "Sending Ollama chat request");

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, body));
        }

        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        debug!(
            prompt_tokens = ?body.prompt_eval_count,
            reply_tokens = ?body.eval_count,
            "Ollama chat completed"
        );
        Ok(body.message.content)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn ask(&self, transcript: &Transcript) -> agent_core::Result<String> {
        self.chat(transcript).await.map_err(CoreError::from)
    }
}

fn error_for_status(status: StatusCode, body: String) -> LlmError {
    match status {
        StatusCode::NOT_FOUND => LlmError::ModelNotFound(body),
        s if s.is_server_error() => LlmError::ServiceUnavailable(format!("{}: {}", s, body)),
        s => LlmError::ProviderError(format!("Ollama API error {}: {}", s, body)),
    }
}

/// A model the Ollama server has available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

// Ollama API types
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    prompt_eval_count: Option<usize>,
    #[serde(default)]
    eval_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(config: LocalLlmConfig) -> OllamaClient {
        OllamaClient::new(config).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = client(LocalLlmConfig::new("http://localhost:11434", "llama3.1"));
        assert_eq!(client.model(), "llama3.1");
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(OllamaClient::new(LocalLlmConfig::new("localhost", "llama3.1")).is_err());
    }

    #[test]
    fn test_request_body() {
        let client = client(LocalLlmConfig::new("http://localhost:11434", "mistral"));
        let request = client.build_request(&Transcript::new("You are helpful", "Hello"));

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "mistral",
                "messages": [
                    {"role": "system", "content": "You are helpful"},
                    {"role": "user", "content": "Hello"}
                ],
                "stream": false
            })
        );
    }

    #[test]
    fn test_request_body_with_options() {
        let config = LocalLlmConfig::new("http://localhost:11434", "llama3.1")
            .with_temperature(0.0)
            .with_json_mode(true);
        let request = client(config).build_request(&Transcript::new("s", "u"));
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["format"], "json");
        assert_eq!(value["options"], json!({"temperature": 0.0}));
    }

    #[test]
    fn test_unbounded_retries_rejected() {
        let config = LocalLlmConfig::default().with_max_retries(64);
        assert!(matches!(
            OllamaClient::new(config),
            Err(LlmError::ConfigError(_))
        ));
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let client = client(LocalLlmConfig::new("http://localhost:11434/", "m"));
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_response_parsing() {
        let body: OllamaResponse = serde_json::from_value(json!({
            "model": "llama3.1",
            "message": {"role": "assistant", "content": "Hello there!"},
            "done": true,
            "prompt_eval_count": 10,
            "eval_count": 25
        }))
        .unwrap();
        assert_eq!(body.message.content, "Hello there!");
        assert_eq!(body.eval_count, Some(25));
    }

    #[test]
    fn test_error_for_status() {
        assert!(matches!(
            error_for_status(StatusCode::NOT_FOUND, "model 'x' not found".into()),
            LlmError::ModelNotFound(_)
        ));
        assert!(error_for_status(StatusCode::SERVICE_UNAVAILABLE, String::new()).is_retryable());
        assert!(matches!(
            error_for_status(StatusCode::BAD_REQUEST, "bad".into()),
            LlmError::ProviderError(_)
        ));
    }

    /// Requires a running Ollama server.
    #[tokio::test]
    #[ignore]
    async fn test_health_check() {
        let client = client(LocalLlmConfig::default());
        let is_healthy = client.check_health().await.unwrap();
        println!("Ollama health: {}", is_healthy);
    }

    /// Requires a running Ollama server with the default model pulled.
    #[tokio::test]
    #[ignore]
    async fn test_live_chat() {
        let client = client(LocalLlmConfig::default().with_temperature(0.0));
        let reply = client
            .ask(&Transcript::new("Reply with one word.", "Say hello."))
            .await
            .unwrap();
        assert!(!reply.is_empty());
    }
}
