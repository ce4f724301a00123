//! Configuration for local LLM providers.

use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Upper bound on `max_retries`; backoff doubles per attempt.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Configuration for local LLM providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalLlmConfig {
    /// Base URL for the local LLM server, e.g. "http://localhost:11434".
    pub base_url: String,

    /// Model name/identifier.
    pub model: String,

    /// Request timeout duration.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Maximum retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Sampling temperature. Server default when unset.
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Ask the server to constrain replies to valid JSON.
    #[serde(default)]
    pub json_mode: bool,
}

impl LocalLlmConfig {
    /// Create a new local LLM configuration.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            temperature: None,
            json_mode: false,
        }
    }

    /// Read `OLLAMA_BASE_URL`, `OLLAMA_MODEL` and `OLLAMA_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("OLLAMA_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = lookup("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let mut config = Self::new(base_url, model);

        if let Some(raw) = lookup("OLLAMA_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                LlmError::ConfigError(format!("OLLAMA_TIMEOUT_SECS is not a number: {}", raw))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Constrain replies to JSON.
    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    /// Reject values the server would never accept.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(LlmError::ConfigError(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.model.trim().is_empty() {
            return Err(LlmError::ConfigError("model must not be empty".to_string()));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(LlmError::ConfigError(format!(
                "max_retries must be at most {}, got {}",
                MAX_RETRIES_LIMIT, self.max_retries
            )));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(LlmError::ConfigError(format!(
                    "temperature must be between 0 and 2, got {}",
                    t
                )));
            }
        }
        Ok(())
    }
}

impl Default for LocalLlmConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_MODEL)
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_max_retries() -> u32 {
    2
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_local_config_builder() {
        let config = LocalLlmConfig::new("http://localhost:11434", "llama3.1")
            .with_timeout(Duration::from_secs(30))
            .with_max_retries(5)
            .with_temperature(0.0)
            .with_json_mode(true);

        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "llama3.1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.temperature, Some(0.0));
        assert!(config.json_mode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = LocalLlmConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, LocalLlmConfig::default());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = LocalLlmConfig::from_lookup(lookup_from(&[
            ("OLLAMA_BASE_URL", "http://10.0.0.5:11434"),
            ("OLLAMA_MODEL", "mistral"),
            ("OLLAMA_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://10.0.0.5:11434");
        assert_eq!(config.model, "mistral");
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_from_lookup_rejects_bad_timeout() {
        let err = LocalLlmConfig::from_lookup(lookup_from(&[("OLLAMA_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("OLLAMA_TIMEOUT_SECS"));
    }

    #[test]
    fn test_validate() {
        assert!(LocalLlmConfig::new("localhost:11434", "m").validate().is_err());
        assert!(LocalLlmConfig::new(DEFAULT_BASE_URL, " ").validate().is_err());
        assert!(LocalLlmConfig::default()
            .with_temperature(3.5)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_bounds_max_retries() {
        let at_limit = LocalLlmConfig::default().with_max_retries(MAX_RETRIES_LIMIT);
        assert!(at_limit.validate().is_ok());

        let err = LocalLlmConfig::default()
            .with_max_retries(u32::MAX)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("max_retries"));
    }
}
