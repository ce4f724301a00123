//! Server status report for `agentctl status`

use anyhow::Result;
use llm::OllamaClient;
use serde::Serialize;
use std::fmt;
use std::time::Instant;

/// Whether the configured model can serve requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    /// Server reachable and the model is pulled
    Ready,
    /// Server reachable but the model is missing
    ModelMissing,
    /// Server not reachable
    Unreachable,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::ModelMissing => write!(f, "model missing"),
            Self::Unreachable => write!(f, "unreachable"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub base_url: String,
    pub model: String,
    pub status: ServerStatus,
    pub models: Vec<String>,
    pub response_time_ms: u64,
}

impl StatusReport {
    /// Probe the server behind `client`
    pub async fn check(client: &OllamaClient) -> Result<Self> {
        let start = Instant::now();
        let reachable = client.check_health().await?;

        let models: Vec<String> = if reachable {
            client
                .list_models()
                .await?
                .into_iter()
                .map(|model| model.name)
                .collect()
        } else {
            Vec::new()
        };

        let status = if !reachable {
            ServerStatus::Unreachable
        } else if models.iter().any(|name| model_matches(name, client.model())) {
            ServerStatus::Ready
        } else {
            ServerStatus::ModelMissing
        };

        Ok(Self {
            base_url: client.config().base_url.clone(),
            model: client.model().to_string(),
            status,
            models,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Plain-text rendering
    pub fn to_text(&self) -> String {
        let mut out = format!(
            "Server:  {}\nModel:   {}\nStatus:  {}\nTime:    {}ms\n",
            self.base_url, self.model, self.status, self.response_time_ms
        );
        if !self.models.is_empty() {
            out.push_str("\nAvailable models:\n");
            for name in &self.models {
                out.push_str(&format!("  {}\n", name));
            }
        }
        out
    }
}

/// `llama3.1` matches `llama3.1:latest`; an explicit tag must match exactly
fn model_matches(available: &str, wanted: &str) -> bool {
    available == wanted || (!wanted.contains(':') && available == format!("{}:latest", wanted))
}
