//! LLM provider implementations.
//!
//! Concrete [`LlmClient`](agent_core::LlmClient) implementations for the
//! agents in this workspace.
//!
//! # Local Providers
//!
//! - **Ollama** - [`local::OllamaClient`], talking to `/api/chat`
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::{LocalLlmConfig, OllamaClient};
//! use agent_core::{LlmClient, Transcript};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LocalLlmConfig::from_env()?.with_temperature(0.0);
//!     let client: Arc<dyn LlmClient> = Arc::new(OllamaClient::new(config)?);
//!
//!     let reply = client
//!         .ask(&Transcript::new("You are a helpful assistant.", "What is Rust?"))
//!         .await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```
//!
//! # Errors
//!
//! Provider methods return [`LlmError`]. Through the `LlmClient` trait the
//! error becomes [`CoreError::Client`](agent_core::CoreError::Client), after
//! transient failures have been retried up to
//! [`LocalLlmConfig::max_retries`] times.

pub mod config;
pub mod error;

#[cfg(feature = "local")]
pub mod local;

pub use config::LocalLlmConfig;
pub use error::{LlmError, Result};

#[cfg(feature = "local")]
pub use local::{ollama::ModelInfo, OllamaClient};
