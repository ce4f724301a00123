//! LLM client contract.
//!
//! The core is an orchestration layer, not an LLM client library. It needs
//! exactly one capability from a model: turn a [`Transcript`] into text.
//! Providers (see the `llm` crate for Ollama) implement [`LlmClient`];
//! components hold it as `Arc<dyn LlmClient>`.
//!
//! # Example Implementation
//!
//! ```rust
//! use agent_core::{LlmClient, Result, Transcript};
//! use async_trait::async_trait;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl LlmClient for Echo {
//!     async fn ask(&self, transcript: &Transcript) -> Result<String> {
//!         Ok(transcript.user().content().to_string())
//!     }
//! }
//! ```

use crate::error::Result;
use crate::messages::Transcript;
use async_trait::async_trait;
use std::sync::Arc;

/// A text-completion capability.
///
/// Transport errors, retries and timeouts are the implementation's concern;
/// callers in this workspace call `ask` exactly once per stage and propagate
/// any `Err` unchanged.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one transcript and return the model's raw reply
    async fn ask(&self, transcript: &Transcript) -> Result<String>;
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    async fn ask(&self, transcript: &Transcript) -> Result<String> {
        (**self).ask(transcript).await
    }
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Box<T> {
    async fn ask(&self, transcript: &Transcript) -> Result<String> {
        (**self).ask(transcript).await
    }
}
