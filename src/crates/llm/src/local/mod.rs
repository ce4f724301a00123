//! Local LLM providers.
//!
//! Providers for model servers on localhost or the local network. They need
//! no API key.
//!
//! # Providers
//!
//! - **Ollama** - local model runner with wide model support

pub mod ollama;

pub use ollama::OllamaClient;
