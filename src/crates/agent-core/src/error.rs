//! Error Types - Core Configuration and Boundary Errors
//!
//! Errors raised by the core fall into two groups:
//!
//! - **Configuration errors** - a component was built without an LLM client,
//!   a template role is unknown, or a template references a placeholder that
//!   was never supplied. These surface at build time.
//! - **Boundary errors** - the LLM client or an external collaborator
//!   (search, webpage reader, document reader) failed. These propagate
//!   unchanged; the core does not retry.
//!
//! Malformed model output is *not* an error. The extractor returns `None` and
//! the dispatcher and pipeline report tagged failure outcomes instead.
//!
//! # Example
//!
//! ```rust
//! use agent_core::{CoreError, Result};
//!
//! fn build() -> Result<()> {
//!     Err(CoreError::Config("no LLM client provided".to_string()))
//! }
//!
//! match build() {
//!     Err(CoreError::Config(msg)) => assert!(msg.contains("LLM client")),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while building or running agent components
#[derive(Error, Debug)]
pub enum CoreError {
    /// Component misconfigured (missing client, missing required argument)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The template store has no template for the requested role
    #[error("Unknown prompt template: {0}")]
    UnknownTemplate(String),

    /// A template references a placeholder that no value was supplied for
    #[error("Template '{template}' references unresolved placeholder '{{{placeholder}}}'")]
    MissingPlaceholder {
        template: String,
        placeholder: String,
    },

    /// The LLM client failed to produce a completion
    #[error("LLM client error: {0}")]
    Client(String),

    /// An external collaborator (search, fetch, document read) failed
    #[error("Collaborator '{name}' failed: {error}")]
    Collaborator { name: String, error: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Template file could not be parsed
    #[error("Template store parsing failed: {0}")]
    TemplateParse(#[from] serde_yaml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Build a collaborator error from any displayable failure
    pub fn collaborator(name: impl Into<String>, error: impl std::fmt::Display) -> Self {
        CoreError::Collaborator {
            name: name.into(),
            error: error.to_string(),
        }
    }

    /// Whether this error indicates a programmer/configuration mistake
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CoreError::Config(_)
                | CoreError::UnknownTemplate(_)
                | CoreError::MissingPlaceholder { .. }
                | CoreError::TemplateParse(_)
        )
    }
}
