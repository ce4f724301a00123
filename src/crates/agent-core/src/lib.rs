//! # agent-core - Response Interpretation for LLM-Driven Agents
//!
//! The building blocks every agent in this workspace shares. An LLM is
//! treated as an opaque text-completion capability ([`LlmClient`]); this
//! crate turns its free-form replies into something a program can act on:
//!
//! - **[Structured extraction](extract)** - recover the first JSON object
//!   embedded in untrusted model output, or `None`
//! - **[Prompt assembly](prompt)** - role-keyed templates with `{placeholder}`
//!   slots, rendered into a fixed `[system, user]` [`Transcript`]
//! - **[Capability schemas](schema)** - explicit function specs, an
//!   order-preserving registry, and a deterministic JSON description of it
//!
//! Components that actually call a model (function dispatch, grounded
//! answering, the online search pipeline) live in the `agents` crate.
//!
//! # Quick Start
//!
//! ```rust
//! use agent_core::{extract_field, PromptRole, PromptTemplate, BuiltinTemplates, SystemPrompt};
//!
//! // Assemble the prompt sent to the model
//! let template = PromptTemplate::from_store(&BuiltinTemplates, PromptRole::OnlineSearcher)?;
//! let system = SystemPrompt::render(&template, &[("additional_instructions", "")])?;
//! let transcript = system.transcript("What is the capital of France?");
//! assert_eq!(transcript.messages().len(), 2);
//!
//! // Interpret whatever came back
//! let reply = "Sure thing!\n{\"search_query\": \"capital of France\"}";
//! assert_eq!(extract_field(reply, "search_query").as_deref(), Some("capital of France"));
//! # Ok::<(), agent_core::CoreError>(())
//! ```
//!
//! # Module Organization
//!
//! - **[`messages`]** - [`Role`], [`Message`] and [`Transcript`]
//! - **[`llm`]** - the [`LlmClient`] trait
//! - **[`extract`]** - [`extract_json`] and [`extract_field`]
//! - **[`prompt`]** - template stores, [`PromptTemplate`] and [`SystemPrompt`]
//! - **[`schema`]** - [`FunctionSpec`], [`FunctionRegistry`] and [`CapabilitySchema`]
//! - **[`error`]** - [`CoreError`] and the crate [`Result`] alias

pub mod error;
pub mod extract;
pub mod llm;
pub mod messages;
pub mod prompt;
pub mod schema;

pub use error::{CoreError, Result};
pub use extract::{extract_field, extract_json, StructuredObject};
pub use llm::LlmClient;
pub use messages::{Message, Role, Transcript};
pub use prompt::{
    BuiltinTemplates, PromptRole, PromptTemplate, SystemPrompt, TemplateStore, YamlTemplateStore,
};
pub use schema::{
    CapabilitySchema, FunctionArgs, FunctionFuture, FunctionHandler, FunctionRegistry,
    FunctionSpec, ParamSpec, ParamType,
};
