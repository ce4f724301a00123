//! # agents - LLM-Driven Agents
//!
//! Higher-level behaviors built on [`agent_core`]. Every agent is bound to
//! one [`LlmClient`](agent_core::LlmClient) at build time and makes a fixed,
//! short sequence of calls per request:
//!
//! - **[`FunctionCaller`]** - resolves a request to one registered function
//!   and its arguments
//! - **[`OnlineAgent`]** - formulates a query, searches, picks a source,
//!   reads it and answers
//! - **[`DocumentAgent`]** - answers from the text of local documents
//! - **[`DataExtractor`]** - pulls named fields out of free text
//! - **[`Agent`]** - a plain responder with a fixed system prompt
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use agents::{FunctionCaller, Resolution};
//! use agent_core::{FunctionSpec, ParamType};
//! use std::sync::Arc;
//!
//! let caller = FunctionCaller::builder()
//!     .with_llm(Arc::new(ollama))
//!     .with_function(
//!         FunctionSpec::new("get_weather", get_weather)
//!             .with_description("Get the current weather for a city")
//!             .with_param("city", ParamType::String, "Name of the city"),
//!     )
//!     .build()?;
//!
//! match caller.resolve("What's the weather in Paris?").await? {
//!     Resolution::Resolved(decision) => println!("{}", decision.invoke().await?),
//!     Resolution::Failed(failure) => eprintln!("{}", failure.reason),
//! }
//! ```
//!
//! # Failure Model
//!
//! Malformed model output never becomes an `Err`. The dispatcher returns
//! [`Resolution::Failed`] and the online agent returns
//! [`SearchOutcome::Aborted`], both carrying a reason code and the raw
//! reply, and both logged at `warn`. An `Err` means a misconfigured builder
//! or a failing client or collaborator.
//!
//! # Module Organization
//!
//! - **[`dispatcher`]** - [`FunctionCaller`] and its outcome types
//! - **[`online`]** - [`OnlineAgent`] and [`SearchOutcome`]
//! - **[`responder`]** - [`GroundedResponder`], [`Agent`], [`DocumentAgent`]
//! - **[`data_extractor`]** - [`DataExtractor`]
//! - **[`collaborators`]** - search, webpage and document reader traits

pub mod collaborators;
pub mod data_extractor;
pub mod dispatcher;
pub mod online;
pub mod responder;

pub use collaborators::{DocumentReader, PlainTextReader, WebSearch, WebpageReader};
pub use data_extractor::{DataExtractor, DataExtractorBuilder};
pub use dispatcher::{
    DispatchDecision, DispatchFailure, FailureReason, FunctionCaller, FunctionCallerBuilder,
    Resolution,
};
pub use online::{
    AbortReason, OnlineAgent, OnlineAgentBuilder, PipelineFailure, SearchOutcome, Stage,
    ANSWER_PREFIX,
};
pub use responder::{Agent, AgentBuilder, DocumentAgent, DocumentAgentBuilder, GroundedResponder};
