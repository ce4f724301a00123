//! Function Dispatcher - Natural Language to Function Calls
//!
//! [`FunctionCaller`] owns a [`FunctionRegistry`] and the
//! [`CapabilitySchema`] generated from it. Given a request it asks the
//! model, once, to pick a function and fill in its parameters, then checks
//! the reply against the registry.
//!
//! # Resolution
//!
//! ```text
//! request
//!    │
//!    ↓
//! [system prompt + schema, request] ──ask──→ raw reply
//!    │
//!    ↓
//! extract_json ──None──────────────────────→ Failed(NoStructuredResponse)
//!    │
//!    ↓
//! "function": string, "parameters": object ─no─→ Failed(MalformedDecision)
//!    │
//!    ↓
//! registry lookup ──miss───────────────────→ Failed(UnknownFunction)
//!    │
//!    ↓
//! Resolved(DispatchDecision)
//! ```
//!
//! Failures are values, not errors: each carries the transcript and the raw
//! reply so the exchange can be inspected, and each is logged with
//! `tracing::warn!`. Only a failing LLM client produces an `Err`.
//!
//! # Example
//!
//! ```rust,ignore
//! use agents::FunctionCaller;
//! use agent_core::{FunctionSpec, ParamType};
//! use serde_json::json;
//!
//! let weather = FunctionSpec::new("get_weather", |args| async move {
//!     Ok(json!(format!("Sunny in {}", args["city"])))
//! })
//! .with_description("Get the current weather for a city")
//! .with_param("city", ParamType::String, "Name of the city");
//!
//! let caller = FunctionCaller::builder()
//!     .with_llm(llm)
//!     .with_function(weather)
//!     .build()?;
//!
//! if let Some(decision) = caller.resolve("What's the weather in Paris?").await?.decision() {
//!     let output = decision.invoke().await?;
//! }
//! ```

use agent_core::{
    extract_json, BuiltinTemplates, CapabilitySchema, CoreError, FunctionRegistry, FunctionSpec,
    LlmClient, PromptRole, PromptTemplate, Result, StructuredObject, SystemPrompt, TemplateStore,
    Transcript,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a request could not be resolved to a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The reply contained no JSON object
    NoStructuredResponse,

    /// Required keys were absent or had the wrong type
    MalformedDecision { missing: Vec<String> },

    /// The named function is not registered
    UnknownFunction { name: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoStructuredResponse => {
                write!(f, "LLM reply contained no JSON object")
            }
            FailureReason::MalformedDecision { missing } => {
                write!(
                    f,
                    "LLM did not respond with a function and parameters (missing: {})",
                    missing.join(", ")
                )
            }
            FailureReason::UnknownFunction { name } => {
                write!(f, "{} is not a registered function", name)
            }
        }
    }
}

/// A resolved function call
#[derive(Debug, Clone)]
pub struct DispatchDecision {
    /// The registered function the model picked
    pub function: FunctionSpec,

    /// Arguments exactly as the model gave them
    pub parameters: StructuredObject,

    /// Messages sent to the model
    pub transcript: Transcript,

    /// The model's unmodified reply
    pub raw_response: String,
}

impl DispatchDecision {
    /// Call the resolved function with the model's arguments
    pub async fn invoke(&self) -> Result<Value> {
        self.function.call(self.parameters.clone()).await
    }
}

/// A request that could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchFailure {
    pub reason: FailureReason,
    pub transcript: Transcript,
    pub raw_response: String,
}

/// Outcome of [`FunctionCaller::resolve`]
#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved(DispatchDecision),
    Failed(DispatchFailure),
}

impl Resolution {
    /// The decision, if resolution succeeded
    pub fn decision(&self) -> Option<&DispatchDecision> {
        match self {
            Resolution::Resolved(decision) => Some(decision),
            Resolution::Failed(_) => None,
        }
    }

    /// Consume into the decision, if resolution succeeded
    pub fn into_decision(self) -> Option<DispatchDecision> {
        match self {
            Resolution::Resolved(decision) => Some(decision),
            Resolution::Failed(_) => None,
        }
    }

    /// The failure, if resolution failed
    pub fn failure(&self) -> Option<&DispatchFailure> {
        match self {
            Resolution::Resolved(_) => None,
            Resolution::Failed(failure) => Some(failure),
        }
    }

    /// Whether a function was resolved
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    /// Messages sent to the model
    pub fn transcript(&self) -> &Transcript {
        match self {
            Resolution::Resolved(decision) => &decision.transcript,
            Resolution::Failed(failure) => &failure.transcript,
        }
    }

    /// The model's unmodified reply
    pub fn raw_response(&self) -> &str {
        match self {
            Resolution::Resolved(decision) => &decision.raw_response,
            Resolution::Failed(failure) => &failure.raw_response,
        }
    }
}

/// Resolves natural-language requests to registered functions
pub struct FunctionCaller {
    llm: Arc<dyn LlmClient>,
    registry: FunctionRegistry,
    schema: CapabilitySchema,
    system_prompt: SystemPrompt,
}

impl FunctionCaller {
    /// Start configuring a function caller
    pub fn builder() -> FunctionCallerBuilder {
        FunctionCallerBuilder::default()
    }

    /// Registered functions
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Schema embedded in the system prompt
    pub fn schema(&self) -> &CapabilitySchema {
        &self.schema
    }

    /// Rendered system prompt
    pub fn system_prompt(&self) -> &SystemPrompt {
        &self.system_prompt
    }

    /// The exact transcript `resolve` would send for `request`
    ///
    /// Useful for driving a model outside this crate.
    pub fn transcript_for(&self, request: &str) -> Transcript {
        self.system_prompt.transcript(request)
    }

    /// Ask the model to pick a function for `request`
    pub async fn resolve(&self, request: &str) -> Result<Resolution> {
        let transcript = self.transcript_for(request);
        let raw_response = self.llm.ask(&transcript).await?;
        debug!(response_len = raw_response.len(), "Function caller received reply");

        let resolution = match self.interpret(&raw_response) {
            Ok((function, parameters)) => {
                debug!(function = %function.name(), "Resolved function call");
                Resolution::Resolved(DispatchDecision {
                    function: function.clone(),
                    parameters,
                    transcript,
                    raw_response,
                })
            }
            Err(reason) => {
                warn!(%reason, "Function dispatch failed");
                Resolution::Failed(DispatchFailure {
                    reason,
                    transcript,
                    raw_response,
                })
            }
        };

        Ok(resolution)
    }

    fn interpret(
        &self,
        raw_response: &str,
    ) -> std::result::Result<(&FunctionSpec, StructuredObject), FailureReason> {
        let object = extract_json(raw_response).ok_or(FailureReason::NoStructuredResponse)?;

        let name = object.get("function").and_then(Value::as_str);
        let parameters = object.get("parameters").and_then(Value::as_object);

        let (name, parameters) = match (name, parameters) {
            (Some(name), Some(parameters)) => (name, parameters),
            (name, parameters) => {
                let mut missing = Vec::new();
                if name.is_none() {
                    missing.push("function".to_string());
                }
                if parameters.is_none() {
                    missing.push("parameters".to_string());
                }
                return Err(FailureReason::MalformedDecision { missing });
            }
        };

        let function = self
            .registry
            .get(name)
            .ok_or_else(|| FailureReason::UnknownFunction {
                name: name.to_string(),
            })?;

        Ok((function, parameters.clone()))
    }
}

impl fmt::Debug for FunctionCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCaller")
            .field("functions", &self.registry.names())
            .field("system_prompt", &self.system_prompt)
            .finish_non_exhaustive()
    }
}

/// Builder for [`FunctionCaller`]
pub struct FunctionCallerBuilder {
    llm: Option<Arc<dyn LlmClient>>,
    functions: Vec<FunctionSpec>,
    store: Arc<dyn TemplateStore>,
    custom_system_prompt: Option<String>,
    additional_instructions: String,
}

impl Default for FunctionCallerBuilder {
    fn default() -> Self {
        Self {
            llm: None,
            functions: Vec::new(),
            store: Arc::new(BuiltinTemplates),
            custom_system_prompt: None,
            additional_instructions: String::new(),
        }
    }
}

impl FunctionCallerBuilder {
    /// Set the LLM client (required)
    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Register a function
    pub fn with_function(mut self, function: FunctionSpec) -> Self {
        self.functions.push(function);
        self
    }

    /// Register several functions in order
    pub fn with_functions(mut self, functions: impl IntoIterator<Item = FunctionSpec>) -> Self {
        self.functions.extend(functions);
        self
    }

    /// Set the template store
    pub fn with_template_store(mut self, store: Arc<dyn TemplateStore>) -> Self {
        self.store = store;
        self
    }

    /// Replace the stored template. May use `{schema}` and `{additional_instructions}`.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_system_prompt = Some(prompt.into());
        self
    }

    /// Extra text for the `{additional_instructions}` slot
    pub fn with_additional_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.additional_instructions = instructions.into();
        self
    }

    /// Generate the schema and render the system prompt
    pub fn build(self) -> Result<FunctionCaller> {
        let llm = self
            .llm
            .ok_or_else(|| CoreError::Config("FunctionCaller requires an LLM client".to_string()))?;

        let registry = FunctionRegistry::from_specs(self.functions);
        let schema = CapabilitySchema::generate(registry.specs());

        let template = PromptTemplate::custom_or_store(
            self.custom_system_prompt,
            self.store.as_ref(),
            PromptRole::FunctionCaller,
        )?;
        let system_prompt = SystemPrompt::render(
            &template,
            &[
                ("schema", schema.as_str()),
                ("additional_instructions", self.additional_instructions.as_str()),
            ],
        )?;

        Ok(FunctionCaller {
            llm,
            registry,
            schema,
            system_prompt,
        })
    }
}
