//! Function specifications, the registry, and capability schema generation.
//!
//! Functions are declared explicitly: a name, an optional description, an
//! ordered parameter list and an async handler. Nothing is inferred by
//! reflection, so the schema an LLM sees is exactly what the caller wrote.
//!
//! # Example
//!
//! ```rust
//! use agent_core::schema::{CapabilitySchema, FunctionRegistry, FunctionSpec, ParamType};
//! use serde_json::json;
//!
//! let weather = FunctionSpec::new("get_weather", |args| async move {
//!     let city = args.get("city").and_then(|c| c.as_str()).unwrap_or("unknown");
//!     Ok(json!(format!("Sunny in {}", city)))
//! })
//! .with_description("Get the current weather for a city")
//! .with_param("city", ParamType::String, "Name of the city");
//!
//! let registry = FunctionRegistry::from_specs(vec![weather]);
//! let schema = CapabilitySchema::generate(registry.specs());
//!
//! assert!(schema.as_str().contains("\"get_weather\""));
//! assert_eq!(schema, CapabilitySchema::generate(registry.specs()));
//! ```
//!
//! # Schema Format
//!
//! Pretty-printed JSON, one entry per function in registry order:
//!
//! ```json
//! [
//!   {
//!     "name": "get_weather",
//!     "description": "Get the current weather for a city",
//!     "parameters": [
//!       { "name": "city", "type": "string", "description": "Name of the city" }
//!     ]
//!   }
//! ]
//! ```
//!
//! Missing descriptions or types serialize as `null`. They are allowed but
//! give the model less to go on.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Arguments passed to a function handler
pub type FunctionArgs = Map<String, Value>;

/// Future returned by a function handler
pub type FunctionFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Async function handler
pub type FunctionHandler = Arc<dyn Fn(FunctionArgs) -> FunctionFuture + Send + Sync>;

/// Declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        };
        f.write_str(name)
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name as the model must spell it
    pub name: String,

    /// Declared type, if any
    #[serde(rename = "type")]
    pub type_hint: Option<ParamType>,

    /// What the parameter means
    pub description: Option<String>,
}

impl ParamSpec {
    /// A parameter with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            description: None,
        }
    }
}

/// A function the dispatcher may select
#[derive(Clone)]
pub struct FunctionSpec {
    name: String,
    description: Option<String>,
    parameters: Vec<ParamSpec>,
    handler: FunctionHandler,
}

impl FunctionSpec {
    /// Create a function spec from a name and an async handler
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(FunctionArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: None,
            parameters: Vec::new(),
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }

    /// Create a function spec from an already boxed handler
    pub fn from_handler(name: impl Into<String>, handler: FunctionHandler) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters: Vec::new(),
            handler,
        }
    }

    /// Set the description shown to the model
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a typed, described parameter
    pub fn with_param(
        mut self,
        name: impl Into<String>,
        type_hint: ParamType,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push(ParamSpec {
            name: name.into(),
            type_hint: Some(type_hint),
            description: Some(description.into()),
        });
        self
    }

    /// Append an arbitrary parameter spec
    pub fn with_param_spec(mut self, param: ParamSpec) -> Self {
        self.parameters.push(param);
        self
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description, if one was given
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared parameters in order
    pub fn parameters(&self) -> &[ParamSpec] {
        &self.parameters
    }

    /// Invoke the handler
    pub async fn call(&self, args: FunctionArgs) -> Result<Value> {
        (self.handler)(args).await
    }
}

impl fmt::Debug for FunctionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("handler", &"<function>")
            .finish()
    }
}

/// Name-keyed, order-preserving set of functions
///
/// Registering a name twice replaces the earlier spec in place: the last
/// registration wins and keeps the first one's position.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    specs: Vec<FunctionSpec>,
    index: HashMap<String, usize>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from specs in order
    pub fn from_specs(specs: impl IntoIterator<Item = FunctionSpec>) -> Self {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(spec);
        }
        registry
    }

    /// Register a function, replacing any earlier one with the same name
    pub fn register(&mut self, spec: FunctionSpec) {
        match self.index.get(spec.name()) {
            Some(&slot) => {
                tracing::debug!(function = %spec.name(), "Replacing previously registered function");
                self.specs[slot] = spec;
            }
            None => {
                self.index.insert(spec.name().to_string(), self.specs.len());
                self.specs.push(spec);
            }
        }
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionSpec> {
        self.index.get(name).map(|&slot| &self.specs[slot])
    }

    /// Check whether a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered specs in order
    pub fn specs(&self) -> &[FunctionSpec] {
        &self.specs
    }

    /// Registered names in order
    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(FunctionSpec::name).collect()
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Call a registered function by name
    pub async fn call(&self, name: &str, args: FunctionArgs) -> Result<Value> {
        let spec = self.get(name).ok_or_else(|| {
            CoreError::Config(format!(
                "Function '{}' not registered. Available functions: {}",
                name,
                self.names().join(", ")
            ))
        })?;
        spec.call(args).await
    }
}

#[derive(Serialize)]
struct SchemaEntry<'a> {
    name: &'a str,
    description: Option<&'a str>,
    parameters: &'a [ParamSpec],
}

/// Prompt-ready description of a set of functions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CapabilitySchema(String);

impl CapabilitySchema {
    /// Describe `functions` in the order given
    pub fn generate(functions: &[FunctionSpec]) -> Self {
        let entries: Vec<SchemaEntry<'_>> = functions
            .iter()
            .map(|spec| SchemaEntry {
                name: spec.name(),
                description: spec.description(),
                parameters: spec.parameters(),
            })
            .collect();

        // Only strings, options and plain structs: serialization cannot fail
        let text = serde_json::to_string_pretty(&entries).unwrap_or_default();
        Self(text)
    }

    /// Schema text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapabilitySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
