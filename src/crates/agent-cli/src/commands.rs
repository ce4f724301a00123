//! Subcommand implementations
//!
//! Each command builds one agent over the session's client and template
//! store and returns the text to print.

use crate::config::AppConfig;
use agent_core::{
    BuiltinTemplates, FunctionSpec, LlmClient, ParamSpec, PromptRole, TemplateStore,
    YamlTemplateStore,
};
use agents::{Agent, DataExtractor, DocumentAgent, FunctionCaller, Resolution};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// A client, a template store and the shared additional instructions
#[derive(Clone)]
pub struct Session {
    llm: Arc<dyn LlmClient>,
    store: Arc<dyn TemplateStore>,
    additional_instructions: String,
}

impl Session {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        store: Arc<dyn TemplateStore>,
        additional_instructions: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            store,
            additional_instructions: additional_instructions.into(),
        }
    }

    /// Session over `llm` using the config's prompt settings
    pub fn from_config(config: &AppConfig, llm: Arc<dyn LlmClient>) -> Result<Self> {
        Ok(Self::new(
            llm,
            template_store(config)?,
            config.prompts.additional_instructions.clone(),
        ))
    }

    /// Answer a free-form prompt, optionally with a custom system prompt
    pub async fn ask(&self, prompt: &str, system: Option<String>) -> Result<String> {
        let mut builder = Agent::builder()
            .with_llm(self.llm.clone())
            .with_template_store(self.store.clone())
            .with_role(PromptRole::GenericResponder)
            .with_additional_instructions(self.additional_instructions.as_str());
        if let Some(system) = system {
            builder = builder.with_system_prompt(system);
        }

        let agent = builder.build()?;
        Ok(agent.ask(prompt).await?)
    }

    /// Answer `question` from the given documents
    pub async fn read(&self, question: &str, documents: &[PathBuf]) -> Result<String> {
        if documents.is_empty() {
            return Err(anyhow!("at least one document is required"));
        }

        let agent = DocumentAgent::builder()
            .with_llm(self.llm.clone())
            .with_template_store(self.store.clone())
            .with_additional_instructions(self.additional_instructions.as_str())
            .build()?;

        debug!(documents = documents.len(), "Answering from documents");
        Ok(agent.ask_documents(question, documents).await?)
    }

    /// Extract `keys` from `information`
    ///
    /// Returns the reply as-is when `raw` is set, otherwise the extracted
    /// object pretty-printed.
    pub async fn extract(&self, information: &str, keys: &[String], raw: bool) -> Result<String> {
        let extractor = DataExtractor::builder()
            .with_llm(self.llm.clone())
            .with_template_store(self.store.clone())
            .with_additional_instructions(self.additional_instructions.as_str())
            .build()?;
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();

        if raw {
            return Ok(extractor.ask(information, &keys).await?);
        }

        match extractor.extract(information, &keys).await? {
            Some(object) => Ok(serde_json::to_string_pretty(&Value::Object(object))?),
            None => Err(anyhow!("the model's reply contained no JSON object")),
        }
    }

    /// Pick a function for `request` without invoking it
    pub async fn resolve(&self, request: &str, functions: Vec<FunctionSpec>) -> Result<Resolution> {
        let caller = FunctionCaller::builder()
            .with_llm(self.llm.clone())
            .with_template_store(self.store.clone())
            .with_functions(functions)
            .with_additional_instructions(self.additional_instructions.as_str())
            .build()?;

        let resolution = caller.resolve(request).await?;
        info!(resolved = resolution.is_resolved(), "Request resolved");
        Ok(resolution)
    }
}

/// Template store named by `[prompts] file`, or the built-in templates
pub fn template_store(config: &AppConfig) -> Result<Arc<dyn TemplateStore>> {
    match config.prompts.file {
        Some(ref file) => {
            let store = YamlTemplateStore::from_path(file)
                .with_context(|| format!("Failed to load prompt templates from {}", file))?;
            debug!(path = %file, roles = ?store.roles(), "Loaded prompt templates");
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(BuiltinTemplates)),
    }
}

/// A function as declared in a functions file
#[derive(Debug, Deserialize)]
struct FunctionDecl {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Vec<ParamSpec>,
}

/// Parse a JSON array of function declarations
///
/// Uses the same shape as the capability schema. The handlers echo their
/// arguments back, since the CLI only reports what the model chose.
///
/// ```json
/// [{"name": "get_weather", "description": "Weather for a city",
///   "parameters": [{"name": "city", "type": "string"}]}]
/// ```
pub fn parse_functions(content: &str) -> Result<Vec<FunctionSpec>> {
    let decls: Vec<FunctionDecl> =
        serde_json::from_str(content).context("Failed to parse function declarations")?;

    Ok(decls
        .into_iter()
        .map(|decl| {
            let mut spec = FunctionSpec::new(decl.name, |args| async move { Ok(Value::Object(args)) });
            if let Some(description) = decl.description {
                spec = spec.with_description(description);
            }
            decl.parameters
                .into_iter()
                .fold(spec, |spec, param| spec.with_param_spec(param))
        })
        .collect())
}

/// JSON report of a resolution
pub fn resolution_json(resolution: &Resolution) -> Value {
    match resolution {
        Resolution::Resolved(decision) => json!({
            "resolved": true,
            "function": decision.function.name(),
            "parameters": decision.parameters,
        }),
        Resolution::Failed(failure) => json!({
            "resolved": false,
            "reason": failure.reason,
            "raw_response": failure.raw_response,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{ParamType, Transcript};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with a fixed string and records what it was sent
    struct Canned {
        reply: String,
        sent: Mutex<Vec<Transcript>>,
    }

    impl Canned {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn last(&self) -> Transcript {
            self.sent.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl LlmClient for Canned {
        async fn ask(&self, transcript: &Transcript) -> agent_core::Result<String> {
            self.sent.lock().unwrap().push(transcript.clone());
            Ok(self.reply.clone())
        }
    }

    fn session(llm: Arc<Canned>) -> Session {
        Session::new(llm, Arc::new(BuiltinTemplates), "Be brief.")
    }

    #[tokio::test]
    async fn test_ask_uses_additional_instructions() {
        let llm = Canned::new("Hi.");
        let reply = session(llm.clone()).ask("Hello", None).await.unwrap();

        assert_eq!(reply, "Hi.");
        assert!(llm.last().system().content().contains("Be brief."));
        assert_eq!(llm.last().user().content(), "Hello");
    }

    #[tokio::test]
    async fn test_ask_with_custom_system_prompt() {
        let llm = Canned::new("Arr.");
        session(llm.clone())
            .ask("Hello", Some("You are a pirate. {additional_instructions}".to_string()))
            .await
            .unwrap();

        assert_eq!(llm.last().system().content(), "You are a pirate. Be brief.");
    }

    #[tokio::test]
    async fn test_read_requires_documents() {
        let err = session(Canned::new("x")).read("Q", &[]).await.unwrap_err();
        assert!(err.to_string().contains("document"));
    }

    #[tokio::test]
    async fn test_extract_pretty_prints_object() {
        let llm = Canned::new(r#"Here: {"name": "Ada", "year": 1815}"#);
        let keys = vec!["name".to_string(), "year".to_string()];
        let out = session(llm.clone())
            .extract("Ada Lovelace, born 1815", &keys, false)
            .await
            .unwrap();

        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!({"name": "Ada", "year": 1815}));
        assert_eq!(llm.last().user().content(), "Extract the following fields: name, year");
    }

    #[tokio::test]
    async fn test_extract_without_json_fails_unless_raw() {
        let llm = Canned::new("I could not find anything.");
        let keys = vec!["name".to_string()];

        assert!(session(llm.clone()).extract("...", &keys, false).await.is_err());
        assert_eq!(
            session(llm).extract("...", &keys, true).await.unwrap(),
            "I could not find anything."
        );
    }

    #[test]
    fn test_parse_functions() {
        let functions = parse_functions(
            r#"[
                {"name": "get_weather", "description": "Weather for a city",
                 "parameters": [{"name": "city", "type": "string", "description": "City"}]},
                {"name": "ping"}
            ]"#,
        )
        .unwrap();

        assert_eq!(functions.len(), 2);
        assert_eq!(functions[0].description(), Some("Weather for a city"));
        assert_eq!(functions[0].parameters()[0].type_hint, Some(ParamType::String));
        assert!(functions[1].parameters().is_empty());
        assert!(parse_functions("{\"name\": \"x\"}").is_err());
    }

    #[tokio::test]
    async fn test_resolve_reports_decision() {
        let llm = Canned::new(r#"{"function": "get_weather", "parameters": {"city": "Lima"}}"#);
        let functions =
            parse_functions(r#"[{"name": "get_weather", "parameters": [{"name": "city"}]}]"#).unwrap();

        let resolution = session(llm).resolve("Weather in Lima?", functions).await.unwrap();
        assert_eq!(
            resolution_json(&resolution),
            json!({"resolved": true, "function": "get_weather", "parameters": {"city": "Lima"}})
        );
    }

    #[tokio::test]
    async fn test_resolve_reports_failure() {
        let llm = Canned::new(r#"{"function": "book_flight", "parameters": {}}"#);
        let functions = parse_functions(r#"[{"name": "get_weather"}]"#).unwrap();

        let resolution = session(llm).resolve("Fly me", functions).await.unwrap();
        let report = resolution_json(&resolution);
        assert_eq!(report["resolved"], false);
        assert_eq!(report["reason"]["kind"], "unknown_function");
        assert_eq!(report["reason"]["name"], "book_flight");
    }
}
