//! Keyed data extraction from free text.
//!
//! [`DataExtractor`] puts the information into the `data-extractor` system
//! prompt and asks for the listed keys. [`DataExtractor::ask`] returns the
//! raw reply; [`DataExtractor::extract`] runs it through
//! [`extract_json`](agent_core::extract_json).
//!
//! JSON mode and temperature belong to the client, not the extractor. For
//! replies constrained to JSON, hand the builder a client configured with
//! `LocalLlmConfig::with_json_mode(true)` and `with_temperature(0.0)`;
//! `agentctl extract` does this unless `--raw` is given.

use crate::responder::GroundedResponder;
use agent_core::{
    extract_json, BuiltinTemplates, CoreError, LlmClient, PromptRole, PromptTemplate, Result,
    StructuredObject, TemplateStore, Transcript,
};
use std::sync::Arc;
use tracing::warn;

/// Extracts named fields from information text
#[derive(Debug, Clone)]
pub struct DataExtractor {
    responder: GroundedResponder,
}

impl DataExtractor {
    /// Start configuring a data extractor
    pub fn builder() -> DataExtractorBuilder {
        DataExtractorBuilder::default()
    }

    /// The exact transcript `ask` would send
    pub fn transcript_for(&self, information: &str, keys: &[&str]) -> Result<Transcript> {
        self.responder.transcript_for(&request_for(keys), information)
    }

    /// Ask for `keys` and return the raw reply
    pub async fn ask(&self, information: &str, keys: &[&str]) -> Result<String> {
        self.responder.answer(&request_for(keys), information).await
    }

    /// Ask for `keys` and parse the reply
    ///
    /// `Ok(None)` when the reply holds no JSON object.
    pub async fn extract(&self, information: &str, keys: &[&str]) -> Result<Option<StructuredObject>> {
        let reply = self.ask(information, keys).await?;
        let object = extract_json(&reply);
        if object.is_none() {
            warn!(keys = ?keys, "Data extractor reply contained no JSON object");
        }
        Ok(object)
    }
}

fn request_for(keys: &[&str]) -> String {
    format!("Extract the following fields: {}", keys.join(", "))
}

/// Builder for [`DataExtractor`]
pub struct DataExtractorBuilder {
    llm: Option<Arc<dyn LlmClient>>,
    store: Arc<dyn TemplateStore>,
    custom_system_prompt: Option<String>,
    additional_instructions: String,
}

impl Default for DataExtractorBuilder {
    fn default() -> Self {
        Self {
            llm: None,
            store: Arc::new(BuiltinTemplates),
            custom_system_prompt: None,
            additional_instructions: String::new(),
        }
    }
}

impl DataExtractorBuilder {
    /// Set the LLM client (required)
    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Set the template store
    pub fn with_template_store(mut self, store: Arc<dyn TemplateStore>) -> Self {
        self.store = store;
        self
    }

    /// Replace the stored template. May use `{information}` and `{additional_instructions}`.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_system_prompt = Some(prompt.into());
        self
    }

    /// Extra text for the `{additional_instructions}` slot
    pub fn with_additional_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.additional_instructions = instructions.into();
        self
    }

    pub fn build(self) -> Result<DataExtractor> {
        let llm = self
            .llm
            .ok_or_else(|| CoreError::Config("DataExtractor requires an LLM client".to_string()))?;
        let template = PromptTemplate::custom_or_store(
            self.custom_system_prompt,
            self.store.as_ref(),
            PromptRole::DataExtractor,
        )?;
        let responder =
            GroundedResponder::new(llm, template, "information", self.additional_instructions)?;

        Ok(DataExtractor { responder })
    }
}
