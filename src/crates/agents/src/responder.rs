//! Single-call responders.
//!
//! - [`GroundedResponder`] answers a question from context text injected
//!   into its system prompt.
//! - [`Agent`] answers free-form prompts under a fixed system prompt.
//! - [`DocumentAgent`] reads documents through a [`DocumentReader`] and
//!   answers from their contents.
//!
//! None of these parse the model's reply; it is returned as-is.

use crate::collaborators::{DocumentReader, PlainTextReader};
use agent_core::{
    BuiltinTemplates, CoreError, LlmClient, PromptRole, PromptTemplate, Result, SystemPrompt,
    TemplateStore, Transcript,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const ADDITIONAL_INSTRUCTIONS: &str = "additional_instructions";

/// Answers questions from context injected into the system prompt
///
/// The template must reference no placeholders other than the context key
/// and `additional_instructions`; this is checked by [`GroundedResponder::new`].
#[derive(Clone)]
pub struct GroundedResponder {
    llm: Arc<dyn LlmClient>,
    template: PromptTemplate,
    context_key: String,
    additional_instructions: String,
}

impl GroundedResponder {
    /// Create a responder that injects context under `context_key`
    pub fn new(
        llm: Arc<dyn LlmClient>,
        template: PromptTemplate,
        context_key: impl Into<String>,
        additional_instructions: impl Into<String>,
    ) -> Result<Self> {
        let context_key = context_key.into();
        template.ensure_resolvable(&[context_key.as_str(), ADDITIONAL_INSTRUCTIONS])?;

        Ok(Self {
            llm,
            template,
            context_key,
            additional_instructions: additional_instructions.into(),
        })
    }

    /// Placeholder the context is injected under
    pub fn context_key(&self) -> &str {
        &self.context_key
    }

    /// The exact transcript `answer` would send
    pub fn transcript_for(&self, question: &str, context: &str) -> Result<Transcript> {
        let system = SystemPrompt::render(
            &self.template,
            &[
                (self.context_key.as_str(), context),
                (ADDITIONAL_INSTRUCTIONS, self.additional_instructions.as_str()),
            ],
        )?;
        Ok(system.transcript(question))
    }

    /// Answer `question` from `context` with one LLM call
    pub async fn answer(&self, question: &str, context: &str) -> Result<String> {
        let transcript = self.transcript_for(question, context)?;
        debug!(
            template = %self.template.name(),
            context_len = context.len(),
            "Asking grounded question"
        );
        self.llm.ask(&transcript).await
    }
}

impl fmt::Debug for GroundedResponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroundedResponder")
            .field("template", &self.template.name())
            .field("context_key", &self.context_key)
            .finish_non_exhaustive()
    }
}

/// A responder with a fixed system prompt
#[derive(Clone)]
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    system_prompt: SystemPrompt,
}

impl Agent {
    /// Start configuring an agent
    pub fn builder() -> AgentBuilder {
        AgentBuilder::default()
    }

    /// Rendered system prompt
    pub fn system_prompt(&self) -> &SystemPrompt {
        &self.system_prompt
    }

    /// The exact transcript `ask` would send
    pub fn transcript_for(&self, prompt: &str) -> Transcript {
        self.system_prompt.transcript(prompt)
    }

    /// Send `prompt` and return the reply
    pub async fn ask(&self, prompt: &str) -> Result<String> {
        self.llm.ask(&self.transcript_for(prompt)).await
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("system_prompt", &self.system_prompt)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Agent`]
///
/// Needs a client and either a role or a custom system prompt. The chosen
/// template may only reference `{additional_instructions}`.
pub struct AgentBuilder {
    llm: Option<Arc<dyn LlmClient>>,
    role: Option<PromptRole>,
    store: Arc<dyn TemplateStore>,
    custom_system_prompt: Option<String>,
    additional_instructions: String,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self {
            llm: None,
            role: None,
            store: Arc::new(BuiltinTemplates),
            custom_system_prompt: None,
            additional_instructions: String::new(),
        }
    }
}

impl AgentBuilder {
    /// Set the LLM client (required)
    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Use the store's template for `role`
    pub fn with_role(mut self, role: PromptRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Set the template store
    pub fn with_template_store(mut self, store: Arc<dyn TemplateStore>) -> Self {
        self.store = store;
        self
    }

    /// Use `prompt` instead of a stored template
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_system_prompt = Some(prompt.into());
        self
    }

    /// Extra text for the `{additional_instructions}` slot
    pub fn with_additional_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.additional_instructions = instructions.into();
        self
    }

    /// Render the system prompt
    pub fn build(self) -> Result<Agent> {
        let llm = self
            .llm
            .ok_or_else(|| CoreError::Config("Agent requires an LLM client".to_string()))?;

        let template = match (self.custom_system_prompt, self.role) {
            (Some(text), _) => PromptTemplate::new("custom", text),
            (None, Some(role)) => PromptTemplate::from_store(self.store.as_ref(), role)?,
            (None, None) => {
                return Err(CoreError::Config(
                    "Agent requires a prompt role or a custom system prompt".to_string(),
                ))
            }
        };
        let system_prompt = SystemPrompt::render(
            &template,
            &[(ADDITIONAL_INSTRUCTIONS, self.additional_instructions.as_str())],
        )?;

        Ok(Agent { llm, system_prompt })
    }
}

/// Answers questions from the contents of documents
pub struct DocumentAgent {
    responder: GroundedResponder,
    reader: Arc<dyn DocumentReader>,
    documents: Vec<PathBuf>,
}

impl DocumentAgent {
    /// Start configuring a document agent
    pub fn builder() -> DocumentAgentBuilder {
        DocumentAgentBuilder::default()
    }

    /// Documents used by [`DocumentAgent::ask`]
    pub fn documents(&self) -> &[PathBuf] {
        &self.documents
    }

    /// Read `paths` and label each with its file name
    pub async fn documents_text(&self, paths: &[PathBuf]) -> Result<String> {
        let mut text = String::new();
        for path in paths {
            let contents = self.reader.read(path).await?;
            text.push_str(&format!(
                "Contents of document {} :\n{}\n\n",
                file_label(path),
                contents
            ));
        }
        Ok(text)
    }

    /// The exact transcript `ask_documents` would send
    pub async fn transcript_for(&self, question: &str, paths: &[PathBuf]) -> Result<Transcript> {
        let text = self.documents_text(paths).await?;
        self.responder.transcript_for(question, &text)
    }

    /// Answer from the configured documents
    pub async fn ask(&self, question: &str) -> Result<String> {
        self.ask_documents(question, &self.documents).await
    }

    /// Answer from `paths`
    pub async fn ask_documents(&self, question: &str, paths: &[PathBuf]) -> Result<String> {
        let text = self.documents_text(paths).await?;
        debug!(documents = paths.len(), "Answering from documents");
        self.responder.answer(question, &text).await
    }
}

impl fmt::Debug for DocumentAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentAgent")
            .field("responder", &self.responder)
            .field("documents", &self.documents)
            .finish_non_exhaustive()
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Builder for [`DocumentAgent`]
pub struct DocumentAgentBuilder {
    llm: Option<Arc<dyn LlmClient>>,
    reader: Arc<dyn DocumentReader>,
    documents: Vec<PathBuf>,
    store: Arc<dyn TemplateStore>,
    custom_system_prompt: Option<String>,
    additional_instructions: String,
}

impl Default for DocumentAgentBuilder {
    fn default() -> Self {
        Self {
            llm: None,
            reader: Arc::new(PlainTextReader),
            documents: Vec::new(),
            store: Arc::new(BuiltinTemplates),
            custom_system_prompt: None,
            additional_instructions: String::new(),
        }
    }
}

impl DocumentAgentBuilder {
    /// Set the LLM client (required)
    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Set the document reader (defaults to [`PlainTextReader`])
    pub fn with_reader(mut self, reader: Arc<dyn DocumentReader>) -> Self {
        self.reader = reader;
        self
    }

    /// Add a document used by [`DocumentAgent::ask`]
    pub fn with_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.documents.push(path.into());
        self
    }

    /// Set the template store
    pub fn with_template_store(mut self, store: Arc<dyn TemplateStore>) -> Self {
        self.store = store;
        self
    }

    /// Replace the stored template. May use `{documents}` and `{additional_instructions}`.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_system_prompt = Some(prompt.into());
        self
    }

    /// Extra text for the `{additional_instructions}` slot
    pub fn with_additional_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.additional_instructions = instructions.into();
        self
    }

    /// Validate the template and build the agent
    pub fn build(self) -> Result<DocumentAgent> {
        let llm = self
            .llm
            .ok_or_else(|| CoreError::Config("DocumentAgent requires an LLM client".to_string()))?;
        let template = PromptTemplate::custom_or_store(
            self.custom_system_prompt,
            self.store.as_ref(),
            PromptRole::DocumentReader,
        )?;
        let responder =
            GroundedResponder::new(llm, template, "documents", self.additional_instructions)?;

        Ok(DocumentAgent {
            responder,
            reader: self.reader,
            documents: self.documents,
        })
    }
}
