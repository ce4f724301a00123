//! Online Agent - Answering Questions from the Web
//!
//! [`OnlineAgent`] answers a question in four sequential stages, each
//! consuming the previous stage's output:
//!
//! | Stage | Does | Yields |
//! |-------|------|--------|
//! | 1. Query formulation | asks the model for `{"search_query": ...}` | query |
//! | 2. Search | calls [`WebSearch`] | URLs, space-joined |
//! | 3. Source selection | asks the model for `{"url": ...}` | URL |
//! | 4. Synthesis | reads the page with [`WebpageReader`], asks the generic responder | answer |
//!
//! Stages 1 and 3 depend on the model producing usable JSON. When it does
//! not, the run stops with [`SearchOutcome::Aborted`] and no later stage is
//! invoked. Errors from the model or a collaborator propagate as `Err`.
//!
//! Stage 4 never aborts: an empty page still produces an answer, just a
//! poorly grounded one.

use crate::collaborators::{WebSearch, WebpageReader};
use crate::responder::Agent;
use agent_core::{
    extract_json, BuiltinTemplates, CoreError, LlmClient, PromptRole, PromptTemplate, Result,
    SystemPrompt, TemplateStore, Transcript,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Prefix the synthesized answer is instructed to start with
pub const ANSWER_PREFIX: &str = "Based on information from the internet, ";

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    QueryFormulation,
    Search,
    SourceSelection,
    Synthesis,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::QueryFormulation => "query formulation",
            Stage::Search => "search",
            Stage::SourceSelection => "source selection",
            Stage::Synthesis => "synthesis",
        };
        f.write_str(name)
    }
}

/// Why a stage could not produce its output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortReason {
    /// The reply contained no JSON object
    NoStructuredResponse,

    /// The object lacked the expected string field
    MissingField { field: String },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::NoStructuredResponse => write!(f, "LLM reply contained no JSON object"),
            AbortReason::MissingField { field } => {
                write!(f, "LLM reply did not contain a string '{}' field", field)
            }
        }
    }
}

/// A run that stopped before producing an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineFailure {
    pub stage: Stage,
    pub reason: AbortReason,
    pub raw_response: String,
}

/// Outcome of [`OnlineAgent::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Answered {
        answer: String,
        /// Page the answer was synthesized from
        url: String,
        /// Query sent to the search collaborator
        query: String,
    },
    Aborted(PipelineFailure),
}

impl SearchOutcome {
    /// The answer, if the run completed
    pub fn answer(&self) -> Option<&str> {
        match self {
            SearchOutcome::Answered { answer, .. } => Some(answer.as_str()),
            SearchOutcome::Aborted(_) => None,
        }
    }

    /// The failure, if the run aborted
    pub fn failure(&self) -> Option<&PipelineFailure> {
        match self {
            SearchOutcome::Answered { .. } => None,
            SearchOutcome::Aborted(failure) => Some(failure),
        }
    }
}

/// Answers questions by searching the web and reading one result
pub struct OnlineAgent {
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn WebSearch>,
    reader: Arc<dyn WebpageReader>,
    query_prompt: SystemPrompt,
    url_picker: PromptTemplate,
    responder: Agent,
}

impl OnlineAgent {
    /// Start configuring an online agent
    pub fn builder() -> OnlineAgentBuilder {
        OnlineAgentBuilder::default()
    }

    /// Run all four stages for `question`
    pub async fn run(&self, question: &str) -> Result<SearchOutcome> {
        let query = match self.formulate_query(question).await? {
            Ok(query) => query,
            Err(failure) => return Ok(abort(failure)),
        };

        let urls = self.search.search(&query).await?;
        debug!(query = %query, results = urls.len(), "Search returned");
        let urls = urls.join(" ");

        let url = match self.pick_url(question, &urls).await? {
            Ok(url) => url,
            Err(failure) => return Ok(abort(failure)),
        };

        let page_text = self.reader.read(&url).await?;
        if page_text.trim().is_empty() {
            debug!(url = %url, "Page text is empty; answering anyway");
        }

        let answer = self
            .responder
            .ask(&synthesis_prompt(&url, &page_text, question))
            .await?;

        Ok(SearchOutcome::Answered { answer, url, query })
    }

    /// Stage 1 transcript
    pub fn query_transcript(&self, question: &str) -> Transcript {
        self.query_prompt.transcript(question)
    }

    /// Stage 3 transcript
    pub fn url_picker_transcript(&self, question: &str, urls: &str) -> Result<Transcript> {
        let system = SystemPrompt::render(&self.url_picker, &[("question", question), ("urls", urls)])?;
        Ok(system.transcript(question))
    }

    /// Stage 1: turn the question into a search query
    pub async fn formulate_query(
        &self,
        question: &str,
    ) -> Result<std::result::Result<String, PipelineFailure>> {
        let raw = self.llm.ask(&self.query_transcript(question)).await?;
        Ok(field_from_reply(Stage::QueryFormulation, raw, "search_query"))
    }

    /// Stage 3: pick one URL from the space-separated search results
    pub async fn pick_url(
        &self,
        question: &str,
        urls: &str,
    ) -> Result<std::result::Result<String, PipelineFailure>> {
        let transcript = self.url_picker_transcript(question, urls)?;
        let raw = self.llm.ask(&transcript).await?;
        Ok(field_from_reply(Stage::SourceSelection, raw, "url"))
    }
}

impl fmt::Debug for OnlineAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnlineAgent")
            .field("query_prompt", &self.query_prompt)
            .field("url_picker", &self.url_picker.name())
            .finish_non_exhaustive()
    }
}

fn abort(failure: PipelineFailure) -> SearchOutcome {
    warn!(stage = %failure.stage, reason = %failure.reason, "Online search aborted");
    SearchOutcome::Aborted(failure)
}

fn field_from_reply(
    stage: Stage,
    raw_response: String,
    field: &str,
) -> std::result::Result<String, PipelineFailure> {
    let reason = match extract_json(&raw_response) {
        None => AbortReason::NoStructuredResponse,
        Some(object) => match object.get(field) {
            Some(Value::String(value)) => return Ok(value.clone()),
            _ => AbortReason::MissingField {
                field: field.to_string(),
            },
        },
    };

    Err(PipelineFailure {
        stage,
        reason,
        raw_response,
    })
}

fn synthesis_prompt(url: &str, page_text: &str, question: &str) -> String {
    format!(
        "Please read the following information:\n\n\
         Information about website {url}:\n\
         {page_text}\n\n\
         Answer the following question based on the above information:\n\
         {question}\n\n\
         Start your answer with \"{ANSWER_PREFIX}\""
    )
}

/// Builder for [`OnlineAgent`]
pub struct OnlineAgentBuilder {
    llm: Option<Arc<dyn LlmClient>>,
    search: Option<Arc<dyn WebSearch>>,
    reader: Option<Arc<dyn WebpageReader>>,
    store: Arc<dyn TemplateStore>,
    additional_instructions: String,
}

impl Default for OnlineAgentBuilder {
    fn default() -> Self {
        Self {
            llm: None,
            search: None,
            reader: None,
            store: Arc::new(BuiltinTemplates),
            additional_instructions: String::new(),
        }
    }
}

impl OnlineAgentBuilder {
    /// Set the LLM client (required)
    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Set the search collaborator (required)
    pub fn with_search(mut self, search: Arc<dyn WebSearch>) -> Self {
        self.search = Some(search);
        self
    }

    /// Set the webpage reader (required)
    pub fn with_reader(mut self, reader: Arc<dyn WebpageReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Set the template store
    pub fn with_template_store(mut self, store: Arc<dyn TemplateStore>) -> Self {
        self.store = store;
        self
    }

    /// Extra text for the query formulation prompt
    pub fn with_additional_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.additional_instructions = instructions.into();
        self
    }

    pub fn build(self) -> Result<OnlineAgent> {
        let llm = self
            .llm
            .ok_or_else(|| CoreError::Config("OnlineAgent requires an LLM client".to_string()))?;
        let search = self
            .search
            .ok_or_else(|| CoreError::Config("OnlineAgent requires a search collaborator".to_string()))?;
        let reader = self
            .reader
            .ok_or_else(|| CoreError::Config("OnlineAgent requires a webpage reader".to_string()))?;

        let query_template = PromptTemplate::from_store(self.store.as_ref(), PromptRole::OnlineSearcher)?;
        let query_prompt = SystemPrompt::render(
            &query_template,
            &[("additional_instructions", self.additional_instructions.as_str())],
        )?;

        let url_picker = PromptTemplate::from_store(self.store.as_ref(), PromptRole::UrlPicker)?;
        url_picker.ensure_resolvable(&["question", "urls"])?;

        let responder = Agent::builder()
            .with_llm(llm.clone())
            .with_role(PromptRole::GenericResponder)
            .with_template_store(self.store)
            .build()?;

        Ok(OnlineAgent {
            llm,
            search,
            reader,
            query_prompt,
            url_picker,
            responder,
        })
    }
}
