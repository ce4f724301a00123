//! Prompt templates and system prompt assembly.
//!
//! Templates live in a [`TemplateStore`] keyed by a role name
//! (`function-caller`, `document-reader`, ...). The store is injected into
//! each component at construction; nothing here reads global state.
//!
//! # Template Syntax
//!
//! - `{name}` is a placeholder. Every placeholder a template references must
//!   be supplied when it is rendered, otherwise rendering fails with
//!   [`CoreError::MissingPlaceholder`].
//! - `{{` and `}}` are literal braces, so JSON examples inside a template are
//!   written `{{"url": "..."}}`.
//! - Any other brace is copied through unchanged.
//!
//! Substituted values are inserted verbatim and never re-scanned, so a
//! document containing `{braces}` cannot inject placeholders.
//!
//! # Example
//!
//! ```rust
//! use agent_core::prompt::{BuiltinTemplates, PromptRole, PromptTemplate, SystemPrompt};
//!
//! let template = PromptTemplate::from_store(&BuiltinTemplates, PromptRole::GenericResponder)?;
//! let system = SystemPrompt::render(&template, &[("additional_instructions", "Be brief.")])?;
//!
//! let transcript = system.transcript("What is Rust?");
//! assert!(transcript.system().content().contains("Be brief."));
//! # Ok::<(), agent_core::CoreError>(())
//! ```

use crate::error::{CoreError, Result};
use crate::messages::Transcript;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// Roles with a template in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptRole {
    /// Picks a function and its parameters from a capability schema
    FunctionCaller,
    /// Answers from supplied document text
    DocumentReader,
    /// Answers free-form prompts
    GenericResponder,
    /// Turns a question into a search query
    OnlineSearcher,
    /// Picks the most relevant URL from search results
    UrlPicker,
    /// Extracts requested keys from supplied information
    DataExtractor,
}

impl PromptRole {
    /// Every role, in a stable order
    pub const ALL: [PromptRole; 6] = [
        PromptRole::FunctionCaller,
        PromptRole::DocumentReader,
        PromptRole::GenericResponder,
        PromptRole::OnlineSearcher,
        PromptRole::UrlPicker,
        PromptRole::DataExtractor,
    ];

    /// Store key for this role
    pub fn key(&self) -> &'static str {
        match self {
            PromptRole::FunctionCaller => "function-caller",
            PromptRole::DocumentReader => "document-reader",
            PromptRole::GenericResponder => "generic-responder",
            PromptRole::OnlineSearcher => "online-searcher",
            PromptRole::UrlPicker => "url-picker",
            PromptRole::DataExtractor => "data-extractor",
        }
    }
}

impl fmt::Display for PromptRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Read-only repository of prompt templates keyed by role
pub trait TemplateStore: Send + Sync {
    /// Template text for `role`, if the store has one
    fn template(&self, role: &str) -> Option<&str>;
}

/// Default templates shipped with the crate
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl BuiltinTemplates {
    /// Built-in template text for `role`
    pub fn get(role: &str) -> Option<&'static str> {
        let text = match role {
            "function-caller" => FUNCTION_CALLER,
            "document-reader" => DOCUMENT_READER,
            "generic-responder" => GENERIC_RESPONDER,
            "online-searcher" => ONLINE_SEARCHER,
            "url-picker" => URL_PICKER,
            "data-extractor" => DATA_EXTRACTOR,
            _ => return None,
        };
        Some(text)
    }
}

impl TemplateStore for BuiltinTemplates {
    fn template(&self, role: &str) -> Option<&str> {
        Self::get(role)
    }
}

const FUNCTION_CALLER: &str = r#"You are a function caller. You are given a list of functions described by the schema below.
Choose the single function that best fulfils the user's request and fill in its parameters.
Reply ONLY with a JSON object of the form:
{{"function": "<function name>", "parameters": {{"<parameter name>": <value>}}}}

Functions:
{schema}

{additional_instructions}"#;

const DOCUMENT_READER: &str = r#"You are a document reader. Answer the user's question using only the documents below.
If the documents do not contain the answer, say so.

{documents}

{additional_instructions}"#;

const GENERIC_RESPONDER: &str = r#"You are a helpful assistant. Answer the user's request accurately and concisely.

{additional_instructions}"#;

const ONLINE_SEARCHER: &str = r#"You have access to an internet search engine. Write the search query that would find the best answer to the user's question.
Reply ONLY with a JSON object of the form:
{{"search_query": "<query>"}}

{additional_instructions}"#;

const URL_PICKER: &str = r#"You are given a question and a list of URLs returned by a search engine.
Question: {question}
URLs: {urls}

Pick the one URL most likely to answer the question.
Reply ONLY with a JSON object of the form:
{{"url": "<url>"}}"#;

const DATA_EXTRACTOR: &str = r#"You are a data extractor. Extract the requested fields from the information below.
Reply with a JSON object whose keys are the requested fields. Use null for anything that is not present.

Information:
{information}

{additional_instructions}"#;

/// Templates loaded from a YAML mapping of role to template text
///
/// Roles missing from the file fall back to [`BuiltinTemplates`].
///
/// ```yaml
/// generic-responder: |
///   You are terse. {additional_instructions}
/// ```
#[derive(Debug, Clone, Default)]
pub struct YamlTemplateStore {
    templates: HashMap<String, String>,
}

impl YamlTemplateStore {
    /// Parse a YAML mapping
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let templates: HashMap<String, String> = serde_yaml::from_str(yaml)?;
        Ok(Self { templates })
    }

    /// Load a YAML template file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Roles overridden by this store
    pub fn roles(&self) -> Vec<&str> {
        let mut roles: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        roles.sort_unstable();
        roles
    }
}

impl TemplateStore for YamlTemplateStore {
    fn template(&self, role: &str) -> Option<&str> {
        self.templates
            .get(role)
            .map(String::as_str)
            .or_else(|| BuiltinTemplates::get(role))
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("token pattern is valid")
    })
}

/// A named template with `{placeholder}` slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    name: String,
    text: String,
}

impl PromptTemplate {
    /// Create a template from raw text
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Look up the template for `role` in `store`
    pub fn from_store(store: &dyn TemplateStore, role: PromptRole) -> Result<Self> {
        store
            .template(role.key())
            .map(|text| Self::new(role.key(), text))
            .ok_or_else(|| CoreError::UnknownTemplate(role.key().to_string()))
    }

    /// Use `custom` text if given, otherwise the store's template for `role`
    ///
    /// A custom template follows the same placeholder rules as a stored one.
    pub fn custom_or_store(
        custom: Option<String>,
        store: &dyn TemplateStore,
        role: PromptRole,
    ) -> Result<Self> {
        match custom {
            Some(text) => Ok(Self::new(format!("{} (custom)", role.key()), text)),
            None => Self::from_store(store, role),
        }
    }

    /// Template name, used in error messages
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw template text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Placeholder names referenced by the template, first occurrence order
    pub fn placeholders(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for caps in token_pattern().captures_iter(&self.text) {
            if let Some(name) = caps.get(1).map(|m| m.as_str()) {
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }
        seen
    }

    /// Fail unless every referenced placeholder is in `available`
    pub fn ensure_resolvable(&self, available: &[&str]) -> Result<()> {
        match self
            .placeholders()
            .into_iter()
            .find(|name| !available.contains(name))
        {
            Some(missing) => Err(CoreError::MissingPlaceholder {
                template: self.name.clone(),
                placeholder: missing.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Substitute `values` into the template
    ///
    /// Values for names the template never references are ignored.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String> {
        let mut rendered = String::with_capacity(self.text.len());
        let mut last = 0;

        for caps in token_pattern().captures_iter(&self.text) {
            let Some(whole) = caps.get(0) else { continue };
            rendered.push_str(&self.text[last..whole.start()]);
            rendered.push_str(self.resolve_token(&caps, values)?);
            last = whole.end();
        }
        rendered.push_str(&self.text[last..]);

        Ok(rendered)
    }

    fn resolve_token<'a>(&self, caps: &Captures<'_>, values: &[(&str, &'a str)]) -> Result<&'a str> {
        let Some(name) = caps.get(1).map(|m| m.as_str()) else {
            return Ok(if &caps[0] == "{{" { "{" } else { "}" });
        };

        values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| CoreError::MissingPlaceholder {
                template: self.name.clone(),
                placeholder: name.to_string(),
            })
    }
}

/// A fully rendered system prompt
///
/// Built once per component and reused for every request, paired with a
/// fresh user message each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt(String);

impl SystemPrompt {
    /// Render `template` with `values`
    pub fn render(template: &PromptTemplate, values: &[(&str, &str)]) -> Result<Self> {
        template.render(values).map(Self)
    }

    /// Rendered text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Pair this prompt with a user message
    pub fn transcript(&self, user: impl Into<String>) -> Transcript {
        Transcript::new(self.0.clone(), user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_and_unescapes() {
        let template = PromptTemplate::new("t", r#"Reply {{"url": "x"}} for {question}."#);
        let rendered = template.render(&[("question", "why")]).unwrap();
        assert_eq!(rendered, r#"Reply {"url": "x"} for why."#);
    }

    #[test]
    fn test_render_missing_placeholder_fails() {
        let template = PromptTemplate::new("function-caller", "{schema}\n{additional_instructions}");
        let err = template.render(&[("schema", "[]")]).unwrap_err();
        match err {
            CoreError::MissingPlaceholder { template, placeholder } => {
                assert_eq!(template, "function-caller");
                assert_eq!(placeholder, "additional_instructions");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let template = PromptTemplate::new("t", "Docs: {documents}");
        let rendered = template
            .render(&[("documents", "contains {additional_instructions} literally")])
            .unwrap();
        assert_eq!(rendered, "Docs: contains {additional_instructions} literally");
    }

    #[test]
    fn test_lone_braces_pass_through() {
        let template = PromptTemplate::new("t", "a { b } {not a placeholder} c");
        assert!(template.placeholders().is_empty());
        assert_eq!(template.render(&[]).unwrap(), "a { b } {not a placeholder} c");
    }

    #[test]
    fn test_placeholders_in_first_occurrence_order() {
        let template = PromptTemplate::new("t", "{b} {a} {b} {{c}}");
        assert_eq!(template.placeholders(), vec!["b", "a"]);
    }

    #[test]
    fn test_ensure_resolvable() {
        let template = PromptTemplate::new("t", "{documents} {additional_instructions}");
        assert!(template
            .ensure_resolvable(&["documents", "additional_instructions"])
            .is_ok());
        assert!(template.ensure_resolvable(&["documents"]).is_err());
    }

    #[test]
    fn test_builtin_templates_cover_every_role() {
        for role in PromptRole::ALL {
            let template = PromptTemplate::from_store(&BuiltinTemplates, role).unwrap();
            assert_eq!(template.name(), role.key());
            assert!(!template.text().is_empty());
        }
    }

    #[test]
    fn test_builtin_placeholder_sets() {
        let expect = |role: PromptRole, names: &[&str]| {
            let template = PromptTemplate::from_store(&BuiltinTemplates, role).unwrap();
            assert_eq!(template.placeholders(), names, "role {}", role);
        };
        expect(PromptRole::FunctionCaller, &["schema", "additional_instructions"]);
        expect(PromptRole::DocumentReader, &["documents", "additional_instructions"]);
        expect(PromptRole::GenericResponder, &["additional_instructions"]);
        expect(PromptRole::OnlineSearcher, &["additional_instructions"]);
        expect(PromptRole::UrlPicker, &["question", "urls"]);
        expect(PromptRole::DataExtractor, &["information", "additional_instructions"]);
    }

    #[test]
    fn test_yaml_store_overrides_and_falls_back() {
        let store = YamlTemplateStore::from_yaml_str(
            "generic-responder: \"Terse. {additional_instructions}\"\n",
        )
        .unwrap();
        assert_eq!(store.roles(), vec!["generic-responder"]);
        assert_eq!(
            store.template("generic-responder"),
            Some("Terse. {additional_instructions}")
        );
        assert_eq!(store.template("url-picker"), BuiltinTemplates::get("url-picker"));
        assert_eq!(store.template("nonexistent"), None);
    }

    #[test]
    fn test_yaml_store_rejects_non_mapping() {
        assert!(YamlTemplateStore::from_yaml_str("- a\n- b\n").is_err());
    }

    #[test]
    fn test_yaml_store_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.yaml");
        std::fs::write(&path, "url-picker: \"{question} -> {urls}\"\n").unwrap();

        let store = YamlTemplateStore::from_path(&path).unwrap();
        assert_eq!(store.template("url-picker"), Some("{question} -> {urls}"));
    }

    #[test]
    fn test_unknown_template() {
        struct Empty;
        impl TemplateStore for Empty {
            fn template(&self, _role: &str) -> Option<&str> {
                None
            }
        }
        let err = PromptTemplate::from_store(&Empty, PromptRole::UrlPicker).unwrap_err();
        assert!(matches!(err, CoreError::UnknownTemplate(ref r) if r == "url-picker"));
    }

    #[test]
    fn test_custom_template_overrides_store() {
        let custom = PromptTemplate::custom_or_store(
            Some("Only {additional_instructions}".to_string()),
            &BuiltinTemplates,
            PromptRole::GenericResponder,
        )
        .unwrap();
        assert_eq!(custom.name(), "generic-responder (custom)");
        assert_eq!(custom.text(), "Only {additional_instructions}");

        let stored =
            PromptTemplate::custom_or_store(None, &BuiltinTemplates, PromptRole::GenericResponder)
                .unwrap();
        assert_eq!(stored.name(), "generic-responder");
    }

    #[test]
    fn test_system_prompt_transcript() {
        let template = PromptTemplate::new("t", "Be {tone}.");
        let system = SystemPrompt::render(&template, &[("tone", "kind")]).unwrap();
        assert_eq!(system.as_str(), "Be kind.");

        let transcript = system.transcript("hello");
        assert_eq!(transcript.system().content(), "Be kind.");
        assert_eq!(transcript.user().content(), "hello");
    }
}
