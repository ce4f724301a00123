//! Grounded answering over documents

mod common;

use agent_core::{
    CoreError, LlmClient, PromptRole, PromptTemplate, Result, Transcript, YamlTemplateStore,
};
use agents::{Agent, DocumentAgent, GroundedResponder, PlainTextReader};
use async_trait::async_trait;
use common::ScriptedLlm;
use std::path::PathBuf;
use std::sync::Arc;

/// Deterministic model: reply depends only on the transcript
struct Digest;

#[async_trait]
impl LlmClient for Digest {
    async fn ask(&self, transcript: &Transcript) -> Result<String> {
        Ok(format!(
            "{}|{}",
            transcript.system().content().len(),
            transcript.user().content()
        ))
    }
}

fn write_doc(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    path
}

#[tokio::test]
async fn test_grounded_responder_is_idempotent() {
    let template = PromptTemplate::new("t", "Context: {documents}\n{additional_instructions}");
    let responder = GroundedResponder::new(Arc::new(Digest), template, "documents", "").unwrap();

    let first = responder.answer("Q?", "The sky is green.").await.unwrap();
    let second = responder.answer("Q?", "The sky is green.").await.unwrap();
    assert_eq!(first, second);

    let other = responder.answer("Q?", "The sky is blue and wide.").await.unwrap();
    assert_ne!(first, other);
}

#[tokio::test]
async fn test_document_agent_labels_each_document() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_doc(&dir, "sky.txt", "The sky is green.");
    let b = write_doc(&dir, "grass.txt", "The grass is blue.");

    let llm = ScriptedLlm::new(["The sky is green."]);
    let agent = DocumentAgent::builder()
        .with_llm(llm.clone())
        .with_reader(Arc::new(PlainTextReader))
        .with_document(&a)
        .with_document(&b)
        .build()
        .unwrap();

    let answer = agent.ask("What colour is the sky?").await.unwrap();
    assert_eq!(answer, "The sky is green.");

    let transcripts = llm.transcripts();
    let sent = &transcripts[0];
    let system = sent.system().content();
    assert!(system.contains(
        "Contents of document sky.txt :\nThe sky is green.\n\nContents of document grass.txt :\nThe grass is blue.\n\n"
    ));
    assert_eq!(sent.user().content(), "What colour is the sky?");
}

#[tokio::test]
async fn test_document_text_with_braces_is_not_a_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_doc(&dir, "tmpl.txt", "use {additional_instructions} and {{x}}");

    let agent = DocumentAgent::builder()
        .with_llm(Arc::new(Digest))
        .with_additional_instructions("Be brief.")
        .build()
        .unwrap();

    let transcript = agent.transcript_for("Q", &[path]).await.unwrap();
    assert!(transcript
        .system()
        .content()
        .contains("use {additional_instructions} and {{x}}"));
}

#[tokio::test]
async fn test_document_agent_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let agent = DocumentAgent::builder()
        .with_llm(ScriptedLlm::new(["unused"]))
        .build()
        .unwrap();

    let err = agent
        .ask_documents("Q", &[dir.path().join("missing.txt")])
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Collaborator { .. }));
}

#[test]
fn test_document_agent_custom_prompt_validation() {
    let err = DocumentAgent::builder()
        .with_llm(Arc::new(Digest))
        .with_system_prompt("Docs: {documents}. Persona: {persona}")
        .build()
        .unwrap_err();
    assert!(matches!(err, CoreError::MissingPlaceholder { ref placeholder, .. } if placeholder == "persona"));

    assert!(DocumentAgent::builder()
        .with_llm(Arc::new(Digest))
        .with_system_prompt("Answer from: {documents}")
        .build()
        .is_ok());
}

#[tokio::test]
async fn test_agent_uses_yaml_store() {
    let store = YamlTemplateStore::from_yaml_str(
        "generic-responder: \"You are a librarian. {additional_instructions}\"\n",
    )
    .unwrap();

    let llm = ScriptedLlm::new(["Shh."]);
    let agent = Agent::builder()
        .with_llm(llm.clone())
        .with_role(PromptRole::GenericResponder)
        .with_template_store(Arc::new(store))
        .with_additional_instructions("Whisper.")
        .build()
        .unwrap();

    assert_eq!(agent.ask("Hello").await.unwrap(), "Shh.");
    assert_eq!(
        llm.transcripts()[0].system().content(),
        "You are a librarian. Whisper."
    );
}
