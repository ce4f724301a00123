//! Scripted test doubles shared by the integration tests

#![allow(dead_code)]

use agent_core::{CoreError, LlmClient, Result, Transcript};
use agents::{WebSearch, WebpageReader};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Replies from a fixed script, recording every transcript it is sent
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    seen: Mutex<Vec<Transcript>>,
}

impl ScriptedLlm {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn transcripts(&self) -> Vec<Transcript> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn ask(&self, transcript: &Transcript) -> Result<String> {
        self.seen.lock().unwrap().push(transcript.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CoreError::Client("script exhausted".to_string()))
    }
}

/// Always fails, like an unreachable model server
pub struct FailingLlm;

#[async_trait]
impl LlmClient for FailingLlm {
    async fn ask(&self, _transcript: &Transcript) -> Result<String> {
        Err(CoreError::Client("connection refused".to_string()))
    }
}

/// Returns fixed URLs and counts how often it was called
pub struct CountingSearch {
    urls: Vec<String>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl CountingSearch {
    pub fn new(urls: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for CountingSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.urls.clone())
    }
}

/// Returns fixed page text and records requested URLs
pub struct StaticReader {
    text: String,
    urls: Mutex<Vec<String>>,
}

impl StaticReader {
    pub fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            urls: Mutex::new(Vec::new()),
        })
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebpageReader for StaticReader {
    async fn read(&self, url: &str) -> Result<String> {
        self.urls.lock().unwrap().push(url.to_string());
        Ok(self.text.clone())
    }
}
