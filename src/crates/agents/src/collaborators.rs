//! External collaborators the agents call but never look inside.
//!
//! Searching the web, fetching and cleaning a page, and pulling text out of
//! a document are all someone else's job. Each is a one-method async trait;
//! any error an implementation returns propagates out of the agent
//! unchanged.
//!
//! Only [`PlainTextReader`] ships here. Web search and page fetching are
//! left to the caller.

use agent_core::{CoreError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Turns a search query into candidate URLs
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Run `query` and return result URLs, best first
    async fn search(&self, query: &str) -> Result<Vec<String>>;
}

/// Fetches a page and returns its readable text
#[async_trait]
pub trait WebpageReader: Send + Sync {
    /// Read the page at `url`. Empty text is a valid result.
    async fn read(&self, url: &str) -> Result<String>;
}

/// Extracts text from a document on disk
#[async_trait]
pub trait DocumentReader: Send + Sync {
    /// Read the document at `path`
    async fn read(&self, path: &Path) -> Result<String>;
}

#[async_trait]
impl<T: WebSearch + ?Sized> WebSearch for Arc<T> {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        (**self).search(query).await
    }
}

#[async_trait]
impl<T: WebpageReader + ?Sized> WebpageReader for Arc<T> {
    async fn read(&self, url: &str) -> Result<String> {
        (**self).read(url).await
    }
}

#[async_trait]
impl<T: DocumentReader + ?Sized> DocumentReader for Arc<T> {
    async fn read(&self, path: &Path) -> Result<String> {
        (**self).read(path).await
    }
}

/// Reads documents as UTF-8 text files
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextReader;

#[async_trait]
impl DocumentReader for PlainTextReader {
    async fn read(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path).await.map_err(|e| {
            CoreError::collaborator("document-reader", format!("{}: {}", path.display(), e))
        })
    }
}
