//! In-memory fakes for the host capability traits (testing only)
//!
//! `MemoryChangedFile` serves fixed bytes (or fails to download) and
//! `MemoryPullRequest` records every label and comment it receives.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CiError, Result};
use crate::provider::{ChangedFile, PullRequest};

// ---------------------------------------------------------------------------
// MemoryChangedFile
// ---------------------------------------------------------------------------

/// Changed file backed by an in-memory buffer.
#[derive(Debug, Clone)]
pub struct MemoryChangedFile {
    path: String,
    deletions: u64,
    content: Option<Vec<u8>>,
}

impl MemoryChangedFile {
    pub fn new(path: &str, content: &[u8]) -> Self {
        Self {
            path: path.to_string(),
            deletions: 0,
            content: Some(content.to_vec()),
        }
    }

    /// A file whose download always fails.
    pub fn unreachable(path: &str) -> Self {
        Self {
            path: path.to_string(),
            deletions: 0,
            content: None,
        }
    }

    pub fn with_deletions(mut self, deletions: u64) -> Self {
        self.deletions = deletions;
        self
    }
}

#[async_trait]
impl ChangedFile for MemoryChangedFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn deletions(&self) -> u64 {
        self.deletions
    }

    async fn raw_content(&self) -> Result<Vec<u8>> {
        self.content.clone().ok_or_else(|| CiError::Download {
            path: self.path.clone(),
            reason: "unreachable".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryPullRequest
// ---------------------------------------------------------------------------

/// Pull request that records the actions taken on it.
#[derive(Debug, Default)]
pub struct MemoryPullRequest {
    number: u64,
    labels: Mutex<Vec<String>>,
    comments: Mutex<Vec<String>>,
}

impl MemoryPullRequest {
    pub fn new(number: u64) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }

    pub fn comments(&self) -> Vec<String> {
        self.comments.lock().unwrap().clone()
    }
}

#[async_trait]
impl PullRequest for MemoryPullRequest {
    fn number(&self) -> u64 {
        self.number
    }

    async fn add_label(&self, label: &str) -> Result<()> {
        let mut labels = self.labels.lock().unwrap();
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
        Ok(())
    }

    async fn post_comment(&self, body: &str) -> Result<()> {
        self.comments.lock().unwrap().push(body.to_string());
        Ok(())
    }
}
