//! Capability traits for the pull-request host.
//!
//! The pipeline only needs a handful of operations, so the host API is
//! reduced to two small traits. [`crate::github`] implements them over the
//! GitHub REST API and [`crate::fakes`] in memory.

use async_trait::async_trait;

use crate::error::Result;

/// A file changed by a pull request.
#[async_trait]
pub trait ChangedFile: Send + Sync {
    /// Repository-relative path.
    fn path(&self) -> &str;

    /// Number of deleted lines in the change.
    fn deletions(&self) -> u64;

    /// Raw content of the file at the pull request head.
    async fn raw_content(&self) -> Result<Vec<u8>>;
}

/// The pull request being validated.
#[async_trait]
pub trait PullRequest: Send + Sync {
    fn number(&self) -> u64;

    async fn add_label(&self, label: &str) -> Result<()>;

    async fn post_comment(&self, body: &str) -> Result<()>;
}
