//! hubcheck CI - pull request orchestration
//!
//! Drives the validation engine for one pull request build:
//! - Classifies the changed files and stages submissions locally
//! - Runs forecast and metadata validation
//! - Labels the pull request, posts one consolidated comment and
//!   signals auto-merge when everything passes

pub mod changes;
pub mod config;
pub mod error;
pub mod fakes;
pub mod github;
pub mod pipeline;
pub mod provider;
pub mod staging;

// Re-export key types
pub use changes::ChangeSet;
pub use config::{RunConfig, RunMode};
pub use error::{CiError, Result};
pub use github::{GitHubChangedFile, GitHubClient, GitHubPullRequest, PullRequestEvent};
pub use pipeline::{Label, Notice, PipelineOutcome, ValidationPipeline};
pub use provider::{ChangedFile, PullRequest};
pub use staging::{stage_files, StagedFiles};
