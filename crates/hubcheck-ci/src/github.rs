//! GitHub REST adapter
//!
//! Thin implementations of [`ChangedFile`] and [`PullRequest`] over the
//! GitHub v3 API, plus loading of the workflow event payload.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use tracing::{debug, info};

use crate::config::RunConfig;
use crate::error::{CiError, Result};
use crate::provider::{ChangedFile, PullRequest};

const PER_PAGE: usize = 100;

/// The subset of a workflow event payload the validator reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub pull_request: PullRequestRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
}

impl PullRequestEvent {
    /// Load an event payload from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CiError::Event(format!("cannot read {}: {e}", path.display())))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| CiError::Event(format!("missing pull_request.number: {e}")))
    }
}

/// One entry of `GET /repos/{repo}/pulls/{n}/files`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullFile {
    pub filename: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub deletions: u64,
    pub raw_url: Option<String>,
}

/// GitHub API client bound to one repository.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    repository: String,
}

impl GitHubClient {
    /// Create a client from the run configuration.
    pub fn new(config: &RunConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("token {token}"))
                .map_err(|e| CiError::Config(format!("invalid token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("hubcheck/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(GitHubClient {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repository: config.repository.clone(),
        })
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    fn repo_url(&self, tail: &str) -> String {
        format!("{}/repos/{}/{tail}", self.api_base, self.repository)
    }

    /// List every file changed by pull request `number`, following pagination.
    pub async fn pull_request_files(&self, number: u64) -> Result<Vec<GitHubChangedFile>> {
        let url = self.repo_url(&format!("pulls/{number}/files"));
        let mut files = Vec::new();
        let mut page = 1usize;

        loop {
            let response = self
                .http
                .get(&url)
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(CiError::HttpStatus {
                    method: "GET",
                    url,
                    status: response.status().as_u16(),
                });
            }
            let batch: Vec<PullFile> = response.json().await?;
            let done = batch.len() < PER_PAGE;
            debug!(page, count = batch.len(), "Fetched pull request files");
            files.extend(batch.into_iter().map(|file| GitHubChangedFile {
                file,
                http: self.http.clone(),
            }));
            if done {
                break;
            }
            page += 1;
        }

        info!(pr = number, count = files.len(), "Pull request files listed");
        Ok(files)
    }

    /// Handle for label/comment operations on pull request `number`.
    pub fn pull_request(&self, number: u64) -> GitHubPullRequest {
        GitHubPullRequest {
            client: self.clone(),
            number,
        }
    }

    async fn post_json(&self, url: String, body: serde_json::Value) -> Result<()> {
        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(CiError::HttpStatus {
                method: "POST",
                url,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

/// A changed file as reported by the pull request files API.
pub struct GitHubChangedFile {
    file: PullFile,
    http: reqwest::Client,
}

impl GitHubChangedFile {
    pub fn status(&self) -> &str {
        &self.file.status
    }
}

#[async_trait]
impl ChangedFile for GitHubChangedFile {
    fn path(&self) -> &str {
        &self.file.filename
    }

    fn deletions(&self) -> u64 {
        self.file.deletions
    }

    async fn raw_content(&self) -> Result<Vec<u8>> {
        let url = self.file.raw_url.as_deref().ok_or_else(|| CiError::Download {
            path: self.file.filename.clone(),
            reason: "no raw_url (file removed?)".to_string(),
        })?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CiError::Download {
                path: self.file.filename.clone(),
                reason: format!("status {}", response.status().as_u16()),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Pull request handle on GitHub (labels and comments go through the issues API).
pub struct GitHubPullRequest {
    client: GitHubClient,
    number: u64,
}

#[async_trait]
impl PullRequest for GitHubPullRequest {
    fn number(&self) -> u64 {
        self.number
    }

    async fn add_label(&self, label: &str) -> Result<()> {
        let url = self
            .client
            .repo_url(&format!("issues/{}/labels", self.number));
        self.client
            .post_json(url, json!({ "labels": [label] }))
            .await?;
        info!(pr = self.number, label, "Label added");
        Ok(())
    }

    async fn post_comment(&self, body: &str) -> Result<()> {
        let url = self
            .client
            .repo_url(&format!("issues/{}/comments", self.number));
        self.client.post_json(url, json!({ "body": body })).await?;
        info!(pr = self.number, "Comment posted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunMode;

    #[test]
    fn test_parse_event() {
        let event = PullRequestEvent::parse(r#"{"action":"opened","pull_request":{"number":42}}"#)
            .unwrap();
        assert_eq!(event.pull_request.number, 42);
    }

    #[test]
    fn test_parse_event_without_pull_request() {
        let err = PullRequestEvent::parse(r#"{"ref":"refs/heads/main"}"#).unwrap_err();
        assert!(matches!(err, CiError::Event(_)));
    }

    #[test]
    fn test_load_missing_event_file() {
        let err = PullRequestEvent::load(Path::new("/no/such/event.json")).unwrap_err();
        assert!(err.to_string().contains("/no/such/event.json"));
    }

    #[test]
    fn test_pull_file_deserializes_with_defaults() {
        let file: PullFile = serde_json::from_str(
            r#"{"filename":"data-processed/a-b/metadata-a-b.txt","raw_url":null}"#,
        )
        .unwrap();
        assert_eq!(file.deletions, 0);
        assert!(file.raw_url.is_none());
    }

    #[test]
    fn test_repo_url() {
        let config = RunConfig::new("org/hub", RunMode::Local).with_api_base("http://api.test/");
        let client = GitHubClient::new(&config).unwrap();
        assert_eq!(
            client.repo_url("pulls/7/files"),
            "http://api.test/repos/org/hub/pulls/7/files"
        );
        assert_eq!(client.repository(), "org/hub");
    }

    #[tokio::test]
    async fn test_missing_raw_url_is_download_error() {
        let file = GitHubChangedFile {
            file: PullFile {
                filename: "data-processed/a-b/2021-05-03-a-b.csv".to_string(),
                status: "removed".to_string(),
                deletions: 10,
                raw_url: None,
            },
            http: reqwest::Client::new(),
        };
        assert_eq!(file.status(), "removed");
        let err = file.raw_content().await.unwrap_err();
        assert!(matches!(err, CiError::Download { .. }));
    }
}
