//! Run configuration.
//!
//! Built once at startup (from CLI flags or the environment) and passed
//! into the pipeline. Nothing downstream reads the environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_REPOSITORY: &str = "reichlab/covid19-forecast-hub";
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_STAGING_DIR: &str = "forecasts";
pub const DEFAULT_LOCAL_EVENT_PATH: &str = "test/test_event.json";
pub const DEFAULT_DOCS_URL: &str =
    "https://github.com/reichlab/covid19-forecast-hub/tree/master/data-processed#data-formatting";

/// Event name for which pull-request actions are taken.
pub const PULL_REQUEST_TARGET: &str = "pull_request_target";

/// Where the run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Developer machine: nothing is posted back to the pull request.
    Local,
    /// Continuous integration (`CI=true`).
    Ci,
}

impl RunMode {
    /// `CI=true` selects `Ci`, anything else `Local`.
    pub fn from_ci_flag(ci: Option<&str>) -> Self {
        match ci {
            Some("true") => RunMode::Ci,
            _ => RunMode::Local,
        }
    }
}

/// Configuration for one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// `owner/name` of the hosting repository
    pub repository: String,
    /// API token (optional for public reads)
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub mode: RunMode,
    /// Triggering event name (`GITHUB_EVENT_NAME`)
    pub event_name: Option<String>,
    /// Path of the event payload JSON (`GITHUB_EVENT_PATH`)
    pub event_path: Option<PathBuf>,
    /// Directory that downloaded files are staged into
    pub staging_dir: PathBuf,
    /// Formatting documentation linked from comments
    pub docs_url: String,
    /// REST API base URL
    pub api_base: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            repository: DEFAULT_REPOSITORY.to_string(),
            token: None,
            mode: RunMode::Local,
            event_name: None,
            event_path: None,
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            docs_url: DEFAULT_DOCS_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl RunConfig {
    /// Build a config from the standard CI environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a config from `CI`, `GITHUB_REPOSITORY`, `GH_TOKEN`,
    /// `GITHUB_EVENT_NAME` and `GITHUB_EVENT_PATH` as returned by `var`.
    ///
    /// The token is only used in CI. Local runs without an event path read
    /// [`DEFAULT_LOCAL_EVENT_PATH`].
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mode = RunMode::from_ci_flag(var("CI").as_deref());
        let event_path = var("GITHUB_EVENT_PATH")
            .map(PathBuf::from)
            .or_else(|| (mode == RunMode::Local).then(|| PathBuf::from(DEFAULT_LOCAL_EVENT_PATH)));

        RunConfig {
            repository: var("GITHUB_REPOSITORY").unwrap_or_else(|| DEFAULT_REPOSITORY.to_string()),
            token: match mode {
                RunMode::Ci => var("GH_TOKEN"),
                RunMode::Local => None,
            },
            mode,
            event_name: var("GITHUB_EVENT_NAME"),
            event_path,
            ..Self::default()
        }
    }

    /// Create a config for a specific repository and mode.
    pub fn new(repository: &str, mode: RunMode) -> Self {
        RunConfig {
            repository: repository.to_string(),
            mode,
            ..Self::default()
        }
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_event(mut self, name: &str, path: Option<PathBuf>) -> Self {
        self.event_name = Some(name.to_string());
        self.event_path = path;
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    pub fn with_docs_url(mut self, docs_url: &str) -> Self {
        self.docs_url = docs_url.to_string();
        self
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn is_local(&self) -> bool {
        self.mode == RunMode::Local
    }

    pub fn is_pull_request_target(&self) -> bool {
        self.event_name.as_deref() == Some(PULL_REQUEST_TARGET)
    }

    /// Whether labels and comments are written back to the pull request.
    pub fn posts_to_pull_request(&self) -> bool {
        self.mode == RunMode::Ci && self.is_pull_request_target()
    }

    /// Whether the changed files of a pull request should be fetched at all.
    pub fn reads_pull_request(&self) -> bool {
        self.is_local() || self.is_pull_request_target()
    }
}
