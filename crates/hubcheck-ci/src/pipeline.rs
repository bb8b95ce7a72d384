//! Pull-request validation pipeline.
//!
//! One run: classify changed files, stage submissions, validate them, then
//! decide labels, the consolidated comment and auto-merge. Evaluation and
//! the write-back to the pull request are separate steps so the decision can
//! be inspected without a host.

use chrono::NaiveDate;
use hubcheck_core::{
    check_forecast_date, check_metadata_files, file_name, print_output_errors,
    validate_forecast_file, ErrorKind, ErrorReport, ValidationError, DATA_DIR,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::changes::ChangeSet;
use crate::config::RunConfig;
use crate::error::Result;
use crate::provider::PullRequest;
use crate::staging::stage_files;

/// Labels the pipeline may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Label {
    OtherFilesUpdated,
    MetadataChange,
    ForecastUpdated,
    Automerge,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::OtherFilesUpdated => "other-files-updated",
            Label::MetadataChange => "metadata-change",
            Label::ForecastUpdated => "forecast-updated",
            Label::Automerge => "automerge",
        }
    }
}

/// One paragraph of the consolidated pull request comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", content = "detail", rename_all = "snake_case")]
pub enum Notice {
    /// A CSV under the data directory does not follow the naming convention.
    IncorrectForecastFormat { docs_url: String },
    /// Existing forecast lines were changed or removed.
    ForecastUpdated,
    /// Forecast date is away from the run date (non-blocking).
    ForecastDateWarning(String),
    DataValidationErrors,
    MetadataValidationErrors,
}

impl Notice {
    pub fn render(&self) -> String {
        match self {
            Notice::IncorrectForecastFormat { docs_url } => format!(
                "You seem to have added a forecast in an incorrect format. \
                 Please refer to {docs_url} to correct your error."
            ),
            Notice::ForecastUpdated => "Your submission seems to have updated/deleted some forecasts. \
                 Could you provide a reason for the update/deletion? \
                 If you provided a reason in the original commit message, there is no need to respond. Thank you!"
                .to_string(),
            Notice::ForecastDateWarning(message) => message.clone(),
            Notice::DataValidationErrors => "Your submission has some validation errors. \
                 Please check the logs of the build under the \"Checks\" tab to get more details about the error."
                .to_string(),
            Notice::MetadataValidationErrors => "Your submission has some metadata validation errors. \
                 Please check the logs of the build under the \"Checks\" tab to get more details about the error."
                .to_string(),
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Notice::ForecastDateWarning(_))
    }
}

/// Everything a run decided.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineOutcome {
    pub pr_number: Option<u64>,
    pub forecast_count: usize,
    pub metadata_count: usize,
    pub other_count: usize,
    pub labels: Vec<Label>,
    pub notices: Vec<Notice>,
    pub data_errors: ErrorReport,
    pub metadata_errors: ErrorReport,
    pub automerge: bool,
}

impl PipelineOutcome {
    /// Whether any blocking finding exists. Date warnings never block.
    pub fn has_blocking_errors(&self) -> bool {
        self.data_errors.has_errors() || self.metadata_errors.has_errors()
    }

    /// Build succeeds iff there are no blocking findings.
    pub fn success(&self) -> bool {
        !self.has_blocking_errors()
    }

    /// Consolidated comment text, `None` when there is nothing to say.
    pub fn comment(&self) -> Option<String> {
        if self.notices.is_empty() {
            return None;
        }
        let paragraphs: Vec<String> = self.notices.iter().map(Notice::render).collect();
        Some(paragraphs.join("\n\n"))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(|n| n.is_warning())
    }

    fn add_label(&mut self, label: Label) {
        if !self.labels.contains(&label) {
            self.labels.push(label);
        }
    }
}

/// Pull request validation orchestrator.
pub struct ValidationPipeline;

impl ValidationPipeline {
    /// Stage and validate the changed files, returning the decisions.
    ///
    /// Nothing is written to the pull request; see [`ValidationPipeline::apply`].
    pub async fn evaluate(
        config: &RunConfig,
        changes: &ChangeSet<'_>,
        today: NaiveDate,
    ) -> Result<PipelineOutcome> {
        let mut outcome = PipelineOutcome {
            forecast_count: changes.forecasts.len(),
            metadata_count: changes.metadata.len(),
            other_count: changes.non_submission_count(),
            ..PipelineOutcome::default()
        };

        info!(
            forecasts = outcome.forecast_count,
            malformed = changes.malformed.len(),
            metadata = outcome.metadata_count,
            other = changes.other.len(),
            "Classified changed files"
        );

        if changes.non_submission_count() > 0 && !changes.forecasts.is_empty() {
            info!("Pull request changes other files too");
            outcome.add_label(Label::OtherFilesUpdated);
        }

        for file in &changes.malformed {
            outcome.data_errors.push(ValidationError::new(
                file.path(),
                ErrorKind::PathFormat,
                format!(
                    "path does not match {DATA_DIR}/<team>-<model>/<YYYY-MM-DD>-<team>-<model>.csv"
                ),
            ));
        }
        if !changes.malformed.is_empty() {
            outcome.notices.push(Notice::IncorrectForecastFormat {
                docs_url: config.docs_url.clone(),
            });
        }

        if !changes.metadata.is_empty() {
            info!("Pull request changes metadata files");
            outcome.add_label(Label::MetadataChange);
        }

        if changes.has_forecast_deletions() {
            outcome.add_label(Label::ForecastUpdated);
            outcome.notices.push(Notice::ForecastUpdated);
        }

        let staged = stage_files(&config.staging_dir, &changes.to_stage()).await?;

        for path in staged
            .paths
            .iter()
            .filter(|p| p.extension().is_some_and(|e| e == "csv"))
        {
            let name = file_name(&path.to_string_lossy()).to_string();
            outcome
                .data_errors
                .insert(name, validate_forecast_file(path));

            let (stale, message) = check_forecast_date(path, today);
            if stale {
                outcome.notices.push(Notice::ForecastDateWarning(message));
            }
        }

        let metadata = check_metadata_files(&staged.paths);
        for entry in staged.failures.iter() {
            let target = if entry.file.ends_with(".csv") {
                &mut outcome.data_errors
            } else {
                &mut outcome.metadata_errors
            };
            target.insert(entry.file.clone(), entry.errors.clone());
        }
        outcome.metadata_errors.extend(metadata.errors);

        if outcome.data_errors.has_errors() {
            outcome.notices.push(Notice::DataValidationErrors);
            print_output_errors(&outcome.data_errors, "data");
        }
        if outcome.metadata_errors.has_errors() {
            outcome.notices.push(Notice::MetadataValidationErrors);
            print_output_errors(&outcome.metadata_errors, "metadata");
        }

        outcome.automerge = !config.is_local()
            && outcome.notices.is_empty()
            && !outcome.has_blocking_errors()
            && changes.malformed.is_empty()
            && changes.metadata.is_empty()
            && changes.other.is_empty()
            && !changes.forecasts.is_empty();
        if outcome.automerge {
            outcome.add_label(Label::Automerge);
        }

        Ok(outcome)
    }

    /// Write labels and the consolidated comment back to the pull request.
    ///
    /// Only done for `pull_request_target` events in CI mode.
    pub async fn apply(
        config: &RunConfig,
        outcome: &PipelineOutcome,
        pr: &dyn PullRequest,
    ) -> Result<()> {
        if !config.posts_to_pull_request() {
            info!(pr = pr.number(), "Not posting to pull request outside CI");
            return Ok(());
        }

        for label in &outcome.labels {
            pr.add_label(label.as_str()).await?;
        }
        if let Some(comment) = outcome.comment() {
            pr.post_comment(&comment).await?;
        }
        if outcome.automerge {
            info!(pr = pr.number(), "Auto merging pull request");
        }
        Ok(())
    }

    /// Evaluate the changes and, when a pull request is given, apply the result.
    pub async fn run(
        config: &RunConfig,
        pr: Option<&dyn PullRequest>,
        changes: &ChangeSet<'_>,
        today: NaiveDate,
    ) -> Result<PipelineOutcome> {
        let mut outcome = Self::evaluate(config, changes, today).await?;
        outcome.pr_number = pr.map(|p| p.number());

        if let Some(pr) = pr {
            Self::apply(config, &outcome, pr).await?;
        }

        if outcome.has_blocking_errors() {
            warn!(
                data = outcome.data_errors.error_count(),
                metadata = outcome.metadata_errors.error_count(),
                "Errors found"
            );
        } else {
            info!("Validation passed");
        }
        Ok(outcome)
    }
}
