//! hubcheck - forecast hub pull request validator
//!
//! ## Commands
//!
//! - `run`: validate the files changed by a pull request and report back
//! - `check`: validate an already staged directory offline
//! - `classify`: show how repository paths are categorised

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};

use hubcheck_ci::config::{DEFAULT_API_BASE, DEFAULT_DOCS_URL, DEFAULT_STAGING_DIR};
use hubcheck_ci::{
    ChangeSet, GitHubClient, PullRequest, PullRequestEvent, RunConfig, RunMode,
    ValidationPipeline,
};
use hubcheck_core::{
    check_for_metadata, check_forecast_date, classify, print_output_errors, staged_forecasts,
    validate_directory, ErrorReport,
};

#[derive(Parser)]
#[command(name = "hubcheck")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Forecast hub pull request validator", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the files changed by a pull request and report back to it
    Run(RunArgs),

    /// Validate a directory of already staged forecasts and metadata files
    Check {
        /// Staging directory
        #[arg(default_value = DEFAULT_STAGING_DIR)]
        dir: PathBuf,

        /// Date to compare forecast dates against (default: today)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Print the findings as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the category of each repository path
    Classify {
        /// Repository-relative paths
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

/// Flags given here override the matching CI environment variable.
#[derive(Args)]
struct RunArgs {
    /// Repository as owner/name [env: GITHUB_REPOSITORY]
    #[arg(long)]
    repository: Option<String>,

    /// API token, used in CI mode only [env: GH_TOKEN]
    #[arg(long)]
    token: Option<String>,

    /// Run in CI mode even when `CI` is not `true`
    #[arg(long)]
    ci: bool,

    /// Triggering event name [env: GITHUB_EVENT_NAME]
    #[arg(long)]
    event_name: Option<String>,

    /// Event payload JSON [env: GITHUB_EVENT_PATH, local default: test/test_event.json]
    #[arg(long)]
    event_path: Option<PathBuf>,

    /// Directory to download submissions into
    #[arg(long, default_value = DEFAULT_STAGING_DIR)]
    staging_dir: PathBuf,

    /// Formatting documentation linked from comments
    #[arg(long, default_value = DEFAULT_DOCS_URL)]
    docs_url: String,

    /// REST API base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Date to compare forecast dates against (default: today)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn flag(&self, key: &str) -> Option<String> {
        match key {
            "CI" => self.ci.then(|| "true".to_string()),
            "GITHUB_REPOSITORY" => self.repository.clone(),
            "GH_TOKEN" => self.token.clone(),
            "GITHUB_EVENT_NAME" => self.event_name.clone(),
            "GITHUB_EVENT_PATH" => self
                .event_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            _ => None,
        }
    }

    fn to_config_with(&self, env: impl Fn(&str) -> Option<String>) -> RunConfig {
        RunConfig::from_vars(|key| self.flag(key).or_else(|| env(key)))
            .with_staging_dir(&self.staging_dir)
            .with_docs_url(&self.docs_url)
            .with_api_base(&self.api_base)
    }

    fn to_config(&self) -> RunConfig {
        self.to_config_with(|key| std::env::var(key).ok())
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    hubcheck_core::init_tracing(cli.json_logs, level);

    let passed = match cli.command {
        Commands::Run(args) => cmd_run(&args).await?,
        Commands::Check { dir, today, json } => {
            cmd_check(&dir, today.unwrap_or_else(local_today), json)?
        }
        Commands::Classify { paths } => cmd_classify(&paths),
    };

    if passed {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("\n ERRORS FOUND EXITING BUILD...");
        Ok(ExitCode::FAILURE)
    }
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

async fn cmd_run(args: &RunArgs) -> Result<bool> {
    let config = args.to_config();
    let today = args.today.unwrap_or_else(local_today);

    info!(
        repository = %config.repository,
        mode = ?config.mode,
        event = config.event_name.as_deref().unwrap_or("none"),
        "Starting validation run"
    );
    if config.mode == RunMode::Ci && config.token.is_none() {
        info!("No API token configured, using anonymous access");
    }

    let client = GitHubClient::new(&config).context("Failed to create GitHub client")?;

    let (files, pr) = if config.reads_pull_request() {
        let event_path = config
            .event_path
            .as_deref()
            .context("No event payload path configured")?;
        let event = PullRequestEvent::load(event_path)?;
        let number = event.pull_request.number;
        info!(pr = number, "Pull request");

        let files = client
            .pull_request_files(number)
            .await
            .context("Failed to list pull request files")?;
        (files, Some(client.pull_request(number)))
    } else {
        (Vec::new(), None)
    };

    let changes = ChangeSet::classify(&files);
    let outcome = ValidationPipeline::run(
        &config,
        pr.as_ref().map(|p| p as &dyn PullRequest),
        &changes,
        today,
    )
    .await
    .context("Validation pipeline failed to run")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "Status: {}",
            if outcome.success() { "✓ PASSED" } else { "✗ FAILED" }
        );
        let labels: Vec<&str> = outcome.labels.iter().map(|l| l.as_str()).collect();
        if !labels.is_empty() {
            println!("Labels: {}", labels.join(", "));
        }
        if let Some(comment) = outcome.comment() {
            println!("\nComment:\n{comment}");
        }
    }

    Ok(outcome.success())
}

#[derive(Serialize)]
struct CheckReport {
    data_errors: ErrorReport,
    metadata_errors: ErrorReport,
    warnings: Vec<String>,
}

impl CheckReport {
    fn passed(&self) -> bool {
        !self.data_errors.has_errors() && !self.metadata_errors.has_errors()
    }
}

fn check_dir(dir: &Path, today: NaiveDate) -> CheckReport {
    let data_errors = validate_directory(dir);
    let warnings = staged_forecasts(dir)
        .unwrap_or_default()
        .iter()
        .map(|path| check_forecast_date(path, today))
        .filter(|(stale, _)| *stale)
        .map(|(_, message)| message)
        .collect();
    let metadata_errors = check_for_metadata(dir).errors;

    CheckReport {
        data_errors,
        metadata_errors,
        warnings,
    }
}

fn cmd_check(dir: &Path, today: NaiveDate, json: bool) -> Result<bool> {
    let report = check_dir(dir, today);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", print_output_errors(&report.data_errors, "data"));
        print!("{}", print_output_errors(&report.metadata_errors, "metadata"));
        for warning in &report.warnings {
            println!("warning: {warning}");
        }
        println!(
            "Status: {}",
            if report.passed() { "✓ PASSED" } else { "✗ FAILED" }
        );
    }

    Ok(report.passed())
}

fn cmd_classify(paths: &[String]) -> bool {
    for path in paths {
        println!("{}\t{}", classify(path).as_str(), path);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_check_command() {
        let cli = Cli::try_parse_from(["hubcheck", "check", "staged", "--today", "2021-05-03"])
            .expect("parse failed");
        match cli.command {
            Commands::Check { dir, today, json } => {
                assert_eq!(dir, PathBuf::from("staged"));
                assert_eq!(today, NaiveDate::from_ymd_opt(2021, 5, 3));
                assert!(!json);
            }
            _ => panic!("expected check"),
        }
    }

    fn run_args(argv: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(argv).expect("parse failed");
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        args
    }

    #[test]
    fn test_run_flags_override_environment() {
        let args = run_args(&[
            "hubcheck",
            "run",
            "--repository",
            "org/hub",
            "--ci",
            "--event-name",
            "pull_request_target",
            "--event-path",
            "/tmp/event.json",
        ]);
        let config = args.to_config_with(|key| match key {
            "GITHUB_REPOSITORY" => Some("org/other".to_string()),
            "GH_TOKEN" => Some("secret".to_string()),
            _ => None,
        });
        assert_eq!(config.repository, "org/hub");
        assert_eq!(config.mode, RunMode::Ci);
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert!(config.posts_to_pull_request());
        assert_eq!(config.event_path, Some(PathBuf::from("/tmp/event.json")));
    }

    #[test]
    fn test_run_without_flags_uses_environment_defaults() {
        let args = run_args(&["hubcheck", "run"]);
        let env = |key: &str| (key == "GH_TOKEN").then(|| "secret".to_string());
        let config = args.to_config_with(env);
        assert_eq!(config, RunConfig::from_vars(env));
        assert_eq!(config.mode, RunMode::Local);
        assert!(config.token.is_none());
        assert_eq!(config.staging_dir, PathBuf::from(DEFAULT_STAGING_DIR));
    }

    #[test]
    fn test_classify_requires_paths() {
        assert!(Cli::try_parse_from(["hubcheck", "classify"]).is_err());
    }

    #[test]
    fn test_check_dir_reports_both_channels() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("2021-05-03-lab-alpha.csv"),
            "forecast_date,target,target_end_date,location,type,quantile,value\n\
             2021-05-03,1 wk ahead inc death,2021-05-08,US,point,NA,10\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("metadata-lab-alpha.txt"), "team_name: Lab\n").unwrap();

        let late = NaiveDate::from_ymd_opt(2021, 5, 10).unwrap();
        let report = check_dir(dir.path(), late);
        assert!(!report.data_errors.has_errors());
        assert!(report.metadata_errors.has_errors());
        assert_eq!(report.warnings.len(), 1);
        assert!(!report.passed());
    }
}
