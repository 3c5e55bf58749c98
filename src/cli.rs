//! Command-line arguments, readable from GitHub Actions inputs as well.
//!
//! Every flag falls back to the matching `INPUT_*` environment variable, so the binary can run
//! as an action step without arguments.

#![cfg(feature = "cli")]

use std::env;

use anyhow::{Context as _, anyhow};
use clap::Parser;

use crate::{
    config::{DEFAULT_KEEP_MINIMUM_RUNS, DEFAULT_RETAIN_DAYS, Options, Repository},
    env::GITHUB_API_URL,
    github::GitHubClient,
};

/// Deletes old GitHub Actions workflow runs.
#[derive(Debug, Parser)]
#[command(name = "workflow-retention", version, about, long_about = None)]
pub struct Cli {
    /// Token to authenticate with. Falls back to `GITHUB_TOKEN`.
    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// REST endpoint of the GitHub instance. Falls back to `GITHUB_API_URL`.
    #[arg(long, env = "INPUT_BASEURL")]
    pub base_url: Option<String>,

    /// Repository in `owner/name` form. Falls back to `GITHUB_REPOSITORY`.
    #[arg(long, env = "INPUT_REPOSITORY")]
    pub repository: Option<String>,

    /// Minimum age in days of a run before it may be deleted.
    #[arg(long, env = "INPUT_RETAIN_DAYS", default_value_t = DEFAULT_RETAIN_DAYS, value_parser = parse_days)]
    pub retain_days: f64,

    /// Number of the newest deletable runs to keep per workflow.
    #[arg(long, env = "INPUT_KEEP_MINIMUM_RUNS", default_value_t = DEFAULT_KEEP_MINIMUM_RUNS)]
    pub keep_minimum_runs: usize,

    /// Only prune workflows whose name or file name contains this.
    #[arg(long, env = "INPUT_DELETE_WORKFLOW_PATTERN")]
    pub delete_workflow_pattern: Option<String>,

    /// Only prune workflows in one of these comma-separated states, or `ALL`.
    #[arg(long, env = "INPUT_DELETE_WORKFLOW_BY_STATE_PATTERN", default_value = "ALL")]
    pub delete_workflow_by_state_pattern: String,

    /// Only delete runs with one of these comma-separated conclusions.
    #[arg(long, env = "INPUT_DELETE_RUN_BY_CONCLUSION_PATTERN")]
    pub delete_run_by_conclusion_pattern: Option<String>,

    /// Report deletions without performing them.
    #[arg(long, env = "INPUT_DRY_RUN")]
    pub dry_run: bool,

    /// Keep runs whose branch still exists.
    #[arg(long, env = "INPUT_CHECK_BRANCH_EXISTENCE")]
    pub check_branch_existence: bool,

    /// Keep runs associated with a pull request.
    #[arg(long, env = "INPUT_CHECK_PULLREQUEST_EXIST")]
    pub check_pullrequest_exist: bool,
}

impl Cli {
    /// Builds the retention options.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository is given, or it is not in `owner/name` form.
    pub fn options(&self) -> anyhow::Result<Options> {
        let repository = self
            .repository
            .clone()
            .or_else(|| non_empty_env("GITHUB_REPOSITORY"))
            .ok_or_else(|| anyhow!("no repository given, expected --repository or GITHUB_REPOSITORY"))?;
        let repository: Repository = repository.parse()?;

        let options = Options {
            repository,
            retain_days: self.retain_days,
            keep_minimum_runs: self.keep_minimum_runs,
            delete_workflow_pattern: self.delete_workflow_pattern.clone(),
            delete_workflow_by_state_pattern: Some(self.delete_workflow_by_state_pattern.clone()),
            delete_run_by_conclusion_pattern: self.delete_run_by_conclusion_pattern.clone(),
            dry_run: self.dry_run,
            check_branch_existence: self.check_branch_existence,
            check_pullrequest_exist: self.check_pullrequest_exist,
        };
        options.validate()?;
        Ok(options)
    }

    /// Builds the client for `repository`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn client(&self, repository: Repository) -> anyhow::Result<GitHubClient> {
        let base_url = self.base_url.as_deref().unwrap_or(GITHUB_API_URL.as_str());
        let token = self.token.clone().or_else(|| non_empty_env("GITHUB_TOKEN"));

        GitHubClient::new(base_url, token, repository)
            .with_context(|| format!("failed to set up a client for {base_url}"))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_days(s: &str) -> Result<f64, String> {
    match s.trim().parse::<f64>() {
        Ok(days) if days.is_finite() && days >= 0.0 => Ok(days),
        _ => Err(format!("'{s}' is not a non-negative number of days")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "workflow-retention",
            "--repository",
            "octo/repo",
            "--retain-days",
            "0.5",
            "--keep-minimum-runs",
            "2",
            "--delete-workflow-pattern",
            "nightly",
            "--delete-workflow-by-state-pattern",
            "disabled_manually",
            "--delete-run-by-conclusion-pattern",
            "failure,cancelled",
            "--dry-run",
            "--check-branch-existence",
        ])
        .unwrap();

        let options = cli.options().unwrap();
        assert_eq!(options.repository.to_string(), "octo/repo");
        assert_eq!(options.retain_days, 0.5);
        assert_eq!(options.keep_minimum_runs, 2);
        assert_eq!(options.delete_workflow_pattern.as_deref(), Some("nightly"));
        assert_eq!(
            options.delete_workflow_by_state_pattern.as_deref(),
            Some("disabled_manually")
        );
        assert_eq!(
            options.delete_run_by_conclusion_pattern.as_deref(),
            Some("failure,cancelled")
        );
        assert!(options.dry_run);
        assert!(options.check_branch_existence);
        assert!(!options.check_pullrequest_exist);
    }

    #[test]
    fn rejects_negative_days() {
        assert!(
            Cli::try_parse_from(["workflow-retention", "--repository", "o/r", "--retain-days", "-3"])
                .is_err()
        );
        assert_eq!(parse_days(" 14 "), Ok(14.0));
        assert!(parse_days("NaN").is_err());
    }

    #[test]
    fn rejects_malformed_repository() {
        let cli = Cli::try_parse_from(["workflow-retention", "--repository", "octo"]).unwrap();
        let err = cli.options().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid repository 'octo'. Expected format {owner}/{repo}."
        );
    }
}
