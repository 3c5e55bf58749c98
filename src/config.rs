//! The options record consumed by the retention engine.

use std::{collections::HashSet, fmt::Display, str::FromStr};

use anyhow::{anyhow, bail};

use crate::retention::{PatternList, RetentionPolicy};

/// The default minimum age of a deletable run, in days.
pub const DEFAULT_RETAIN_DAYS: f64 = 30.0;
/// The default number of runs to keep per workflow.
pub const DEFAULT_KEEP_MINIMUM_RUNS: usize = 6;

/// A repository in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    /// The user or organization owning the repository.
    pub owner: String,
    /// The repository name.
    pub name: String,
}

impl FromStr for Repository {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || anyhow!("Invalid repository '{s}'. Expected format {{owner}}/{{repo}}.");

        let (owner, name) = s.split_once('/').ok_or_else(invalid)?;
        let (owner, name) = (owner.trim(), name.trim());
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }
}

impl Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// What to delete from a repository, and how.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// The repository whose runs are pruned.
    pub repository: Repository,
    /// The minimum age in days, fractions allowed, before a run may be deleted.
    pub retain_days: f64,
    /// The number of the newest deletion candidates to keep per workflow.
    pub keep_minimum_runs: usize,
    /// Only prune workflows whose name or file name contains this.
    pub delete_workflow_pattern: Option<String>,
    /// Only prune workflows in one of these comma-separated states, or `ALL`.
    pub delete_workflow_by_state_pattern: Option<String>,
    /// Only delete runs with one of these comma-separated conclusions.
    pub delete_run_by_conclusion_pattern: Option<String>,
    /// Report deletions without performing them.
    pub dry_run: bool,
    /// Keep runs whose branch still exists.
    pub check_branch_existence: bool,
    /// Keep runs associated with a pull request.
    pub check_pullrequest_exist: bool,
}

impl Options {
    /// Creates options for `repository` with default retention settings and no filters.
    pub fn new(repository: Repository) -> Self {
        Self {
            repository,
            retain_days: DEFAULT_RETAIN_DAYS,
            keep_minimum_runs: DEFAULT_KEEP_MINIMUM_RUNS,
            delete_workflow_pattern: None,
            delete_workflow_by_state_pattern: None,
            delete_run_by_conclusion_pattern: None,
            dry_run: false,
            check_branch_existence: false,
            check_pullrequest_exist: false,
        }
    }

    /// Checks the options for values no run could be judged against.
    ///
    /// # Errors
    ///
    /// Returns an error if `retain_days` is negative or not finite.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.retain_days.is_finite() || self.retain_days < 0.0 {
            bail!(
                "Invalid retain_days '{}'. Expected a non-negative number.",
                self.retain_days
            );
        }
        Ok(())
    }

    /// Builds the policy judging each workflow's runs, given the names of the existing branches.
    pub fn policy(&self, branch_names: HashSet<String>) -> RetentionPolicy {
        RetentionPolicy {
            retain_days: self.retain_days,
            keep_minimum_runs: self.keep_minimum_runs,
            conclusions: self
                .delete_run_by_conclusion_pattern
                .as_deref()
                .and_then(PatternList::parse),
            check_branch_existence: self.check_branch_existence,
            check_pullrequest_exist: self.check_pullrequest_exist,
            branch_names,
        }
    }
}
