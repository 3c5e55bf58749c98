//! Data models of GitHub Actions workflows.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The status of a run that has finished executing.
pub const STATUS_COMPLETED: &str = "completed";

/// Represents a GitHub Actions workflow from GitHub REST API.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Workflow {
    /// The identifier, unique within a repository.
    pub id: u64,
    /// The display name.
    pub name: String,
    /// Where the definition is stored, e.g. `.github/workflows/ci.yml`.
    pub path: String,
    /// The lifecycle state, e.g. `active` or `disabled_manually`.
    pub state: String,
}

impl Workflow {
    /// The file name of the definition, with any leading directories removed.
    pub fn filename(&self) -> &str {
        self.path
            .rsplit_once('/')
            .map_or(self.path.as_str(), |(_, filename)| filename)
    }
}

impl Display for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} at {})", self.name, self.id, self.path)
    }
}

/// Represents a GitHub Actions workflow run from GitHub REST API.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    /// The identifier, unique within a repository.
    pub id: u64,
    /// The name of the run, usually the name its workflow had when it ran.
    #[serde(default)]
    pub name: Option<String>,
    /// The owning workflow, which may no longer exist.
    pub workflow_id: u64,
    /// The execution status, e.g. `completed`, `in_progress` or `queued`.
    pub status: String,
    /// The terminal outcome, e.g. `success`, `failure` or `cancelled`.
    #[serde(default)]
    pub conclusion: Option<String>,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
    /// The branch the run was triggered from.
    #[serde(default)]
    pub head_branch: Option<String>,
    /// The pull requests associated with the run.
    #[serde(default)]
    pub pull_requests: Vec<PullRequestRef>,
}

impl WorkflowRun {
    /// Returns `true` if the run has finished executing.
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

impl Display for WorkflowRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run {} ({}", self.id, self.status)?;
        if let Some(conclusion) = &self.conclusion {
            write!(f, ", {conclusion}")?;
        }
        write!(f, ", created at {})", self.created_at.to_rfc3339())
    }
}

/// A pull request associated with a [`WorkflowRun`].
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    /// The identifier of the pull request.
    pub id: u64,
    /// The number of the pull request within its repository.
    pub number: u64,
}

/// Represents a branch from GitHub REST API.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Branch {
    /// The branch name.
    pub name: String,
}
