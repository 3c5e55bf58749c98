//! Classifies the runs of a workflow into deletion candidates and runs to keep.

use std::{collections::HashSet, fmt::Display};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::trace;

use super::{Partition, PatternList};
use crate::workflow::WorkflowRun;

const NANOS_PER_DAY: f64 = 86_400.0 * 1_000_000_000.0;

/// A source of the current time.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// A [`Clock`] reading the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A [`Clock`] pinned to a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Decides which runs of a workflow are eligible for deletion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetentionPolicy {
    /// The minimum age in days, fractions allowed, before a run may be deleted.
    pub retain_days: f64,
    /// The number of the newest deletion candidates to keep per workflow.
    ///
    /// See: [`super::apply_floor`]
    pub keep_minimum_runs: usize,
    /// If present, only runs with one of these conclusions may be deleted.
    pub conclusions: Option<PatternList>,
    /// Keeps runs triggered from a branch in [`Self::branch_names`].
    pub check_branch_existence: bool,
    /// Keeps runs associated with a pull request.
    pub check_pullrequest_exist: bool,
    /// The names of the branches that currently exist.
    pub branch_names: HashSet<String>,
}

impl RetentionPolicy {
    /// The age from which a run becomes a deletion candidate.
    pub fn retention_period(&self) -> TimeDelta {
        // Saturating cast; non-finite values are rejected when options are validated
        TimeDelta::nanoseconds((self.retain_days * NANOS_PER_DAY) as i64)
    }

    /// Returns why a run must be kept regardless of its age, if it must.
    pub fn exclusion(&self, run: &WorkflowRun) -> Option<Exclusion> {
        if !run.is_completed() {
            Some(Exclusion::InFlight)
        } else if self.check_pullrequest_exist && !run.pull_requests.is_empty() {
            Some(Exclusion::PullRequest)
        } else if self.check_branch_existence
            && run
                .head_branch
                .as_ref()
                .is_some_and(|branch| self.branch_names.contains(branch))
        {
            Some(Exclusion::LiveBranch)
        } else if self.conclusions.as_ref().is_some_and(|conclusions| {
            !run.conclusion
                .as_deref()
                .is_some_and(|conclusion| conclusions.contains(conclusion))
        }) {
            Some(Exclusion::UntargetedConclusion)
        } else {
            None
        }
    }
}

/// Why a run is kept regardless of its age.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// The run has not completed yet.
    InFlight,
    /// The run is associated with a pull request.
    PullRequest,
    /// The run was triggered from a branch that still exists.
    LiveBranch,
    /// The run concluded in a way that is not targeted for deletion.
    UntargetedConclusion,
}

impl Display for Exclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::InFlight => "not completed",
            Self::PullRequest => "associated with a pull request",
            Self::LiveBranch => "branch still exists",
            Self::UntargetedConclusion => "conclusion not targeted",
        })
    }
}

/// Partitions runs into deletion candidates and runs to keep.
///
/// Excluded runs are kept without looking at their age. Any other run is a candidate once it is
/// at least [`RetentionPolicy::retention_period`] old, measured against `clock` for each run.
pub fn classify<C>(runs: Vec<WorkflowRun>, policy: &RetentionPolicy, clock: &C) -> Partition
where
    C: Clock + ?Sized,
{
    let retention_period = policy.retention_period();
    let mut partition = Partition::default();

    for run in runs {
        if let Some(exclusion) = policy.exclusion(&run) {
            trace!("keeping run {}: {exclusion}", run.id);
            partition.skip_runs.push(run);
            continue;
        }

        let elapsed = clock.now().signed_duration_since(run.created_at);
        if elapsed >= retention_period {
            partition.del_runs.push(run);
        } else {
            trace!("keeping run {}: too young", run.id);
            partition.skip_runs.push(run);
        }
    }

    partition
}
