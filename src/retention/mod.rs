//! The retention decision logic.
//!
//! Orphaned runs are found across the whole repository with [`detect_orphans`]. The catalog is
//! narrowed with [`filter_workflows`], then each remaining workflow's runs are planned with
//! [`plan_workflow`], which runs [`classify`] followed by [`apply_floor`].

mod catalog;
mod classifier;
mod guard;
mod orphan;
mod pattern;

pub use catalog::*;
pub use classifier::*;
pub use guard::*;
pub use orphan::*;
pub use pattern::*;

use crate::workflow::WorkflowRun;

/// The runs of a workflow split into the ones to delete and the ones to keep.
///
/// Every run given to [`classify`] ends up in exactly one of the two sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// The runs to delete.
    pub del_runs: Vec<WorkflowRun>,
    /// The runs to keep.
    pub skip_runs: Vec<WorkflowRun>,
}

impl Partition {
    /// The total number of runs in both sets.
    pub fn len(&self) -> usize {
        self.del_runs.len() + self.skip_runs.len()
    }

    /// Returns `true` if the partition holds no runs.
    pub fn is_empty(&self) -> bool {
        self.del_runs.is_empty() && self.skip_runs.is_empty()
    }
}

/// Produces the final partition of one workflow's runs under `policy`.
pub fn plan_workflow<C>(runs: Vec<WorkflowRun>, policy: &RetentionPolicy, clock: &C) -> Partition
where
    C: Clock + ?Sized,
{
    apply_floor(classify(runs, policy, clock), policy.keep_minimum_runs)
}
