//! Detects runs whose workflow definition no longer exists.

use std::collections::HashSet;

use crate::workflow::{Workflow, WorkflowRun};

/// Collects the identifiers of every workflow in the catalog.
pub fn known_workflow_ids(workflows: &[Workflow]) -> HashSet<u64> {
    workflows.iter().map(|workflow| workflow.id).collect()
}

/// Returns the runs whose owning workflow is not among `known_workflow_ids`.
pub fn detect_orphans(runs: Vec<WorkflowRun>, known_workflow_ids: &HashSet<u64>) -> Vec<WorkflowRun> {
    runs.into_iter()
        .filter(|run| !known_workflow_ids.contains(&run.workflow_id))
        .collect()
}
