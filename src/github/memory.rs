use std::collections::HashSet;

use futures::{
    FutureExt as _,
    future::{BoxFuture, ready},
};
use parking_lot::Mutex;
use tracing::debug;

use super::{ActionsApi, ApiError};
use crate::workflow::{Workflow, WorkflowRun};

/// An [`ActionsApi`] over a snapshot held in memory.
///
/// Deleted runs disappear from later listings. Deleting a run that does not exist, or one marked
/// with [`Self::with_failing_delete`], fails like GitHub REST API would.
#[derive(Debug, Default)]
pub struct MemoryActions {
    workflows: Vec<Workflow>,
    runs: Mutex<Vec<WorkflowRun>>,
    branch_names: Vec<String>,
    failing_deletes: HashSet<u64>,
    deleted: Mutex<Vec<u64>>,
}

impl MemoryActions {
    /// Creates a snapshot of the given workflows and runs, without branches.
    pub fn new(workflows: Vec<Workflow>, runs: Vec<WorkflowRun>) -> Self {
        Self {
            workflows,
            runs: Mutex::new(runs),
            ..Self::default()
        }
    }

    /// Sets the names of the existing branches.
    #[must_use]
    pub fn with_branches<I, S>(mut self, branch_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branch_names = branch_names.into_iter().map(Into::into).collect();
        self
    }

    /// Makes deleting the given run fail with a server error.
    #[must_use]
    pub fn with_failing_delete(mut self, run_id: u64) -> Self {
        self.failing_deletes.insert(run_id);
        self
    }

    /// The ids of the deleted runs, in deletion order.
    pub fn deleted(&self) -> Vec<u64> {
        self.deleted.lock().clone()
    }

    /// The runs that have not been deleted.
    pub fn remaining_runs(&self) -> Vec<WorkflowRun> {
        self.runs.lock().clone()
    }

    fn delete(&self, run_id: u64) -> anyhow::Result<()> {
        let error = |status, message: &str| ApiError {
            method: String::from("DELETE"),
            url: format!("memory://actions/runs/{run_id}"),
            status,
            message: message.to_owned(),
        };

        if self.failing_deletes.contains(&run_id) {
            return Err(error(500, "Internal Server Error").into());
        }

        let mut runs = self.runs.lock();
        let index = runs
            .iter()
            .position(|run| run.id == run_id)
            .ok_or_else(|| error(404, "Not Found"))?;
        runs.remove(index);
        self.deleted.lock().push(run_id);
        debug!("deleted run {run_id} from memory");
        Ok(())
    }
}

impl ActionsApi for MemoryActions {
    fn list_workflows(&self) -> BoxFuture<'_, anyhow::Result<Vec<Workflow>>> {
        ready(Ok(self.workflows.clone())).boxed()
    }

    fn list_runs(&self) -> BoxFuture<'_, anyhow::Result<Vec<WorkflowRun>>> {
        ready(Ok(self.remaining_runs())).boxed()
    }

    fn list_workflow_runs(
        &self,
        workflow_id: u64,
    ) -> BoxFuture<'_, anyhow::Result<Vec<WorkflowRun>>> {
        let runs = self
            .runs
            .lock()
            .iter()
            .filter(|run| run.workflow_id == workflow_id)
            .cloned()
            .collect();
        ready(Ok(runs)).boxed()
    }

    fn list_branch_names(&self) -> BoxFuture<'_, anyhow::Result<Vec<String>>> {
        ready(Ok(self.branch_names.clone())).boxed()
    }

    fn delete_run(&self, run_id: u64) -> BoxFuture<'_, anyhow::Result<()>> {
        ready(self.delete(run_id)).boxed()
    }
}
