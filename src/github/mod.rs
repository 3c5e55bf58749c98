//! The record-management collaborator: listing workflows, runs and branches, and deleting runs.
//!
//! See: [`ActionsApi`]

#[cfg(feature = "client")]
mod client;
mod memory;

#[cfg(feature = "client")]
pub use client::*;
pub use memory::*;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::workflow::{Workflow, WorkflowRun};

/// Reads and deletes the workflow records of one repository.
///
/// Listings return every page. Implementations retry transient failures, such as rate limits, a
/// bounded number of times before giving up.
pub trait ActionsApi: Send + Sync {
    /// Lists every workflow defined in the repository.
    fn list_workflows(&self) -> BoxFuture<'_, anyhow::Result<Vec<Workflow>>>;

    /// Lists every run in the repository, of any workflow.
    fn list_runs(&self) -> BoxFuture<'_, anyhow::Result<Vec<WorkflowRun>>>;

    /// Lists every run of one workflow.
    fn list_workflow_runs(&self, workflow_id: u64)
    -> BoxFuture<'_, anyhow::Result<Vec<WorkflowRun>>>;

    /// Lists the names of the branches that currently exist.
    fn list_branch_names(&self) -> BoxFuture<'_, anyhow::Result<Vec<String>>>;

    /// Deletes one run.
    fn delete_run(&self, run_id: u64) -> BoxFuture<'_, anyhow::Result<()>>;
}

impl<T> ActionsApi for &T
where
    T: ActionsApi + ?Sized,
{
    fn list_workflows(&self) -> BoxFuture<'_, anyhow::Result<Vec<Workflow>>> {
        (**self).list_workflows()
    }

    fn list_runs(&self) -> BoxFuture<'_, anyhow::Result<Vec<WorkflowRun>>> {
        (**self).list_runs()
    }

    fn list_workflow_runs(
        &self,
        workflow_id: u64,
    ) -> BoxFuture<'_, anyhow::Result<Vec<WorkflowRun>>> {
        (**self).list_workflow_runs(workflow_id)
    }

    fn list_branch_names(&self) -> BoxFuture<'_, anyhow::Result<Vec<String>>> {
        (**self).list_branch_names()
    }

    fn delete_run(&self, run_id: u64) -> BoxFuture<'_, anyhow::Result<()>> {
        (**self).delete_run(run_id)
    }
}

/// An unsuccessful response from GitHub REST API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{method} {url} responded {status}: {message}")]
pub struct ApiError {
    /// The request method.
    pub method: String,
    /// The requested URL.
    pub url: String,
    /// The HTTP status code.
    pub status: u16,
    /// The message GitHub gave, or the canonical reason of the status.
    pub message: String,
}
