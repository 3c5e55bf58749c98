//! Prunes the workflow runs of a repository.
//!
//! See: [`Janitor::run`]

use std::{collections::HashSet, fmt::Display};

use anyhow::Context as _;
use tracing::{debug, info};

use crate::{
    config::Options,
    github::ActionsApi,
    report::{Reporter, RetentionEvent},
    retention::{
        Clock, Partition, SystemClock, detect_orphans, filter_workflows, known_workflow_ids,
        plan_workflow,
    },
};

/// The name reported for orphaned runs that carry no name of their own.
const UNNAMED_WORKFLOW: &str = "unknown";

/// What a [`Janitor::run`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Runs deleted, or reported in a dry run, because their workflow no longer exists.
    pub orphans_deleted: usize,
    /// Runs of existing workflows deleted, or reported in a dry run.
    pub deleted: usize,
    /// Runs kept.
    pub skipped: usize,
    /// Workflows whose runs were judged.
    pub workflows_processed: usize,
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "deleted {} orphaned run(s) and {} run(s) of {} workflow(s), kept {} run(s)",
            self.orphans_deleted, self.deleted, self.workflows_processed, self.skipped
        )
    }
}

/// Applies [`Options`] to a repository through an [`ActionsApi`].
#[derive(Debug)]
pub struct Janitor<A, C = SystemClock> {
    api: A,
    options: Options,
    clock: C,
}

impl<A> Janitor<A>
where
    A: ActionsApi,
{
    /// Creates a janitor measuring run ages against the system time.
    pub const fn new(api: A, options: Options) -> Self {
        Self {
            api,
            options,
            clock: SystemClock,
        }
    }
}

impl<A, C> Janitor<A, C>
where
    A: ActionsApi,
    C: Clock,
{
    /// Replaces the clock run ages are measured against.
    pub fn with_clock<D>(self, clock: D) -> Janitor<A, D>
    where
        D: Clock,
    {
        Janitor {
            api: self.api,
            options: self.options,
            clock,
        }
    }

    /// The collaborator this janitor reads and deletes through.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// The options this janitor applies.
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Deletes orphaned runs, then the runs of every selected workflow that the options allow
    /// to delete, reporting each decision to `reporter`.
    ///
    /// Deletions happen one at a time, and in a dry run are only reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid, or as soon as listing or deleting fails.
    pub async fn run<R>(&self, reporter: &mut R) -> anyhow::Result<Summary>
    where
        R: Reporter + ?Sized,
    {
        self.options.validate()?;
        let options = &self.options;
        let mut summary = Summary::default();

        let workflows = self
            .api
            .list_workflows()
            .await
            .context("failed to list workflows")?;
        debug!("found {} workflow(s) in {}", workflows.len(), options.repository);

        let all_runs = self.api.list_runs().await.context("failed to list workflow runs")?;
        let orphans = detect_orphans(all_runs, &known_workflow_ids(&workflows));
        reporter.report(RetentionEvent::OrphansFound {
            count: orphans.len(),
        });
        for run in &orphans {
            let name = run.name.as_deref().unwrap_or(UNNAMED_WORKFLOW);
            self.delete(run.id, name, reporter).await?;
            summary.orphans_deleted += 1;
        }

        let workflows = filter_workflows(
            workflows,
            options.delete_workflow_pattern.as_deref(),
            options.delete_workflow_by_state_pattern.as_deref(),
        );

        let branch_names: HashSet<String> = if options.check_branch_existence {
            self.api
                .list_branch_names()
                .await
                .context("failed to list branches")?
                .into_iter()
                .collect()
        } else {
            HashSet::new()
        };
        let policy = options.policy(branch_names);

        for workflow in &workflows {
            let runs = self
                .api
                .list_workflow_runs(workflow.id)
                .await
                .with_context(|| format!("failed to list runs of workflow {workflow}"))?;
            debug!("judging {} run(s) of workflow {workflow}", runs.len());

            let Partition {
                del_runs,
                skip_runs,
            } = plan_workflow(runs, &policy, &self.clock);

            for run in &del_runs {
                self.delete(run.id, &workflow.name, reporter).await?;
                summary.deleted += 1;
            }

            for run in skip_runs {
                reporter.report(RetentionEvent::Skipped {
                    run_id: run.id,
                    workflow_name: workflow.name.clone(),
                    created_at: run.created_at,
                });
                summary.skipped += 1;
            }

            summary.workflows_processed += 1;
        }

        info!("{summary}");
        Ok(summary)
    }

    async fn delete<R>(&self, run_id: u64, workflow_name: &str, reporter: &mut R) -> anyhow::Result<()>
    where
        R: Reporter + ?Sized,
    {
        if !self.options.dry_run {
            self.api
                .delete_run(run_id)
                .await
                .with_context(|| format!("failed to delete run {run_id} of '{workflow_name}' workflow"))?;
        }

        reporter.report(RetentionEvent::Deleted {
            run_id,
            workflow_name: workflow_name.to_owned(),
            dry_run: self.options.dry_run,
        });
        Ok(())
    }
}
