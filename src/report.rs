//! The sink receiving the outcome of each retention decision.
//!
//! See: [`Reporter`], [`TracingReporter`]

use std::fmt::Display;

use chrono::{DateTime, Utc};
use tracing::info;

/// Something that happened while pruning a repository.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetentionEvent {
    /// Runs without an associated workflow were found and are about to be deleted.
    OrphansFound {
        /// The number of orphaned runs.
        count: usize,
    },
    /// A run was deleted, or would have been in a dry run.
    Deleted {
        /// The deleted run.
        run_id: u64,
        /// The name of the workflow the run belonged to.
        workflow_name: String,
        /// Whether the deletion was only simulated.
        dry_run: bool,
    },
    /// A run was kept.
    Skipped {
        /// The kept run.
        run_id: u64,
        /// The name of the workflow the run belongs to.
        workflow_name: String,
        /// When the run was created.
        created_at: DateTime<Utc>,
    },
}

impl Display for RetentionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrphansFound { count } => write!(
                f,
                "found total of {count} workflow run(s) to delete without associated workflows"
            ),
            Self::Deleted {
                run_id,
                workflow_name,
                dry_run,
            } => {
                if *dry_run {
                    f.write_str("[dry-run] ")?;
                }
                write!(f, "delete run {run_id} of '{workflow_name}' workflow")
            }
            Self::Skipped {
                run_id,
                workflow_name,
                created_at,
            } => write!(
                f,
                "skipped '{workflow_name}' workflow run {run_id}: created at {}",
                created_at.to_rfc3339()
            ),
        }
    }
}

/// Receives [`RetentionEvent`]s as they happen.
pub trait Reporter {
    /// Records an event.
    fn report(&mut self, event: RetentionEvent);
}

/// Logs every event at the info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&mut self, event: RetentionEvent) {
        info!("{event}");
    }
}

impl Reporter for Vec<RetentionEvent> {
    fn report(&mut self, event: RetentionEvent) {
        self.push(event);
    }
}

impl<R> Reporter for &mut R
where
    R: Reporter + ?Sized,
{
    fn report(&mut self, event: RetentionEvent) {
        (**self).report(event);
    }
}
