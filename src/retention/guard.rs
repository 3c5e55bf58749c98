//! Guarantees a minimum number of runs survive deletion.

use tracing::debug;

use super::Partition;

/// Spares the newest `keep_minimum_runs` deletion candidates by moving them to the kept runs.
///
/// Candidates are ordered by ascending id, which stands in for creation order. The partition is
/// returned unchanged when there are no more candidates than `keep_minimum_runs`. Kept runs are
/// never moved to deletion.
pub fn apply_floor(partition: Partition, keep_minimum_runs: usize) -> Partition {
    let Partition {
        mut del_runs,
        mut skip_runs,
    } = partition;

    if del_runs.len() > keep_minimum_runs {
        del_runs.sort_by_key(|run| run.id);
        let spared = del_runs.split_off(del_runs.len() - keep_minimum_runs);
        debug!(
            "sparing {} of {} deletion candidate(s) to keep at least {keep_minimum_runs} run(s)",
            spared.len(),
            del_runs.len() + spared.len(),
        );
        skip_runs.extend(spared);
    }

    Partition {
        del_runs,
        skip_runs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone as _, Utc};

    use crate::workflow::WorkflowRun;

    fn run(id: u64) -> WorkflowRun {
        WorkflowRun {
            id,
            name: None,
            workflow_id: 1,
            status: String::from("completed"),
            conclusion: Some(String::from("success")),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            head_branch: None,
            pull_requests: Vec::new(),
        }
    }

    fn partition(del: &[u64], skip: &[u64]) -> Partition {
        Partition {
            del_runs: del.iter().copied().map(run).collect(),
            skip_runs: skip.iter().copied().map(run).collect(),
        }
    }

    fn ids(runs: &[WorkflowRun]) -> Vec<u64> {
        runs.iter().map(|run| run.id).collect()
    }

    #[test]
    fn spares_the_largest_ids() {
        let guarded = apply_floor(partition(&[5, 1, 4, 2, 3], &[9]), 2);
        assert_eq!(ids(&guarded.del_runs), [1, 2, 3]);
        assert_eq!(ids(&guarded.skip_runs), [9, 4, 5]);
    }

    #[test]
    fn unchanged_up_to_the_floor() {
        let guarded = apply_floor(partition(&[3, 1], &[7]), 2);
        assert_eq!(ids(&guarded.del_runs), [3, 1]);
        assert_eq!(ids(&guarded.skip_runs), [7]);

        let guarded = apply_floor(partition(&[3], &[]), 5);
        assert_eq!(ids(&guarded.del_runs), [3]);
        assert!(guarded.skip_runs.is_empty());
    }

    #[test]
    fn one_above_the_floor_deletes_the_oldest() {
        let guarded = apply_floor(partition(&[8, 6, 7], &[]), 2);
        assert_eq!(ids(&guarded.del_runs), [6]);
        assert_eq!(ids(&guarded.skip_runs), [7, 8]);
    }

    #[test]
    fn zero_floor_deletes_every_candidate() {
        let guarded = apply_floor(partition(&[2, 1], &[3]), 0);
        assert_eq!(ids(&guarded.del_runs), [1, 2]);
        assert_eq!(ids(&guarded.skip_runs), [3]);
    }

    #[test]
    fn never_deletes_kept_runs() {
        let guarded = apply_floor(partition(&[], &[1, 2, 3]), 0);
        assert!(guarded.del_runs.is_empty());
        assert_eq!(ids(&guarded.skip_runs), [1, 2, 3]);
    }
}
