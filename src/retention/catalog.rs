//! Narrows the workflow catalog to the workflows whose runs are subject to retention.

use tracing::debug;

use super::PatternList;
use crate::workflow::Workflow;

/// The state pattern selecting workflows in any lifecycle state, compared case-insensitively.
pub const ALL_STATES: &str = "ALL";

/// Keeps only the workflows matching both patterns.
///
/// A non-empty `name_pattern` keeps workflows whose name or file name contains it. A
/// `state_pattern` other than [`ALL_STATES`] keeps workflows whose state is listed in it. An
/// absent pattern keeps everything.
pub fn filter_workflows(
    mut workflows: Vec<Workflow>,
    name_pattern: Option<&str>,
    state_pattern: Option<&str>,
) -> Vec<Workflow> {
    if let Some(pattern) = name_pattern.filter(|pattern| !pattern.is_empty()) {
        workflows.retain(|workflow| {
            workflow.name.contains(pattern) || workflow.filename().contains(pattern)
        });
        debug!("{} workflow(s) match name pattern '{pattern}'", workflows.len());
    }

    if let Some(states) = state_pattern.and_then(parse_state_pattern) {
        workflows.retain(|workflow| states.contains(&workflow.state));
        debug!("{} workflow(s) match states '{states}'", workflows.len());
    }

    workflows
}

/// Parses a state pattern into the states it selects, or [`None`] if it selects every state.
pub fn parse_state_pattern(pattern: &str) -> Option<PatternList> {
    if pattern.trim().eq_ignore_ascii_case(ALL_STATES) {
        None
    } else {
        PatternList::parse(pattern)
    }
}
