use chrono::NaiveDate;

use crate::model::group::TaskGroup;
use crate::parse::date::add_days;

/// Dates assigned to one chained task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainedSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Output of chaining a run of durations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainResult {
    pub spans: Vec<ChainedSpan>,
    /// First free day after the last span (the anchor if nothing was chained)
    pub next: NaiveDate,
}

/// Durations below one day still occupy a day
pub fn effective_days(days: i64) -> i64 {
    days.max(1)
}

/// Lay durations end to end from `anchor` with no gaps or overlaps.
pub fn chain_tasks(days: &[i64], anchor: NaiveDate) -> ChainResult {
    let mut current = anchor;
    let spans = days
        .iter()
        .map(|&d| {
            let start = current;
            let end = add_days(start, effective_days(d) - 1);
            current = add_days(end, 1);
            ChainedSpan { start, end }
        })
        .collect();
    ChainResult {
        spans,
        next: current,
    }
}

/// Chain the non-deleted tasks of one group from `anchor`; returns the next
/// free day. Deleted tasks keep whatever dates they had.
pub fn chain_group(group: &mut TaskGroup, anchor: NaiveDate) -> NaiveDate {
    let mut current = anchor;
    for task in group.active_tasks_mut() {
        task.days = effective_days(task.days);
        let span = chain_tasks(&[task.days], current);
        if let Some(first) = span.spans.first() {
            task.start = Some(first.start);
            task.end = Some(first.end);
        }
        current = span.next;
    }
    current
}

/// Chain every group end to end: each phase starts the day after the
/// previous phase's last end. Empty phases leave the anchor where it is.
pub fn chain_groups(groups: &mut [TaskGroup], anchor: NaiveDate) -> NaiveDate {
    let next = groups
        .iter_mut()
        .fold(anchor, |current, group| chain_group(group, current));
    tracing::debug!(groups = groups.len(), %anchor, %next, "chained schedule");
    next
}
