use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::config::EngineConfig;
use crate::model::group::{TaskGroup, find_group, find_group_mut};
use crate::ops::build::recompute_group;
use crate::parse::date::add_days;

/// Horizontal drag on a phase bar, in screen units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragGesture {
    pub group_id: u32,
    pub pixel_delta: f64,
    pub timeline_width_px: f64,
    pub total_visible_days: u32,
}

/// Convert a drag distance to whole days. Degenerate timeline geometry
/// (no width, no visible days, non-finite input) yields 0.
pub fn day_delta(gesture: &DragGesture) -> i64 {
    if !(gesture.timeline_width_px > 0.0)
        || gesture.total_visible_days == 0
        || !gesture.pixel_delta.is_finite()
    {
        return 0;
    }
    let pixels_per_day = gesture.timeline_width_px / f64::from(gesture.total_visible_days);
    (gesture.pixel_delta / pixels_per_day).round() as i64
}

/// A shift waiting for confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedShift {
    pub group_id: u32,
    pub group_title: String,
    pub day_delta: i64,
    pub new_start: Option<NaiveDate>,
    pub new_end: Option<NaiveDate>,
}

/// Before/after dates for one moved task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftedTask {
    pub task_id: i64,
    pub old_start: Option<NaiveDate>,
    pub old_end: Option<NaiveDate>,
    pub new_start: Option<NaiveDate>,
    pub new_end: Option<NaiveDate>,
}

/// Outcome of a committed shift
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftReport {
    pub group_id: u32,
    pub day_delta: i64,
    pub shifted: Vec<ShiftedTask>,
    /// `(subtask id, error)` for every notification that failed
    pub notify_failures: Vec<(i64, String)>,
}

/// Build the proposal for a drag. `None` when the drag rounds to zero days
/// or the group does not exist.
pub fn propose_shift(groups: &[TaskGroup], gesture: &DragGesture) -> Option<ProposedShift> {
    let delta = day_delta(gesture);
    if delta == 0 {
        return None;
    }
    let group = find_group(groups, gesture.group_id)?;
    Some(ProposedShift {
        group_id: group.id,
        group_title: group.title.clone(),
        day_delta: delta,
        new_start: group.start_date.map(|d| add_days(d, delta)),
        new_end: group.end_date.map(|d| add_days(d, delta)),
    })
}

/// Move every non-deleted task of the group by `delta` days. Dates that are
/// absent stay absent; durations and relative offsets are unchanged.
/// Aggregates are stale until the group is recomputed.
pub fn shift_group(group: &mut TaskGroup, delta: i64) -> Vec<ShiftedTask> {
    if delta == 0 {
        return Vec::new();
    }
    group
        .active_tasks_mut()
        .map(|task| {
            let old_start = task.start;
            let old_end = task.end;
            task.start = old_start.map(|d| add_days(d, delta));
            task.end = old_end.map(|d| add_days(d, delta));
            ShiftedTask {
                task_id: task.id,
                old_start,
                old_end,
                new_start: task.start,
                new_end: task.end,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Confirmation and notification seams
// ---------------------------------------------------------------------------

/// Asks whether a proposed shift should be applied
pub trait ShiftConfirmation {
    fn confirm(&mut self, shift: &ProposedShift, group: &TaskGroup) -> bool;
}

impl<F> ShiftConfirmation for F
where
    F: FnMut(&ProposedShift, &TaskGroup) -> bool,
{
    fn confirm(&mut self, shift: &ProposedShift, group: &TaskGroup) -> bool {
        self(shift, group)
    }
}

/// Confirms everything (non-interactive callers)
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl ShiftConfirmation for AutoConfirm {
    fn confirm(&mut self, _shift: &ProposedShift, _group: &TaskGroup) -> bool {
        true
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notifier rejected subtask {subtask_id}: {reason}")]
    Rejected { subtask_id: i64, reason: String },
    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}

/// Side channel told about every moved subtask
pub trait ShiftNotifier {
    fn notify_shifted(&mut self, job_id: i64, subtask_id: i64) -> Result<(), NotifyError>;
}

/// Notifier that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ShiftNotifier for NoopNotifier {
    fn notify_shifted(&mut self, _job_id: i64, _subtask_id: i64) -> Result<(), NotifyError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Applying
// ---------------------------------------------------------------------------

/// Commit a proposal: shift, recompute the group, then notify once per moved
/// task. Notification failures are collected, never rolled back.
/// `None` if the group no longer exists.
pub fn apply_shift(
    groups: &mut [TaskGroup],
    shift: &ProposedShift,
    job_id: i64,
    notifier: &mut dyn ShiftNotifier,
    today: NaiveDate,
    config: &EngineConfig,
) -> Option<ShiftReport> {
    let group = find_group_mut(groups, shift.group_id)?;
    let shifted = shift_group(group, shift.day_delta);
    recompute_group(group, today, config);
    tracing::info!(
        group = group.id,
        title = %group.title,
        days = shift.day_delta,
        tasks = shifted.len(),
        "shifted phase"
    );

    let mut notify_failures = Vec::new();
    for moved in &shifted {
        if let Err(e) = notifier.notify_shifted(job_id, moved.task_id) {
            tracing::warn!(job_id, subtask = moved.task_id, error = %e, "shift notification failed");
            notify_failures.push((moved.task_id, e.to_string()));
        }
    }

    Some(ShiftReport {
        group_id: shift.group_id,
        day_delta: shift.day_delta,
        shifted,
        notify_failures,
    })
}

/// Full drag flow: propose, ask, apply. Declining (or a zero-day drag)
/// leaves the model untouched and returns `None`.
pub fn reschedule(
    groups: &mut [TaskGroup],
    gesture: &DragGesture,
    confirmation: &mut dyn ShiftConfirmation,
    job_id: i64,
    notifier: &mut dyn ShiftNotifier,
    today: NaiveDate,
    config: &EngineConfig,
) -> Option<ShiftReport> {
    let proposal = propose_shift(groups, gesture)?;
    let group = find_group(groups, proposal.group_id)?;
    if !confirmation.confirm(&proposal, group) {
        tracing::debug!(group = proposal.group_id, "shift declined");
        return None;
    }
    apply_shift(groups, &proposal, job_id, notifier, today, config)
}
