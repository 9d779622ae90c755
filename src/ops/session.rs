use chrono::NaiveDate;

use crate::model::config::EngineConfig;
use crate::model::forecast::ForecastDay;
use crate::model::group::TaskGroup;
use crate::model::task::{Task, TaskStatus};
use crate::ops::build::{recompute_all, recompute_group};
use crate::ops::reschedule::{
    DragGesture, ProposedShift, ShiftNotifier, ShiftReport, apply_shift, propose_shift,
};
use crate::ops::weather::{WeatherReport, apply_weather_overlay};

/// Error type for session mutations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no shift is staged")]
    NothingStaged,
    #[error("group not found: {0}")]
    GroupNotFound(u32),
    #[error("task not found: {0}")]
    TaskNotFound(i64),
    #[error("staged shift is stale (staged at version {staged}, now {current})")]
    StaleShift { staged: u64, current: u64 },
}

/// What changed, sent to observers after every mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleEvent {
    Replaced { version: u64 },
    Shifted { version: u64, group_id: u32, day_delta: i64 },
    WeatherApplied { version: u64, flagged_tasks: usize },
    TaskUpdated { version: u64, task_id: i64 },
}

impl ScheduleEvent {
    pub fn version(&self) -> u64 {
        match self {
            ScheduleEvent::Replaced { version }
            | ScheduleEvent::Shifted { version, .. }
            | ScheduleEvent::WeatherApplied { version, .. }
            | ScheduleEvent::TaskUpdated { version, .. } => *version,
        }
    }
}

/// Receives schedule change notifications
pub trait ScheduleObserver {
    fn on_event(&mut self, event: &ScheduleEvent, groups: &[TaskGroup]);
}

impl<F> ScheduleObserver for F
where
    F: FnMut(&ScheduleEvent, &[TaskGroup]),
{
    fn on_event(&mut self, event: &ScheduleEvent, groups: &[TaskGroup]) {
        self(event, groups)
    }
}

struct StagedShift {
    version: u64,
    shift: ProposedShift,
}

/// Schedule state for one job: the phase model, a version that increases
/// on every mutation, at most one staged shift, and the observers to tell.
pub struct ScheduleSession {
    job_id: i64,
    groups: Vec<TaskGroup>,
    version: u64,
    pending: Option<StagedShift>,
    observers: Vec<Box<dyn ScheduleObserver>>,
    config: EngineConfig,
    today: NaiveDate,
}

impl ScheduleSession {
    pub fn new(
        job_id: i64,
        groups: Vec<TaskGroup>,
        config: EngineConfig,
        today: NaiveDate,
    ) -> Self {
        ScheduleSession {
            job_id,
            groups,
            version: 0,
            pending: None,
            observers: Vec::new(),
            config,
            today,
        }
    }

    pub fn job_id(&self) -> i64 {
        self.job_id
    }

    pub fn groups(&self) -> &[TaskGroup] {
        &self.groups
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn pending(&self) -> Option<&ProposedShift> {
        self.pending.as_ref().map(|staged| &staged.shift)
    }

    pub fn subscribe(&mut self, observer: Box<dyn ScheduleObserver>) {
        self.observers.push(observer);
    }

    /// Move the evaluation date and recompute statuses
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
        recompute_all(&mut self.groups, self.today, &self.config);
    }

    fn bump(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    fn emit(&mut self, event: ScheduleEvent) {
        for observer in self.observers.iter_mut() {
            observer.on_event(&event, &self.groups);
        }
    }

    /// Replace the whole model (a rebuild from a new report or record list).
    /// Any staged shift is discarded.
    pub fn replace_groups(&mut self, mut groups: Vec<TaskGroup>) {
        recompute_all(&mut groups, self.today, &self.config);
        self.groups = groups;
        self.pending = None;
        let version = self.bump();
        self.emit(ScheduleEvent::Replaced { version });
    }

    /// Stage the shift a drag implies. Returns `None` (and stages nothing)
    /// for a zero-day drag or an unknown group. Replaces any earlier staging.
    pub fn stage_drag(&mut self, gesture: &DragGesture) -> Option<&ProposedShift> {
        let shift = propose_shift(&self.groups, gesture)?;
        tracing::debug!(group = shift.group_id, days = shift.day_delta, "staged shift");
        self.pending = Some(StagedShift {
            version: self.version,
            shift,
        });
        self.pending()
    }

    /// Drop the staged shift without touching the model
    pub fn cancel_pending(&mut self) -> Option<ProposedShift> {
        self.pending.take().map(|staged| staged.shift)
    }

    /// Apply the staged shift, then notify observers and the external
    /// notifier. A shift staged before a later mutation is rejected.
    pub fn confirm_pending(
        &mut self,
        notifier: &mut dyn ShiftNotifier,
    ) -> Result<ShiftReport, SessionError> {
        let staged = self.pending.take().ok_or(SessionError::NothingStaged)?;
        if staged.version != self.version {
            return Err(SessionError::StaleShift {
                staged: staged.version,
                current: self.version,
            });
        }
        let report = apply_shift(
            &mut self.groups,
            &staged.shift,
            self.job_id,
            notifier,
            self.today,
            &self.config,
        )
        .ok_or(SessionError::GroupNotFound(staged.shift.group_id))?;

        let version = self.bump();
        self.emit(ScheduleEvent::Shifted {
            version,
            group_id: report.group_id,
            day_delta: report.day_delta,
        });
        Ok(report)
    }

    pub fn apply_weather(&mut self, forecast: &[ForecastDay]) -> WeatherReport {
        let report = apply_weather_overlay(&mut self.groups, forecast, &self.config.weather);
        let version = self.bump();
        self.emit(ScheduleEvent::WeatherApplied {
            version,
            flagged_tasks: report.flagged_tasks,
        });
        report
    }

    fn group_index_of_task(&self, task_id: i64) -> Result<usize, SessionError> {
        self.groups
            .iter()
            .position(|g| g.find_task(task_id).is_some())
            .ok_or(SessionError::TaskNotFound(task_id))
    }

    fn update_task(
        &mut self,
        task_id: i64,
        change: impl FnOnce(&mut Task),
    ) -> Result<(), SessionError> {
        let idx = self.group_index_of_task(task_id)?;
        let group = &mut self.groups[idx];
        if let Some(task) = group.find_task_mut(task_id) {
            change(task);
        }
        recompute_group(group, self.today, &self.config);
        let version = self.bump();
        self.emit(ScheduleEvent::TaskUpdated { version, task_id });
        Ok(())
    }

    pub fn set_task_status(&mut self, task_id: i64, status: TaskStatus) -> Result<(), SessionError> {
        self.update_task(task_id, |task| task.set_status(status))
    }

    /// Soft delete: the task stays in the model but leaves every aggregate
    pub fn delete_task(&mut self, task_id: i64) -> Result<(), SessionError> {
        self.update_task(task_id, |task| task.deleted = true)
    }

    pub fn into_groups(self) -> Vec<TaskGroup> {
        self.groups
    }
}
