use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::task::Task;

/// Phase-level schedule health
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleStatus {
    #[default]
    OnTrack,
    Behind,
    Ahead,
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleStatus::OnTrack => write!(f, "on-track"),
            ScheduleStatus::Behind => write!(f, "behind"),
            ScheduleStatus::Ahead => write!(f, "ahead"),
        }
    }
}

/// A phase of the project and its ordered tasks.
///
/// The aggregate fields (`start_date`, `end_date`, `progress`, `is_critical`,
/// `schedule_status`) are derived from the non-deleted tasks and are only
/// valid after `ops::build::recompute_group` has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskGroup {
    /// 1-based id in discovery order
    pub id: u32,
    pub title: String,
    pub tasks: Vec<Task>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub progress: u8,
    pub is_critical: bool,
    pub schedule_status: ScheduleStatus,
    pub has_weather_warning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_warning_message: Option<String>,
}

impl TaskGroup {
    /// Empty group with neutral aggregates
    pub fn new(id: u32, title: impl Into<String>) -> Self {
        TaskGroup {
            id,
            title: title.into(),
            tasks: Vec::new(),
            start_date: None,
            end_date: None,
            progress: 0,
            is_critical: false,
            schedule_status: ScheduleStatus::OnTrack,
            has_weather_warning: false,
            weather_warning_message: None,
        }
    }

    /// Tasks that participate in aggregates
    pub fn active_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.deleted)
    }

    pub fn active_tasks_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.iter_mut().filter(|t| !t.deleted)
    }

    pub fn is_empty(&self) -> bool {
        self.active_tasks().next().is_none()
    }

    pub fn find_task(&self, task_id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn find_task_mut(&mut self, task_id: i64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }
}

/// Find a group by id
pub fn find_group(groups: &[TaskGroup], group_id: u32) -> Option<&TaskGroup> {
    groups.iter().find(|g| g.id == group_id)
}

/// Find a mutable group by id
pub fn find_group_mut(groups: &mut [TaskGroup], group_id: u32) -> Option<&mut TaskGroup> {
    groups.iter_mut().find(|g| g.id == group_id)
}
