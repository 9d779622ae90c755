use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Task lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Delayed,
}

impl TaskStatus {
    /// The string stored in persisted subtask records
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Delayed => "delayed",
        }
    }

    /// Lenient parse of a stored status string. Unknown values are pending.
    pub fn parse_lenient(s: &str) -> TaskStatus {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "in_progress" | "active" | "started" => TaskStatus::InProgress,
            "completed" | "complete" | "done" => TaskStatus::Completed,
            "delayed" | "late" => TaskStatus::Delayed,
            _ => TaskStatus::Pending,
        }
    }

    /// Percent progress implied by this status
    pub fn implied_progress(self) -> u8 {
        match self {
            TaskStatus::Completed => 100,
            _ => 0,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled task inside a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Duration in calendar days
    pub days: i64,
    /// 0..=100
    pub progress: u8,
    pub status: TaskStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    pub deleted: bool,
    pub accepted: bool,
    pub is_critical: bool,
    pub has_weather_warning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_warning_message: Option<String>,
}

impl Task {
    /// Create a pending, undated task
    pub fn new(id: i64, name: impl Into<String>, days: i64) -> Self {
        Task {
            id,
            name: name.into(),
            start: None,
            end: None,
            days,
            progress: 0,
            status: TaskStatus::Pending,
            cost: Decimal::ZERO,
            deleted: false,
            accepted: false,
            is_critical: false,
            has_weather_warning: false,
            weather_warning_message: None,
        }
    }

    /// Builder-style date setter
    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Set status and keep `progress` consistent with it
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.progress = status.implied_progress();
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Drop any weather annotation
    pub fn clear_weather_warning(&mut self) {
        self.has_weather_warning = false;
        self.weather_warning_message = None;
    }
}

/// Canonical row produced by the report parser, independent of dialect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTask {
    pub phase: String,
    pub task: String,
    pub duration_days: i64,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
}
