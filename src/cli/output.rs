use serde::Serialize;

use crate::model::group::{ScheduleStatus, TaskGroup};
use crate::model::task::{ParsedTask, Task, TaskStatus};
use crate::ops::build::ScheduleSummary;
use crate::ops::reschedule::{ProposedShift, ShiftReport};
use crate::parse::budget::BudgetLine;
use crate::parse::date::format_optional_date;
use crate::parse::report::ReportDialect;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson {
    pub id: i64,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub days: i64,
    pub progress: u8,
    pub status: TaskStatus,
    pub cost: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    pub is_critical: bool,
    pub has_weather_warning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_warning_message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupJson {
    pub id: u32,
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub progress: u8,
    pub is_critical: bool,
    pub schedule_status: ScheduleStatus,
    pub has_weather_warning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_warning_message: Option<String>,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct ScheduleJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<ReportDialect>,
    pub summary: &'a ScheduleSummary,
    pub groups: Vec<GroupJson>,
}

#[derive(Serialize)]
pub struct BudgetJson<'a> {
    pub lines: &'a [BudgetLine],
    pub total: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftJson<'a> {
    pub proposal: &'a ProposedShift,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<&'a ShiftReport>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn decimal_to_f64(value: rust_decimal::Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    value.to_f64().unwrap_or_default()
}

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id,
        name: task.name.clone(),
        start_date: format_optional_date(task.start),
        end_date: format_optional_date(task.end),
        days: task.days,
        progress: task.progress,
        status: task.status,
        cost: decimal_to_f64(task.cost),
        deleted: task.deleted,
        is_critical: task.is_critical,
        has_weather_warning: task.has_weather_warning,
        weather_warning_message: task.weather_warning_message.clone(),
    }
}

pub fn group_to_json(group: &TaskGroup) -> GroupJson {
    GroupJson {
        id: group.id,
        title: group.title.clone(),
        start_date: format_optional_date(group.start_date),
        end_date: format_optional_date(group.end_date),
        progress: group.progress,
        is_critical: group.is_critical,
        schedule_status: group.schedule_status,
        has_weather_warning: group.has_weather_warning,
        weather_warning_message: group.weather_warning_message.clone(),
        tasks: group.tasks.iter().map(task_to_json).collect(),
    }
}

pub fn budget_to_json(lines: &[BudgetLine], total: rust_decimal::Decimal) -> BudgetJson<'_> {
    BudgetJson {
        lines,
        total: decimal_to_f64(total),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

fn span_text(start: Option<chrono::NaiveDate>, end: Option<chrono::NaiveDate>) -> String {
    match (start, end) {
        (None, None) => "(undated)".to_string(),
        _ => format!(
            "{}..{}",
            or_dash(format_optional_date(start)),
            or_dash(format_optional_date(end))
        ),
    }
}

fn or_dash(s: String) -> String {
    if s.is_empty() { "-".to_string() } else { s }
}

/// `#1 Foundation  2024-01-01..2024-01-18  50%  on-track  [critical]`
pub fn format_group_line(group: &TaskGroup) -> String {
    let mut line = format!(
        "#{} {}  {}  {}%  {}",
        group.id,
        group.title,
        span_text(group.start_date, group.end_date),
        group.progress,
        group.schedule_status
    );
    if group.is_critical {
        line.push_str("  [critical]");
    }
    if group.has_weather_warning {
        line.push_str("  [rain]");
    }
    line
}

/// `    3  Pour slab  4d  2024-01-01..2024-01-04  pending`
pub fn format_task_line(task: &Task) -> String {
    let mut line = format!(
        "    {}  {}  {}d  {}  {}",
        task.id,
        task.name,
        task.days,
        span_text(task.start, task.end),
        task.status
    );
    if task.deleted {
        line.push_str("  (deleted)");
    }
    if task.is_critical {
        line.push_str("  [critical]");
    }
    if let Some(ref message) = task.weather_warning_message {
        line.push_str("  ! ");
        line.push_str(message);
    }
    line
}

pub fn format_schedule(groups: &[TaskGroup], with_tasks: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for group in groups {
        lines.push(format_group_line(group));
        if with_tasks {
            lines.extend(group.tasks.iter().map(format_task_line));
        }
    }
    lines
}

pub fn format_summary(summary: &ScheduleSummary) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{} phases, {} tasks ({} completed, {} deleted), {}% complete",
            summary.groups,
            summary.tasks,
            summary.completed_tasks,
            summary.deleted_tasks,
            summary.progress
        ),
        format!("span: {}", span_text(summary.start_date, summary.end_date)),
    ];
    if summary.behind_groups > 0 {
        lines.push(format!("behind: {} phase(s)", summary.behind_groups));
    }
    if summary.weather_groups > 0 {
        lines.push(format!("rain risk: {} phase(s)", summary.weather_groups));
    }
    if !summary.total_cost.is_zero() {
        lines.push(format!("cost: {}", summary.total_cost));
    }
    lines
}

pub fn format_parsed_row(row: &ParsedTask) -> String {
    format!(
        "{}  |  {}  |  {}d  |  {}",
        row.phase,
        row.task,
        row.duration_days,
        span_text(row.start, row.end)
    )
}

pub fn format_budget_line(line: &BudgetLine) -> String {
    let amount = line
        .amount()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());
    if line.section.is_empty() {
        format!("{}  {}", line.item, amount)
    } else {
        format!("[{}] {}  {}", line.section, line.item, amount)
    }
}

pub fn format_proposal(proposal: &ProposedShift) -> String {
    format!(
        "shift #{} {} by {:+} day(s): {}",
        proposal.group_id,
        proposal.group_title,
        proposal.day_delta,
        span_text(proposal.new_start, proposal.new_end)
    )
}
