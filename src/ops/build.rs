use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::config::EngineConfig;
use crate::model::group::{ScheduleStatus, TaskGroup};
use crate::model::record::SubtaskRecord;
use crate::model::task::{ParsedTask, Task, TaskStatus};
use crate::ops::chain::{chain_groups, effective_days};
use crate::parse::date::{
    add_days, format_optional_date, parse_flexible_date, span_days, start_from_end,
};

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// Build the phase model from parsed report rows.
///
/// Phases keep first-seen order. Group and task ids are assigned from 1.
/// When no row carries a date the whole schedule is chained from `anchor`;
/// otherwise known dates are kept and the gaps are filled (see `fill_dates`).
pub fn build_from_parsed(
    tasks: &[ParsedTask],
    anchor: NaiveDate,
    today: NaiveDate,
    config: &EngineConfig,
) -> Vec<TaskGroup> {
    let mut phases: IndexMap<&str, Vec<&ParsedTask>> = IndexMap::new();
    for row in tasks {
        phases.entry(row.phase.as_str()).or_default().push(row);
    }

    let mut next_task_id = 1;
    let mut groups: Vec<TaskGroup> = phases
        .into_iter()
        .zip(1u32..)
        .map(|((title, rows), group_id)| {
            let mut group = TaskGroup::new(group_id, title);
            for row in rows {
                let mut task = Task::new(next_task_id, row.task.clone(), row.duration_days)
                    .with_dates(row.start, row.end);
                task.cost = row.cost.unwrap_or_default();
                group.tasks.push(task);
                next_task_id += 1;
            }
            group
        })
        .collect();

    let has_dates = tasks.iter().any(|t| t.start.is_some() || t.end.is_some());
    if has_dates {
        fill_dates(&mut groups, anchor);
    } else {
        tracing::debug!(%anchor, "no dates in report, chaining from anchor");
        chain_groups(&mut groups, anchor);
    }

    recompute_all(&mut groups, today, config);
    tracing::debug!(groups = groups.len(), tasks = tasks.len(), "built schedule from report");
    groups
}

/// Fill missing dates in a partly dated schedule.
///
/// A start without an end gets `end = start + days - 1`. A task with neither
/// date continues the chain after the previous task's end (the anchor for
/// the very first task). An end without a start keeps the end and starts
/// the same way the report parser infers it; a zero duration starts on the
/// end day.
fn fill_dates(groups: &mut [TaskGroup], anchor: NaiveDate) {
    let mut cursor = anchor;
    for task in groups.iter_mut().flat_map(|g| g.active_tasks_mut()) {
        let days = effective_days(task.days);
        match (task.start, task.end) {
            (Some(start), None) => task.end = Some(add_days(start, days - 1)),
            (None, Some(end)) => {
                task.start = Some(if task.days > 0 {
                    start_from_end(end, task.days)
                } else {
                    end
                });
            }
            (None, None) => {
                task.start = Some(cursor);
                task.end = Some(add_days(cursor, days - 1));
                task.days = days;
            }
            (Some(_), Some(_)) => {}
        }
        if task.days <= 0
            && let (Some(start), Some(end)) = (task.start, task.end)
        {
            task.days = (span_days(start, end) + 1).max(1);
        }
        if let Some(end) = task.end {
            cursor = add_days(end, 1);
        }
    }
}

/// Build the phase model from persisted subtask records, grouped by
/// `groupTitle` in first-seen order.
pub fn build_from_records(
    records: &[SubtaskRecord],
    today: NaiveDate,
    config: &EngineConfig,
) -> Vec<TaskGroup> {
    let mut phases: IndexMap<&str, Vec<&SubtaskRecord>> = IndexMap::new();
    for record in records {
        phases
            .entry(record.group_title.as_str())
            .or_default()
            .push(record);
    }

    let mut groups: Vec<TaskGroup> = phases
        .into_iter()
        .zip(1u32..)
        .map(|((title, rows), group_id)| {
            let mut group = TaskGroup::new(group_id, title);
            group.tasks = rows.into_iter().map(task_from_record).collect();
            group
        })
        .collect();

    recompute_all(&mut groups, today, config);
    tracing::debug!(groups = groups.len(), records = records.len(), "built schedule from records");
    groups
}

fn task_from_record(record: &SubtaskRecord) -> Task {
    let start = parse_flexible_date(&record.start_date);
    let end = parse_flexible_date(&record.end_date)
        .or_else(|| start.map(|s| add_days(s, effective_days(record.days) - 1)));

    let mut task = Task::new(record.id, record.task.clone(), record.days).with_dates(start, end);
    task.set_status(TaskStatus::parse_lenient(&record.status));
    task.cost = record.cost;
    task.deleted = record.deleted;
    task.accepted = record.accepted.unwrap_or(false);
    task
}

/// Flatten the model back into persisted records (deleted tasks included)
pub fn to_records(groups: &[TaskGroup]) -> Vec<SubtaskRecord> {
    groups
        .iter()
        .flat_map(|group| {
            group.tasks.iter().map(move |task| SubtaskRecord {
                id: task.id,
                task: task.name.clone(),
                days: task.days,
                start_date: format_optional_date(task.start),
                end_date: format_optional_date(task.end),
                status: task.status.as_str().to_string(),
                cost: task.cost,
                deleted: task.deleted,
                accepted: Some(task.accepted),
                group_title: group.title.clone(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Case-insensitive keyword containment
pub fn is_critical(name: &str, keywords: &[String]) -> bool {
    let name = name.to_lowercase();
    keywords
        .iter()
        .any(|k| !k.is_empty() && name.contains(&k.to_lowercase()))
}

/// Percentage of non-deleted tasks that are completed, rounded. 0 when empty.
pub fn group_progress(group: &TaskGroup) -> u8 {
    let (total, completed) = group
        .active_tasks()
        .fold((0u32, 0u32), |(total, done), task| {
            (total + 1, done + u32::from(task.is_completed()))
        });
    if total == 0 {
        return 0;
    }
    (100.0 * f64::from(completed) / f64::from(total)).round() as u8
}

/// Evaluate schedule health for a date span.
///
/// Missing dates, finished work, and work not yet due are on-track. Past the
/// end with work left is behind. In between, progress is compared with the
/// share of the span already elapsed. `Ahead` is only reported when an
/// `ahead_threshold` is given and progress leads by at least that much.
pub fn schedule_status(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    progress: u8,
    today: NaiveDate,
    ahead_threshold: Option<f64>,
) -> ScheduleStatus {
    let (Some(start), Some(end)) = (start, end) else {
        return ScheduleStatus::OnTrack;
    };
    if progress >= 100 {
        return ScheduleStatus::OnTrack;
    }
    if today > end {
        return ScheduleStatus::Behind;
    }
    if today < start {
        return ScheduleStatus::OnTrack;
    }

    let total = span_days(start, end);
    if total <= 0 {
        // single-day span; today > end was handled above
        return ScheduleStatus::OnTrack;
    }
    let elapsed = span_days(start, today) as f64;
    let expected = (100.0 * elapsed / total as f64).min(100.0);
    let progress = f64::from(progress);

    if progress < expected {
        ScheduleStatus::Behind
    } else if let Some(threshold) = ahead_threshold
        && progress >= expected + threshold
    {
        ScheduleStatus::Ahead
    } else {
        ScheduleStatus::OnTrack
    }
}

/// Recompute a group's derived fields from its non-deleted tasks
pub fn recompute_group(group: &mut TaskGroup, today: NaiveDate, config: &EngineConfig) {
    for task in group.tasks.iter_mut() {
        task.is_critical = is_critical(&task.name, &config.critical.keywords);
        task.progress = task.status.implied_progress();
    }

    group.start_date = group.active_tasks().filter_map(|t| t.start).min();
    group.end_date = group.active_tasks().filter_map(|t| t.end).max();
    group.progress = group_progress(group);
    let critical = group.active_tasks().any(|t| t.is_critical);
    group.is_critical = critical;
    group.schedule_status = if group.is_empty() {
        ScheduleStatus::OnTrack
    } else {
        schedule_status(
            group.start_date,
            group.end_date,
            group.progress,
            today,
            config.status.ahead_threshold_percent,
        )
    };
}

pub fn recompute_all(groups: &mut [TaskGroup], today: NaiveDate, config: &EngineConfig) {
    for group in groups.iter_mut() {
        recompute_group(group, today, config);
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Whole-schedule rollup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub groups: usize,
    pub tasks: usize,
    pub completed_tasks: usize,
    pub deleted_tasks: usize,
    pub progress: u8,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub behind_groups: usize,
    pub critical_groups: usize,
    pub weather_groups: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
}

pub fn summarize(groups: &[TaskGroup]) -> ScheduleSummary {
    let active: Vec<&Task> = groups.iter().flat_map(|g| g.active_tasks()).collect();
    let completed = active.iter().filter(|t| t.is_completed()).count();
    let progress = if active.is_empty() {
        0
    } else {
        (100.0 * completed as f64 / active.len() as f64).round() as u8
    };

    ScheduleSummary {
        groups: groups.len(),
        tasks: active.len(),
        completed_tasks: completed,
        deleted_tasks: groups.iter().map(|g| g.tasks.len()).sum::<usize>() - active.len(),
        progress,
        start_date: groups.iter().filter_map(|g| g.start_date).min(),
        end_date: groups.iter().filter_map(|g| g.end_date).max(),
        behind_groups: groups
            .iter()
            .filter(|g| g.schedule_status == ScheduleStatus::Behind)
            .count(),
        critical_groups: groups.iter().filter(|g| g.is_critical).count(),
        weather_groups: groups.iter().filter(|g| g.has_weather_warning).count(),
        total_cost: active.iter().map(|t| t.cost).sum(),
    }
}
