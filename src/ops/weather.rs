use serde::Serialize;

use crate::model::config::WeatherConfig;
use crate::model::forecast::ForecastDay;
use crate::model::group::TaskGroup;
use crate::model::task::Task;

/// What the overlay flagged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub flagged_tasks: usize,
    pub flagged_groups: usize,
}

/// True when the task name names weather-sensitive work. Plain substring
/// matching, so numbered names like "1. Site prep" still match. The phase
/// title plays no part: indoor work inside an outdoor phase stays unflagged.
pub fn is_weather_sensitive(task_name: &str, config: &WeatherConfig) -> bool {
    let name = task_name.to_lowercase();
    config
        .sensitive_categories
        .iter()
        .map(|c| c.to_lowercase())
        .any(|c| !c.is_empty() && name.contains(&c))
}

/// Forecast days inside the task's span that carry rain risk
fn rain_days(task: &Task, forecast: &[ForecastDay], threshold: u8) -> usize {
    let (Some(start), Some(end)) = (task.start, task.end) else {
        return 0;
    };
    forecast
        .iter()
        .filter(|day| day.date >= start && day.date <= end)
        .filter(|day| day.is_rain_risk(threshold))
        .count()
}

pub fn rain_message(days: usize, task_name: &str) -> String {
    format!("Rain risk on {} day(s) during {}", days, task_name)
}

/// Annotate weather-sensitive tasks and their groups with rain risk.
///
/// All previous warnings are cleared first, so applying the same forecast
/// twice gives the same result. An empty forecast clears and flags nothing.
pub fn apply_weather_overlay(
    groups: &mut [TaskGroup],
    forecast: &[ForecastDay],
    config: &WeatherConfig,
) -> WeatherReport {
    let mut report = WeatherReport::default();

    for group in groups.iter_mut() {
        group.has_weather_warning = false;
        group.weather_warning_message = None;
        for task in group.tasks.iter_mut() {
            task.clear_weather_warning();
        }
        if forecast.is_empty() {
            continue;
        }

        let mut messages: Vec<String> = Vec::new();
        for task in group.active_tasks_mut() {
            if !is_weather_sensitive(&task.name, config) {
                continue;
            }
            let days = rain_days(task, forecast, config.rain_probability_threshold);
            if days == 0 {
                continue;
            }
            let message = rain_message(days, &task.name);
            task.has_weather_warning = true;
            task.weather_warning_message = Some(message.clone());
            report.flagged_tasks += 1;
            if !messages.contains(&message) {
                messages.push(message);
            }
        }

        if !messages.is_empty() {
            group.has_weather_warning = true;
            group.weather_warning_message = Some(messages.join("\n"));
            report.flagged_groups += 1;
        }
    }

    tracing::debug!(
        forecast_days = forecast.len(),
        tasks = report.flagged_tasks,
        groups = report.flagged_groups,
        "applied weather overlay"
    );
    report
}
