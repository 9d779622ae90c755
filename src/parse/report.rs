use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use crate::model::config::ReportConfig;
use crate::model::task::ParsedTask;
use crate::parse::budget::parse_amount;
use crate::parse::date::{parse_flexible_date, start_from_end};
use crate::parse::table::{TableSection, parse_table_from_lines, split_row};

/// Phase name used when a row has no phase and nothing to carry down
pub const DEFAULT_PHASE: &str = "General";

/// Everything after this line in a full-analysis report is ignored
const FULL_ANALYSIS_TERMINATOR: &str = "Ready for the next prompt 20";

const FINANCIAL_MILESTONE: &str = "financial milestone";

static SELECTED_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"?isSelected"?\s*:\s*"?true\b"#).expect("valid selected-flag regex")
});

static RENOVATION_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"?isRenovation"?\s*:\s*"?true\b"#).expect("valid renovation-flag regex")
});

static RENOVATION_TRAILER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ready for the next renovation prompt").expect("valid trailer regex")
});

/// `Phase (R-2): Kitchen Demolition`, possibly under `#`/`**` decoration
static RENOVATION_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)phase\s*\(\s*(R-\d+)\s*\)\s*[:\-–]\s*(.+)$").expect("valid heading regex")
});

static RENOVATION_PHASE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bR-\d+").expect("valid phase id regex"));

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json\s*(.*?)```").expect("valid fenced json regex")
});

/// The three report shapes produced upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportDialect {
    /// User-selected task list with forward-filled phases
    Selected,
    /// Renovation plan keyed by `R-n` phase IDs
    Renovation,
    /// Full construction analysis (the default)
    FullAnalysis,
}

impl std::fmt::Display for ReportDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportDialect::Selected => write!(f, "selected"),
            ReportDialect::Renovation => write!(f, "renovation"),
            ReportDialect::FullAnalysis => write!(f, "full-analysis"),
        }
    }
}

/// Result of parsing one report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedReport {
    pub dialect: ReportDialect,
    /// Grouped by phase in discovery order, source order within a phase
    pub tasks: Vec<ParsedTask>,
}

/// Dialect-independent cells of a schedule row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCells {
    pub task: String,
    pub duration: String,
    pub start: String,
    pub end: String,
    pub cost: String,
}

/// A table row as read by one of the dialect parsers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialectRow {
    Selected {
        phase: String,
        cells: RowCells,
    },
    Renovation {
        task_id: String,
        phase_id: Option<String>,
        phase: String,
        cells: RowCells,
    },
    FullAnalysis {
        phase: String,
        cells: RowCells,
    },
}

impl DialectRow {
    fn parts(self) -> (String, RowCells) {
        match self {
            DialectRow::Selected { phase, cells }
            | DialectRow::Renovation { phase, cells, .. }
            | DialectRow::FullAnalysis { phase, cells } => (phase, cells),
        }
    }

    /// Converge to the canonical record. `None` if the row has no task name.
    ///
    /// A missing start is inferred as `end - duration` days when both are known;
    /// a missing end is left blank for the schedule builder.
    pub fn into_parsed(self) -> Option<ParsedTask> {
        let (phase, cells) = self.parts();
        let task = strip_outer_bold(&cells.task);
        if task.is_empty() {
            return None;
        }

        let duration_days = parse_duration_days(&cells.duration);
        let end = parse_flexible_date(&cells.end);
        let mut start = parse_flexible_date(&cells.start);
        if start.is_none()
            && let Some(end) = end
            && duration_days > 0
        {
            start = Some(start_from_end(end, duration_days));
        }

        let phase = if phase.is_empty() {
            DEFAULT_PHASE.to_string()
        } else {
            phase
        };

        Some(ParsedTask {
            phase,
            task,
            duration_days,
            start,
            end,
            cost: parse_amount(&cells.cost),
        })
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Classify a report by content inspection.
///
/// Embedded JSON flags are checked first (selected, then renovation); the
/// renovation trailer sentence is a fallback; everything else is a full
/// analysis.
pub fn detect_dialect(report: &str) -> ReportDialect {
    let (json_selected, json_renovation) = fenced_json_flags(report);
    if json_selected || SELECTED_FLAG.is_match(report) {
        ReportDialect::Selected
    } else if json_renovation || RENOVATION_FLAG.is_match(report) || RENOVATION_TRAILER.is_match(report)
    {
        ReportDialect::Renovation
    } else {
        ReportDialect::FullAnalysis
    }
}

/// Look for `isSelected` / `isRenovation` in fenced ```json blocks
fn fenced_json_flags(report: &str) -> (bool, bool) {
    let mut selected = false;
    let mut renovation = false;
    for caps in FENCED_JSON.captures_iter(report) {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&caps[1]) else {
            continue;
        };
        selected |= json_flag(&value, "isSelected");
        renovation |= json_flag(&value, "isRenovation");
    }
    (selected, renovation)
}

/// `"true"` or `true` at the top level or one object below it
fn json_flag(value: &serde_json::Value, key: &str) -> bool {
    let is_true = |v: &serde_json::Value| v.as_str() == Some("true") || v.as_bool() == Some(true);
    match value {
        serde_json::Value::Object(map) => {
            map.get(key).is_some_and(is_true)
                || map.values().any(|nested| {
                    nested
                        .as_object()
                        .and_then(|m| m.get(key))
                        .is_some_and(is_true)
                })
        }
        serde_json::Value::Array(items) => items.iter().any(|item| json_flag(item, key)),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Parse a raw report into canonical task records. Never fails: a report
/// with no recognizable tables yields an empty task list.
pub fn parse_report(report: &str, config: &ReportConfig) -> ParsedReport {
    let dialect = detect_dialect(report);
    tracing::debug!(%dialect, "detected report dialect");

    let lines: Vec<&str> = report.lines().collect();
    let rows = match dialect {
        ReportDialect::Selected => selected_rows(&lines, config),
        ReportDialect::Renovation => renovation_rows(&lines, config),
        ReportDialect::FullAnalysis => full_analysis_rows(&lines, config),
    };

    let mut phases: IndexMap<String, Vec<ParsedTask>> = IndexMap::new();
    for row in rows {
        match row.into_parsed() {
            Some(task) => phases.entry(task.phase.clone()).or_default().push(task),
            None => tracing::trace!("dropped row without a task name"),
        }
    }

    let tasks: Vec<ParsedTask> = phases.into_values().flatten().collect();
    tracing::debug!(%dialect, tasks = tasks.len(), "parsed report");
    ParsedReport { dialect, tasks }
}

// ---------------------------------------------------------------------------
// Forward-fill
// ---------------------------------------------------------------------------

/// Carry the last non-blank phase down into blank cells.
///
/// `carried` is the phase in effect before the first cell (for tables that
/// continue an earlier one). Returns one filled phase per input cell.
pub fn fill_phases<'a, I>(cells: I, carried: Option<String>) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    cells
        .into_iter()
        .scan(carried, |last, cell| {
            let cell = cell.trim();
            if !cell.is_empty() {
                *last = Some(cell.to_string());
            }
            Some(last.clone().unwrap_or_default())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Dialect parsers
// ---------------------------------------------------------------------------

/// Column layout shared by the phase/task dialects
struct ScheduleColumns {
    phase: Option<usize>,
    task: Option<usize>,
    duration: Option<usize>,
    start: Option<usize>,
    end: Option<usize>,
    cost: Option<usize>,
}

impl ScheduleColumns {
    fn locate(table: &TableSection) -> Self {
        ScheduleColumns {
            phase: find_column(table, |h| h == "phase" || h.starts_with("phase ")),
            task: find_column(table, |h| {
                h == "task" || h == "activity" || h.starts_with("task name") || h == "description"
            }),
            duration: find_column(table, |h| h.contains("duration")),
            start: find_column(table, |h| h.contains("start")),
            end: find_column(table, |h| {
                h == "end" || h.starts_with("end ") || h.contains("end date") || h.contains("finish")
            }),
            cost: find_column(table, |h| {
                h.contains("cost") || h.contains("budget") || h.contains("amount")
            }),
        }
    }

    fn cells(&self, table: &TableSection, row: &[String]) -> RowCells {
        RowCells {
            task: table.cell(row, self.task).to_string(),
            duration: table.cell(row, self.duration).to_string(),
            start: table.cell(row, self.start).to_string(),
            end: table.cell(row, self.end).to_string(),
            cost: table.cell(row, self.cost).to_string(),
        }
    }
}

fn find_column(table: &TableSection, pred: impl Fn(&str) -> bool) -> Option<usize> {
    table
        .headers
        .iter()
        .position(|h| pred(h.trim().to_lowercase().as_str()))
}

/// Does the header row start with the given cells (case-insensitive)?
fn header_starts_with(line: &str, expected: &[&str]) -> bool {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('|') || trimmed.contains("---") {
        return false;
    }
    let cells = split_row(trimmed);
    expected.len() <= cells.len()
        && expected
            .iter()
            .zip(&cells)
            .all(|(want, got)| got.to_lowercase().starts_with(want))
}

/// Walk the report collecting every table whose header satisfies `is_header`
fn collect_tables(lines: &[&str], is_header: impl Fn(&str) -> bool) -> Vec<TableSection> {
    let mut tables = Vec::new();
    let mut idx = 0;
    while let Some(header) = (idx..lines.len()).find(|&i| is_header(lines[i])) {
        match parse_table_from_lines(lines, header) {
            Some(table) => {
                idx = table.end_line.max(header + 1);
                tables.push(table);
            }
            None => {
                tracing::debug!(line = header, "skipped table without rows");
                idx = header + 1;
            }
        }
    }
    tables
}

fn is_denied(text: &str, config: &ReportConfig) -> bool {
    let lower = text.to_lowercase();
    config
        .denylist
        .iter()
        .any(|word| !word.is_empty() && lower.contains(&word.to_lowercase()))
}

/// Rows of phase/task tables with forward-filled phases, keeping only rows
/// `keep` accepts (checked on the raw phase and task cells)
fn phase_task_rows(
    tables: &[TableSection],
    keep: impl Fn(&str, &str) -> bool,
) -> Vec<(String, RowCells)> {
    let mut out = Vec::new();
    let mut carried: Option<String> = None;
    for table in tables {
        let columns = ScheduleColumns::locate(table);
        let kept: Vec<&Vec<String>> = table
            .rows
            .iter()
            .filter(|row| keep(table.cell(row, columns.phase), table.cell(row, columns.task)))
            .collect();
        let phases = fill_phases(
            kept.iter().map(|row| table.cell(row, columns.phase)),
            carried.take(),
        );
        carried = phases.last().cloned().filter(|p| !p.is_empty());
        for (row, phase) in kept.into_iter().zip(phases) {
            out.push((phase, columns.cells(table, row)));
        }
    }
    out
}

fn selected_rows(lines: &[&str], config: &ReportConfig) -> Vec<DialectRow> {
    let tables = collect_tables(lines, |line| header_starts_with(line, &["phase", "task"]));
    phase_task_rows(&tables, |phase, task| {
        !is_denied(phase, config) && !is_denied(task, config)
    })
    .into_iter()
    .map(|(phase, cells)| DialectRow::Selected { phase, cells })
    .collect()
}

fn full_analysis_rows(lines: &[&str], config: &ReportConfig) -> Vec<DialectRow> {
    let stop = lines
        .iter()
        .position(|line| line.contains(FULL_ANALYSIS_TERMINATOR))
        .unwrap_or(lines.len());
    let lines = &lines[..stop];

    let tables = collect_tables(lines, |line| {
        header_starts_with(line, &["phase", "task", "duration"])
    });
    phase_task_rows(&tables, |phase, task| {
        let milestone = phase.to_lowercase().contains(FINANCIAL_MILESTONE)
            || task.to_lowercase().contains(FINANCIAL_MILESTONE);
        !milestone && !is_denied(phase, config) && !is_denied(task, config)
    })
    .into_iter()
    .map(|(phase, cells)| DialectRow::FullAnalysis { phase, cells })
    .collect()
}

/// Phase-ID → phase-name map from `Phase (R-n): <name>` headings
pub fn renovation_phase_map(lines: &[&str]) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    for line in lines {
        let text = line.trim().trim_start_matches('#').trim();
        let text = text.replace("**", "");
        if let Some(caps) = RENOVATION_HEADING.captures(text.trim()) {
            let id = caps[1].to_uppercase();
            let name = caps[2].trim().trim_end_matches('*').trim().to_string();
            if !name.is_empty() {
                map.entry(id).or_insert(name);
            }
        }
    }
    map
}

fn renovation_rows(lines: &[&str], config: &ReportConfig) -> Vec<DialectRow> {
    let phase_names = renovation_phase_map(lines);
    let tables = collect_tables(lines, |line| header_starts_with(line, &["task id"]));

    let mut out = Vec::new();
    for table in &tables {
        let columns = ScheduleColumns::locate(table);
        let task_id_col = table.column_exact("task id").or(Some(0));
        // "Task ID" also contains "task"; the name lives in its own column
        let task_col = columns.task.or_else(|| {
            find_column(table, |h| h.contains("task") && !h.contains("id"))
        });
        let phase_col = find_column(table, |h| h.contains("phase"));

        for row in &table.rows {
            let phase_cell = table.cell(row, phase_col);
            if is_denied(phase_cell, config) || is_denied(table.cell(row, task_col), config) {
                continue;
            }
            let task_id = table.cell(row, task_id_col).to_string();
            let phase_id = RENOVATION_PHASE_ID
                .find(phase_cell)
                .or_else(|| RENOVATION_PHASE_ID.find(&task_id))
                .map(|m| m.as_str().to_uppercase());
            let phase = match (&phase_id, phase_names.get(phase_id.as_deref().unwrap_or(""))) {
                (_, Some(name)) => name.clone(),
                (Some(id), None) if phase_cell.is_empty() => id.clone(),
                _ => phase_cell.to_string(),
            };
            let mut cells = columns.cells(table, row);
            cells.task = table.cell(row, task_col).to_string();
            out.push(DialectRow::Renovation {
                task_id,
                phase_id,
                phase,
                cells,
            });
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Cell helpers
// ---------------------------------------------------------------------------

/// `**Name**` → `Name`
fn strip_outer_bold(s: &str) -> String {
    let mut name = s.trim();
    while let Some(rest) = name.strip_prefix("**") {
        name = rest.trim_start();
    }
    while let Some(rest) = name.strip_suffix("**") {
        name = rest.trim_end();
    }
    name.to_string()
}

/// First integer in the cell; week counts become days. 0 when absent.
pub fn parse_duration_days(cell: &str) -> i64 {
    let digits: String = cell
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let Ok(n) = digits.parse::<i64>() else {
        return 0;
    };
    if cell.to_lowercase().contains("week") {
        n.saturating_mul(7)
    } else {
        n
    }
}
