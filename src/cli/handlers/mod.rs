use std::path::Path;

use chrono::{Local, NaiveDate};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::record_io::{self, read_forecast, read_records, read_text, write_records};
use crate::model::config::EngineConfig;
use crate::model::group::TaskGroup;
use crate::ops::build::{self, summarize};
use crate::ops::chain::chain_groups;
use crate::ops::reschedule::{DragGesture, NotifyError, ShiftNotifier};
use crate::ops::session::ScheduleSession;
use crate::ops::weather::apply_weather_overlay;
use crate::parse::budget::{budget_total, extract_budget};
use crate::parse::date::parse_flexible_date;
use crate::parse::report::parse_report;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Settings shared by every command
struct Context {
    json: bool,
    config: EngineConfig,
    today: NaiveDate,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let cwd = std::env::current_dir()?;
    let config = config_io::load_config(cli.config.as_deref(), &cwd)?;
    let today = match cli.today.as_deref() {
        Some(s) => parse_date_arg(s)?,
        None => Local::now().date_naive(),
    };
    let ctx = Context {
        json: cli.json,
        config,
        today,
    };

    match cli.command {
        Commands::Parse(args) => cmd_parse(args, &ctx),
        Commands::Budget(args) => cmd_budget(args, &ctx),
        Commands::Chain(args) => cmd_chain(args, &ctx),
        Commands::Status(args) => cmd_status(args, &ctx),
        Commands::Shift(args) => cmd_shift(args, &ctx),
        Commands::Weather(args) => cmd_weather(args, &ctx),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_flexible_date(s).ok_or_else(|| format!("invalid date: {}", s))
}

fn load_groups(path: &Path, ctx: &Context) -> Result<Vec<TaskGroup>, record_io::RecordIoError> {
    let records = read_records(path)?;
    Ok(build::build_from_records(&records, ctx.today, &ctx.config))
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn print_schedule(
    groups: &[TaskGroup],
    dialect: Option<crate::parse::report::ReportDialect>,
    with_tasks: bool,
    json: bool,
) -> CmdResult {
    let summary = summarize(groups);
    if json {
        let out = ScheduleJson {
            dialect,
            summary: &summary,
            groups: groups.iter().map(group_to_json).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        if let Some(dialect) = dialect {
            println!("dialect: {}", dialect);
        }
        print_lines(&format_schedule(groups, with_tasks));
        print_lines(&format_summary(&summary));
    }
    Ok(())
}

/// Reports each moved subtask to the log
struct LogNotifier;

impl ShiftNotifier for LogNotifier {
    fn notify_shifted(&mut self, job_id: i64, subtask_id: i64) -> Result<(), NotifyError> {
        tracing::info!(job_id, subtask = subtask_id, "subtask rescheduled");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_parse(args: ParseArgs, ctx: &Context) -> CmdResult {
    let report = read_text(&args.report)?;
    let parsed = parse_report(&report, &ctx.config.report);

    if args.rows {
        if ctx.json {
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        } else {
            println!("dialect: {}", parsed.dialect);
            for row in &parsed.tasks {
                println!("{}", format_parsed_row(row));
            }
        }
        return Ok(());
    }

    let anchor = match args.anchor.as_deref() {
        Some(s) => parse_date_arg(s)?,
        None => ctx.today,
    };
    let groups = build::build_from_parsed(&parsed.tasks, anchor, ctx.today, &ctx.config);
    if let Some(ref out) = args.out {
        write_records(out, &build::to_records(&groups))?;
    }
    print_schedule(&groups, Some(parsed.dialect), true, ctx.json)
}

fn cmd_budget(args: BudgetArgs, ctx: &Context) -> CmdResult {
    let report = read_text(&args.report)?;
    let lines = extract_budget(&report);
    let total = budget_total(&lines);

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&budget_to_json(&lines, total))?);
    } else {
        for line in &lines {
            println!("{}", format_budget_line(line));
        }
        println!("total: {}", total);
    }
    Ok(())
}

fn cmd_chain(args: ChainArgs, ctx: &Context) -> CmdResult {
    let anchor = parse_date_arg(&args.anchor)?;
    let mut groups = load_groups(&args.records, ctx)?;
    chain_groups(&mut groups, anchor);
    build::recompute_all(&mut groups, ctx.today, &ctx.config);

    if let Some(ref out) = args.out {
        write_records(out, &build::to_records(&groups))?;
    }
    print_schedule(&groups, None, true, ctx.json)
}

fn cmd_status(args: StatusArgs, ctx: &Context) -> CmdResult {
    let groups = load_groups(&args.records, ctx)?;
    print_schedule(&groups, None, args.tasks, ctx.json)
}

fn cmd_shift(args: ShiftArgs, ctx: &Context) -> CmdResult {
    let gesture = match (args.days, args.pixels) {
        // one pixel per day
        (Some(days), _) => DragGesture {
            group_id: args.group,
            pixel_delta: days as f64,
            timeline_width_px: 1.0,
            total_visible_days: 1,
        },
        (None, Some(pixels)) => DragGesture {
            group_id: args.group,
            pixel_delta: pixels,
            timeline_width_px: args.width.unwrap_or_default(),
            total_visible_days: args.visible_days.unwrap_or_default(),
        },
        (None, None) => return Err("either --days or --pixels is required".into()),
    };

    let groups = load_groups(&args.records, ctx)?;
    let mut session = ScheduleSession::new(args.job, groups, ctx.config.clone(), ctx.today);

    let Some(proposal) = session.stage_drag(&gesture).cloned() else {
        if ctx.json {
            println!("null");
        } else {
            println!("nothing to shift");
        }
        return Ok(());
    };

    if !args.yes {
        if ctx.json {
            let out = ShiftJson {
                proposal: &proposal,
                applied: false,
                report: None,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!("{}", format_proposal(&proposal));
            println!("(dry run; pass --yes to apply)");
        }
        return Ok(());
    }

    let report = session.confirm_pending(&mut LogNotifier)?;
    let target = args.out.as_deref().unwrap_or(&args.records);
    write_records(target, &build::to_records(session.groups()))?;

    if ctx.json {
        let out = ShiftJson {
            proposal: &proposal,
            applied: true,
            report: Some(&report),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", format_proposal(&proposal));
        println!("moved {} task(s)", report.shifted.len());
        for (subtask, error) in &report.notify_failures {
            println!("  notify failed for {}: {}", subtask, error);
        }
    }
    Ok(())
}

fn cmd_weather(args: WeatherArgs, ctx: &Context) -> CmdResult {
    let mut groups = load_groups(&args.records, ctx)?;
    let forecast = read_forecast(&args.forecast)?;
    let report = apply_weather_overlay(&mut groups, &forecast, &ctx.config.weather);

    if ctx.json {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct WeatherJson {
            #[serde(flatten)]
            report: crate::ops::weather::WeatherReport,
            groups: Vec<GroupJson>,
        }
        let out = WeatherJson {
            report,
            groups: groups.iter().map(group_to_json).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for group in groups.iter().filter(|g| g.has_weather_warning) {
            println!("{}", format_group_line(group));
            for task in group.tasks.iter().filter(|t| t.has_weather_warning) {
                println!("{}", format_task_line(task));
            }
        }
        println!(
            "{} task(s) in {} phase(s) at risk of rain",
            report.flagged_tasks, report.flagged_groups
        );
    }
    Ok(())
}
