use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pl", about = concat!("phaseline v", env!("CARGO_PKG_VERSION"), " - construction schedules from plan reports"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Engine config file (default: ./phaseline.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Evaluate schedule status as of this date (default: the local date)
    #[arg(long, global = true)]
    pub today: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a markdown plan report into a phased schedule
    Parse(ParseArgs),
    /// Extract priced budget lines from a report
    Budget(BudgetArgs),
    /// Re-chain every task end to end from an anchor date
    Chain(ChainArgs),
    /// Show phase aggregates for a record file
    Status(StatusArgs),
    /// Propose (or apply, with --yes) a phase shift
    Shift(ShiftArgs),
    /// Flag weather-sensitive tasks with rain risk
    Weather(WeatherArgs),
}

#[derive(Args)]
pub struct ParseArgs {
    /// Markdown report file
    pub report: PathBuf,
    /// First day of the schedule when the report carries no dates (default: today)
    #[arg(long)]
    pub anchor: Option<String>,
    /// Print the parsed rows instead of the built schedule
    #[arg(long)]
    pub rows: bool,
    /// Write the schedule as subtask records to this file
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct BudgetArgs {
    /// Markdown report file
    pub report: PathBuf,
}

#[derive(Args)]
pub struct ChainArgs {
    /// Subtask record file (JSON array)
    pub records: PathBuf,
    /// Start date of the first task
    #[arg(long)]
    pub anchor: String,
    /// Write the re-chained records here (default: print only)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Subtask record file (JSON array)
    pub records: PathBuf,
    /// Also list each phase's tasks
    #[arg(long)]
    pub tasks: bool,
}

#[derive(Args)]
pub struct ShiftArgs {
    /// Subtask record file (JSON array)
    pub records: PathBuf,
    /// Phase id (1-based, in record order)
    #[arg(long)]
    pub group: u32,
    /// Shift by whole days
    #[arg(long, allow_hyphen_values = true, conflicts_with = "pixels")]
    pub days: Option<i64>,
    /// Drag distance in pixels (needs --width and --visible-days)
    #[arg(long, allow_hyphen_values = true, requires_all = ["width", "visible_days"])]
    pub pixels: Option<f64>,
    /// Timeline width in pixels
    #[arg(long)]
    pub width: Option<f64>,
    /// Days visible across the timeline
    #[arg(long)]
    pub visible_days: Option<u32>,
    /// Job id passed to the shift notifier
    #[arg(long, default_value_t = 0)]
    pub job: i64,
    /// Apply the shift and write the records back
    #[arg(long)]
    pub yes: bool,
    /// Write to this file instead of the input file
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct WeatherArgs {
    /// Subtask record file (JSON array)
    pub records: PathBuf,
    /// Forecast file (JSON array of {date, condition, precipitationProbability})
    #[arg(long)]
    pub forecast: PathBuf,
}
