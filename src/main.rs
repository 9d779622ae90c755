use clap::Parser;
use phaseline::cli::commands::Cli;
use phaseline::cli::handlers;
use tracing_subscriber::EnvFilter;

/// Log filter variable, e.g. `PHASELINE_LOG=phaseline=debug`
const LOG_ENV: &str = "PHASELINE_LOG";

fn main() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
