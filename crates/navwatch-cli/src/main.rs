//! navwatch - inspect navigation event streams from the command line
//!
//! ## Commands
//!
//! - `replay`: run a recorded scenario through a completion watcher
//! - `classify`: show how a single event is classified

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use navwatch_core::{
    classify, replay_scenario, replay_scenario_stream, NavigationEvent, ReplayReport, Scenario,
    METRICS,
};
use serde_json::json;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "navwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Watch router navigation events until the navigation settles", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, env = "NAVWATCH_VERBOSE")]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true, env = "NAVWATCH_LOG_JSON")]
    json: bool,

    /// Format of command results printed to stdout
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReplayMode {
    /// Synchronous in-memory event bus
    Bus,
    /// Async stream adapter
    Stream,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded scenario and report when the watcher fired
    Replay {
        /// Scenario file (JSON object with `events`, or a bare array)
        file: PathBuf,

        /// Which watcher implementation to drive
        #[arg(long, value_enum, default_value_t = ReplayMode::Bus)]
        mode: ReplayMode,
    },

    /// Classify a single event given as JSON
    Classify {
        /// Event JSON, e.g. '{"type":"navigation_cancel","id":1,"url":"/","code":"redirect"}'
        event: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    navwatch_core::init_tracing(cli.json, level);

    let result = match cli.command {
        Commands::Replay { file, mode } => cmd_replay(&file, mode, cli.output).await,
        Commands::Classify { event } => cmd_classify(&event, cli.output),
    };

    if cli.verbose {
        METRICS.flush();
    }
    result
}

async fn cmd_replay(file: &Path, mode: ReplayMode, output: OutputFormat) -> Result<()> {
    let scenario = Scenario::load(file)
        .with_context(|| format!("Failed to load scenario {}", file.display()))?;
    info!(
        scenario = scenario.name.as_deref().unwrap_or("<unnamed>"),
        events = scenario.events.len(),
        mode = ?mode,
        "replaying scenario"
    );

    let report = match mode {
        ReplayMode::Bus => replay_scenario(&scenario).context("Replay failed")?,
        ReplayMode::Stream => replay_scenario_stream(&scenario).await,
    };

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", render_report(&scenario, &report)),
    }
    Ok(())
}

fn render_report(scenario: &Scenario, report: &ReplayReport) -> String {
    let mut out = String::new();
    if let Some(name) = &scenario.name {
        out.push_str(&format!("Scenario:  {name}\n"));
    }
    out.push_str(&format!("Events:    {}\n", report.events_published));
    match (report.fired_at, report.outcome) {
        (Some(index), Some(outcome)) => {
            let kind = scenario
                .events
                .get(index)
                .map(NavigationEvent::kind)
                .unwrap_or("unknown");
            out.push_str(&format!("Fired:     event #{} ({kind})\n", index + 1));
            out.push_str(&format!("Outcome:   {outcome}\n"));
        }
        _ => out.push_str("Fired:     never (no terminal event)\n"),
    }
    out.push_str(&format!("Redirects: {}\n", report.redirects_skipped));
    out.push_str(&format!("Ignored:   {}\n", report.events_ignored));
    out
}

fn cmd_classify(raw: &str, output: OutputFormat) -> Result<()> {
    let event: NavigationEvent =
        serde_json::from_str(raw).context("Event is not valid navigation event JSON")?;
    let outcome = classify(&event);

    match output {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "kind": event.kind(),
                "navigation_id": event.navigation_id(),
                "outcome": outcome,
                "terminal": outcome.is_some_and(|o| o.is_terminal()),
            })
        ),
        OutputFormat::Text => match outcome {
            Some(outcome) => println!("{}: {outcome}", event.kind()),
            None => println!("{}: ignored", event.kind()),
        },
    }
    Ok(())
}
