pub mod commands;
pub mod fixtures;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use salesradar_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "salesradar",
    about = "Salesradar analysis CLI",
    long_about = "Run the signal-detection and attribution engine over fixture datasets: anomaly signals, manager hand-offs, transfer statistics, and action recommendations.",
    after_help = "Examples:\n  salesradar report --fixtures ./fixtures\n  salesradar signals --fixtures ./fixtures --period 6\n  salesradar transfers --fixtures ./fixtures --lookback 30\n  salesradar config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run the full analysis pass and print the complete report")]
    Report(AnalysisArgs),
    #[command(about = "Print anomaly signals only (revenue, frequency, avg check, forecast)")]
    Signals(AnalysisArgs),
    #[command(about = "Print manager hand-off events and transfer statistics")]
    Transfers(AnalysisArgs),
    #[command(about = "Print prioritized action recommendations")]
    Recommend(AnalysisArgs),
    #[command(about = "Inspect effective configuration values with secret redaction")]
    Config,
}

#[derive(Debug, Args)]
pub struct AnalysisArgs {
    #[arg(long, help = "Directory holding sales.json plus optional directory/employees/actions fixtures")]
    pub fixtures: PathBuf,
    #[arg(long, help = "Comparison period in months (defaults to configuration)")]
    pub period: Option<u32>,
    #[arg(long, help = "Transfer lookback in days (defaults to configuration)")]
    pub lookback: Option<i64>,
    #[arg(long, help = "Analysis anchor as an RFC 3339 timestamp (defaults to now)")]
    pub anchor: Option<DateTime<Utc>>,
    #[arg(long, help = "Run with this employee's visibility instead of admin")]
    pub as_employee: Option<String>,
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            let result =
                commands::CommandResult::failure("config", "configuration", error.to_string(), 2);
            println!("{}", result.output);
            return ExitCode::from(result.exit_code);
        }
    };

    init_tracing(&config);

    let result = match cli.command {
        Command::Report(args) => commands::report::run(&args, &config).await,
        Command::Signals(args) => commands::signals::run(&args, &config).await,
        Command::Transfers(args) => commands::transfers::run(&args, &config).await,
        Command::Recommend(args) => commands::recommend::run(&args, &config).await,
        Command::Config => commands::config::run(&config),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    // A second init in the same process (tests) is not an error worth dying on.
    let result = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber was already initialized");
    }
}
