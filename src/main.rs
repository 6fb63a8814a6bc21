//! Mean reversion decision core - diagnostic entry point
//!
//! This binary provides three subcommands:
//! - params: Print the resolved strategy parameters
//! - scan: Stream CSV bars through the indicators and signal for a flat book
//! - grid: Show the optimizer parameter grid

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "mean-reversion")]
#[command(about = "Z-score mean reversion decision core diagnostics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print resolved, validated parameters as JSON
    Params {
        /// Path to configuration file
        #[arg(short, long, env = "MR_CONFIG", default_value = "configs/default.json")]
        config: String,

        /// Override a strategy parameter. Format: "key=value". Can be used multiple times.
        #[arg(short = 'O', long = "override")]
        overrides: Vec<String>,
    },

    /// Evaluate every ready bar of a CSV file against a flat book
    Scan {
        /// Path to configuration file
        #[arg(short, long, env = "MR_CONFIG", default_value = "configs/default.json")]
        config: String,

        /// CSV with datetime,open,high,low,close[,volume]
        #[arg(short, long)]
        bars: String,

        /// Sentiment score fed to every bar (ignored unless use_sentiment is set)
        #[arg(long)]
        sentiment: Option<f64>,

        /// Override a strategy parameter. Format: "key=value". Can be used multiple times.
        #[arg(short = 'O', long = "override")]
        overrides: Vec<String>,
    },

    /// Show the parameter grid
    Grid {
        /// Path to configuration file (base for fields the grid does not vary)
        #[arg(short, long, env = "MR_CONFIG", default_value = "configs/default.json")]
        config: String,

        /// Use the full grid instead of the quick one
        #[arg(long)]
        full: bool,

        /// Number of combinations to print
        #[arg(short, long, default_value = "5")]
        top: usize,
    },
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    // {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    // Console goes to stderr, stdout carries command output
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Params { .. } => "params",
        Commands::Scan { .. } => "scan",
        Commands::Grid { .. } => "grid",
    };

    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        Commands::Params { config, overrides } => commands::params::run(config, overrides),

        Commands::Scan {
            config,
            bars,
            sentiment,
            overrides,
        } => commands::scan::run(config, bars, sentiment, overrides),

        Commands::Grid { config, full, top } => commands::grid::run(config, full, top),
    }
}
