use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use faultwatch::{agent, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "faultwatch")]
#[command(about = "Voltage fault detection and reporting agent")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter (e.g. "info", "faultwatch_sdk=debug"); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Stop after this many samples instead of running until Ctrl-C
    #[arg(long)]
    ticks: Option<u64>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let fmt = tracing_subscriber::fmt().with_env_filter(filter);
    match args.log_format {
        LogFormat::Json => fmt.json().init(),
        LogFormat::Text => fmt.init(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let settings = Settings::load(args.config.as_deref())?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    rt.block_on(agent::run(settings, args.ticks)).inspect_err(|e| {
        error!(error = %format!("{:#}", e), "Fault monitor exited with an error");
    })?;

    Ok(())
}
