//! futures-klines - main entry point
//!
//! Subcommands:
//! - klines: Fetch futures market klines and write them as JSON or CSV

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::klines::{KlinesArgs, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "futures-klines")]
#[command(about = "Fetch Binance USD-M futures market klines", long_about = None)]
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
    /// Fetch market klines for one symbol
    Klines {
        /// Trading pair, e.g. "BTCUSDT"
        #[arg(short, long)]
        symbol: String,

        /// Candle interval, e.g. "1m", "1h", "1d"
        #[arg(short, long)]
        interval: String,

        /// Maximum number of klines to return
        #[arg(short, long)]
        limit: Option<u32>,

        /// Window start: epoch ms, RFC 3339, or YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,

        /// Window end: epoch ms, RFC 3339, or YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use the futures testnet
        #[arg(long)]
        testnet: bool,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
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

    // Filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    // stdout carries the klines, so the console layer writes to stderr
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
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

    info!("Log file: {}", log_path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Klines { .. } => "klines",
    };
    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        Commands::Klines {
            symbol,
            interval,
            limit,
            start,
            end,
            format,
            output,
            testnet,
            timeout,
        } => commands::klines::run(KlinesArgs {
            symbol,
            interval,
            limit,
            start,
            end,
            format,
            output,
            testnet,
            timeout,
        }),
    }
}
