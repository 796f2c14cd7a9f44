//! Futures trader - main entry point
//!
//! Subcommands:
//! - open / close / close-all: place orders through the configured gateway
//! - positions / volume / orders: inspect the local state database

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

const DEFAULT_CONFIG: &str = "configs/paper.json";

#[derive(Parser, Debug)]
#[command(name = "futures-trader")]
#[command(about = "Futures order and position lifecycle manager", long_about = None)]
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
    /// Open a position at market
    Open {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: String,

        /// Instrument id, e.g. rb2410
        #[arg(short, long)]
        instrument: String,

        /// Position direction: buy or sell
        #[arg(short, long)]
        direction: String,

        /// Lots (defaults to trader.default_volume)
        #[arg(long)]
        volume: Option<u32>,
    },

    /// Close one position at market
    Close {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: String,

        /// Position id
        #[arg(short, long)]
        position: i64,
    },

    /// Close every open position matching the filters
    CloseAll {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: String,

        /// Instruments to close (comma-separated). E.g., "rb2410,i2409"
        #[arg(short, long)]
        instruments: Option<String>,

        /// Only close positions in this direction
        #[arg(short, long)]
        direction: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List positions
    Positions {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: String,

        /// Only positions in this state (open, close)
        #[arg(short, long)]
        state: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Total open volume
    Volume {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: String,

        /// Instruments to include (comma-separated)
        #[arg(short, long)]
        instruments: Option<String>,

        /// Only count positions in this direction
        #[arg(short, long)]
        direction: Option<String>,
    },

    /// List orders
    Orders {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: String,

        /// Only orders in this state (insert, finish, error)
        #[arg(short, long)]
        state: Option<String>,

        #[arg(long)]
        json: bool,
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

    // Set log level - filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    // Console on stderr so report output on stdout stays clean
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
        Commands::Open { .. } => "open",
        Commands::Close { .. } => "close",
        Commands::CloseAll { .. } => "close_all",
        Commands::Positions { .. } => "positions",
        Commands::Volume { .. } => "volume",
        Commands::Orders { .. } => "orders",
    };

    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        Commands::Open {
            config,
            instrument,
            direction,
            volume,
        } => commands::trade::open(config, instrument, direction, volume),

        Commands::Close { config, position } => commands::trade::close(config, position),

        Commands::CloseAll {
            config,
            instruments,
            direction,
            json,
        } => commands::trade::close_all(config, instruments, direction, json),

        Commands::Positions {
            config,
            state,
            json,
        } => commands::report::positions(config, state, json),

        Commands::Volume {
            config,
            instruments,
            direction,
        } => commands::report::volume(config, instruments, direction),

        Commands::Orders {
            config,
            state,
            json,
        } => commands::report::orders(config, state, json),
    }
}
