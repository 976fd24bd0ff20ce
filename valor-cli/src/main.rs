#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use valor_common::util::expand_path;
use valor_common::Config;

mod config;
mod history;
mod screen;

/// `valor` - value screening for Brazilian equities.
#[derive(Parser, Debug)]
#[command(name = "valor")]
#[command(version = "0.1.0")]
#[command(about = "Rank B3 stocks by EV/EBIT after liquidity, profitability and quality filters.", long_about = None)]
struct Cli {
    /// Config file (default: ~/.valor/config.json)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Screen an exported fundamentals sheet (CSV, JSON or XLSX)
    Screen(screen::ScreenArgs),

    /// Show the daily price history of a ticker
    History(history::HistoryArgs),

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        config_command: config::ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    // `valor config` must still show and diagnose an invalid file.
    let validate = !matches!(cli.command, Commands::Config { .. });
    let config = load_config(cli.config.as_deref(), validate)?;
    valor_common::logging::init_from_config(&config.observability);
    debug!(command = ?cli.command, "Starting valor");

    match cli.command {
        Commands::Screen(args) => screen::run(args, &config),
        Commands::History(args) => history::run(args, &config).await,
        Commands::Config { config_command } => {
            config::handle_command(config_command, &config, cli.config.as_deref())
        }
    }
}

/// Explicit file, or the default location; env overrides apply to both.
fn load_config(path: Option<&str>, validate: bool) -> Result<Config> {
    let path = path.map(expand_path);
    if validate {
        Config::load_and_validate(path.as_deref())
    } else {
        Config::load_with_env(path.as_deref())
    }
}

/// Exit status for a failed command, `1` when no category applies.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<valor_common::Error>())
        .map_or(1, valor_common::Error::exit_code)
}
