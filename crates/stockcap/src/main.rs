//! Stockcap CLI - caption an image folder and write a stock-photo upload manifest.
//!
//! Every image in the folder is described by a pretrained captioning model,
//! keywords are derived from each description, and everything lands in a
//! single manifest for the upload tool.
//!
//! # Usage
//!
//! ```bash
//! # Guided mode (prompts for folder, categories and workers)
//! stockcap
//!
//! # Caption a folder with two categories
//! stockcap process ./photos -c Nature -c Landscapes
//!
//! # Manage models
//! stockcap models download
//! ```

use std::io::IsTerminal;

use clap::{CommandFactory, Parser, Subcommand};

mod cli;
mod logging;

/// Stockcap - caption an image folder and write a stock-photo upload manifest.
#[derive(Parser, Debug)]
#[command(name = "stockcap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Caption images and write the upload manifest
    Process(cli::process::ProcessArgs),

    /// Manage captioning and tagging models (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match stockcap_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `stockcap config path`."
            );
            stockcap_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Stockcap v{}", stockcap_core::VERSION);

    match cli.command {
        Some(Commands::Process(args)) => cli::process::execute(args).await,
        Some(Commands::Models(args)) => cli::models::execute(args).await,
        Some(Commands::Config(args)) => cli::config::execute(args).await,
        None if std::io::stdin().is_terminal() => cli::interactive::run(&config).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
