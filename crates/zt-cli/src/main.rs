use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use zt_cli::commands::{compute, sessions, track};
use zt_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(zt_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = zt_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so the operator transcript on stdout stays clean
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Track(args)) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            track::run(
                &mut db,
                &config,
                *args,
                io::stdin().lock(),
                io::stdout().lock(),
            )?;
        }
        Some(Commands::Sessions { json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            sessions::run(&db, *json)?;
        }
        Some(Commands::Compute(args)) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            compute::run(&db, &config, *args, io::stdout().lock())?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
