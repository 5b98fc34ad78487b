use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use att_cli::commands::{check, events, history, register, report, status};
use att_cli::{Cli, Commands, Config};
use att_core::{DateRange, EventKind};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(att_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = att_db::Database::open(&config.database_path).context("failed to open database")?;
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
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::CheckIn { user, name }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            check::run(
                &mut out,
                &mut db,
                EventKind::In,
                user,
                name.as_deref(),
                config.history_limit,
            )?;
        }
        Some(Commands::CheckOut { user }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            check::run(
                &mut out,
                &mut db,
                EventKind::Out,
                user,
                None,
                config.history_limit,
            )?;
        }
        Some(Commands::History {
            user,
            from,
            to,
            json,
        }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let range = DateRange {
                from: *from,
                to: *to,
            };
            history::run(&mut out, &db, user.as_deref(), range, *json)?;
        }
        Some(Commands::Status { user }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            status::run(&mut out, &db, user.as_deref())?;
        }
        Some(Commands::Register {
            user,
            name,
            department,
            laptop,
        }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            register::run(
                &mut out,
                &mut db,
                user,
                name,
                department.as_deref(),
                laptop.as_deref(),
            )?;
        }
        Some(Commands::Report { date, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            report::run(&mut out, &db, *date, *json)?;
        }
        Some(Commands::Events) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            events::run(&mut out, &db)?;
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
