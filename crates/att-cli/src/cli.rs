//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Employee check-in/check-out tracker.
///
/// Records attendance events in a local database and reconstructs paired
/// work sessions, per-user history, and daily statistics from them.
#[derive(Debug, Parser)]
#[command(name = "att", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a check-in for a user.
    CheckIn {
        /// The user to check in (e.g. an email address).
        user: String,

        /// Display name to record on the event.
        #[arg(long)]
        name: Option<String>,
    },

    /// Record a check-out for a user.
    CheckOut {
        /// The user to check out.
        user: String,
    },

    /// Show reconciled work sessions, most recent first.
    History {
        /// Only show sessions for this user.
        #[arg(long)]
        user: Option<String>,

        /// Only include events on or after this date (YYYY-MM-DD).
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Only include events on or before this date (YYYY-MM-DD).
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Output sessions as JSON lines.
        #[arg(long)]
        json: bool,
    },

    /// Show who is currently checked in.
    Status {
        /// Only report on this user.
        user: Option<String>,
    },

    /// Create or update a registration record.
    Register {
        /// The user to register.
        user: String,

        /// Display name.
        #[arg(long)]
        name: String,

        /// Department shown in history.
        #[arg(long)]
        department: Option<String>,

        /// Laptop brand shown in history.
        #[arg(long)]
        laptop: Option<String>,
    },

    /// Show attendance statistics.
    Report {
        /// Day to report on (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Output the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Dump raw events as JSONL for debugging.
    Events,
}
