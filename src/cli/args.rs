//! CLI argument definitions using clap derive

use crate::results::EventType;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Festboard - festival schedule, results and leaderboard
///
/// Derives the festival timetable from the participant roster, totals
/// faculty points from published results, and keeps working offline
/// through a local fetch cache.
#[derive(Parser, Debug)]
#[command(name = "festboard")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FESTBOARD_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Top faculty and the next event
    Home(ViewArgs),

    /// Festival timetable
    Schedule(ScheduleArgs),

    /// Faculty standings
    Leaderboard(ViewArgs),

    /// Published results, newest first
    Results(ViewArgs),

    /// Publish or remove results (password protected)
    Admin(AdminArgs),

    /// Inspect and manage the offline cache
    Cache(CacheArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments shared by the read-only views
#[derive(Parser, Debug)]
pub struct ViewArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the schedule command
#[derive(Parser, Debug)]
pub struct ScheduleArgs {
    /// Festival day to show (1-based); all days when omitted
    #[arg(short, long)]
    pub day: Option<u32>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the admin command
#[derive(Parser, Debug)]
pub struct AdminArgs {
    /// Admin password
    #[arg(
        long,
        global = true,
        env = "FESTBOARD_ADMIN_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Subcommand for admin
    #[command(subcommand)]
    pub action: AdminAction,
}

/// Admin subcommands
#[derive(Subcommand, Debug)]
pub enum AdminAction {
    /// Publish a result
    Publish {
        /// Event name as it appears in the roster
        #[arg(long)]
        program: String,

        /// Winner's name
        #[arg(long)]
        winner: String,

        /// Winner's faculty
        #[arg(long)]
        faculty: String,

        /// Podium position (1-3)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3))]
        position: u64,

        /// Event type, selects the points table
        #[arg(long, default_value = "individual")]
        event_type: EventTypeArg,
    },

    /// Delete a published result by index (see `admin list`)
    Delete {
        /// Result index in publication order
        index: usize,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List published results with their indexes
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Download all results to a JSON file
    Backup {
        /// Output file or directory (defaults to a dated file in the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Event type as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventTypeArg {
    /// 5 / 3 / 1 points
    Individual,
    /// 10 / 5 / 3 points
    Group,
}

impl From<EventTypeArg> for EventType {
    fn from(arg: EventTypeArg) -> Self {
        match arg {
            EventTypeArg::Individual => Self::Individual,
            EventTypeArg::Group => Self::Group,
        }
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cache generations
    Status {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show how a URL would be routed
    Classify {
        /// Absolute URL or path relative to the origin
        url: String,
    },

    /// Precache the manifest and activate the current generation
    Install,

    /// Remove every cache generation
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}
