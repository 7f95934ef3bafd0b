//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Project time tracker.
///
/// Tracks time spent on named projects: start and stop a timer, attach a
/// note, and roll completed entries up into daily and weekly totals.
#[derive(Debug, Parser)]
#[command(name = "tempo", version, about, long_about = None)]
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
    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Start the timer for a project.
    Start {
        /// Project name.
        project: String,
    },

    /// Stop the running timer and record an entry.
    Stop {
        /// Note to attach to the recorded entry.
        #[arg(long, default_value = "")]
        note: String,
    },

    /// Show the running timer and elapsed time.
    Status {
        /// Keep refreshing the elapsed time once per second.
        #[arg(long)]
        watch: bool,
    },

    /// Show daily and weekly totals.
    Report {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List recorded entries, most recent first.
    Entries {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export all entries as CSV.
    Export {
        /// Destination file path.
        output: PathBuf,
    },
}

/// Project management actions.
#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Add a new project.
    Add {
        /// Project name (must be unique).
        name: String,
    },

    /// List projects sorted by name.
    List,
}
