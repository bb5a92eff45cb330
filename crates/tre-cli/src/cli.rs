//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::expand::ExpandArgs;
use crate::commands::extract::ExtractArgs;

/// Temporal resolution engine.
///
/// Pulls implicit dates out of task text and expands recurring events into
/// the occurrences a calendar view shows.
#[derive(Debug, Parser)]
#[command(name = "tre", version, about, long_about = None)]
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
    /// Find a date mention in task text and print the remaining text.
    Extract(ExtractArgs),

    /// Expand a recurring event into occurrences within a window.
    Expand(ExpandArgs),
}
