//! CLI argument parsing for the ee demo binary

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ee")]
#[command(author, version, about = "Synchronous event emitter playground", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register plain and once listeners and show listeners vs raw listeners
    Demo,

    /// Register many listeners on one event to trigger the leak warning
    LeakCheck {
        /// Number of listeners to register
        #[arg(short, long, default_value = "11")]
        listeners: usize,

        /// Threshold for this emitter (default: configured value)
        #[arg(short, long, allow_negative_numbers = true)]
        max: Option<i64>,
    },

    /// Emit an event with JSON arguments
    Emit {
        /// Event name
        #[arg(required = true)]
        event: String,

        /// Arguments, parsed as JSON when possible
        args: Vec<String>,

        /// Do not register a printing listener first
        #[arg(long)]
        no_listener: bool,
    },

    /// Print the effective configuration
    Config,
}
