//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ultan - terminal-first worldbuilding recorder
#[derive(Parser, Debug)]
#[command(name = "ultan", version, about = "Terminal-first worldbuilding recorder")]
pub struct Cli {
    /// Repository root (the directory holding worlds/). Defaults to $ULTAN_ROOT,
    /// then the nearest ancestor of the current directory with a worlds/ folder
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Create a world if needed and show its paths
    World {
        /// World name (normalized: lowercase, spaces become dashes)
        name: String,
    },

    /// List available worlds
    Worlds,

    /// Show the paths of a world
    Paths { name: String },

    /// Start a new session
    New { name: String },

    /// Print the path of the latest session
    Latest { name: String },

    /// Print the last lines of the latest session
    Tail {
        name: String,
        /// Number of lines to show
        #[arg(short = 'n', long = "lines", default_value_t = 30,
              value_parser = clap::value_parser!(u64).range(1..))]
        lines: u64,
    },

    /// Print the codex path and/or contents
    Codex {
        name: String,
        /// Do not print the codex path
        #[arg(long = "no-path")]
        no_path: bool,
        /// Print the codex contents
        #[arg(long)]
        show: bool,
    },

    /// Record one answer and ask the next question
    Ask {
        name: String,
        /// What the sage says
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        text: Vec<String>,
        /// Session file to use (default: latest, or a new one)
        #[arg(long, value_name = "FILE")]
        session: Option<PathBuf>,
        /// Model override for question generation
        #[arg(long)]
        model: Option<String>,
    },

    /// Answer questions interactively, one line per turn (`/done` to stop)
    Chat {
        name: String,
        /// Session file to use (default: latest, or a new one)
        #[arg(long, value_name = "FILE")]
        session: Option<PathBuf>,
        /// Model override
        #[arg(long)]
        model: Option<String>,
        /// Rewrite the codex from the session when done
        #[arg(long)]
        finalize: bool,
    },

    /// Rewrite the codex from a session transcript
    Finalize {
        name: String,
        /// Session file to use (default: latest)
        #[arg(long, value_name = "FILE")]
        session: Option<PathBuf>,
        /// Model override for the rewrite
        #[arg(long)]
        model: Option<String>,
    },

    /// Delete a world and everything in it
    Delete {
        name: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}
