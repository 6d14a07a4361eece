//! Command-line interface for chess_worlds.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chess Worlds - replay famous games one correct move at a time
#[derive(Parser, Debug)]
#[command(name = "chess_worlds")]
#[command(about = "Historical chess puzzles and their support tools", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (optional; defaults apply when missing)
    #[arg(long, global = true, default_value = "chess_worlds.toml")]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the feedback relay
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List worlds and their levels
    Worlds,

    /// Parse every shown level and report the ones that fail
    Validate,

    /// Play a level in the terminal
    Play {
        /// Level id, e.g. `player-anderssen/game-immortal-1851`
        level: String,
    },

    /// Write the effective content bundle to a file
    Export {
        /// Destination JSON file
        file: PathBuf,
    },

    /// Replace the stored content with a bundle file
    Import {
        /// Source JSON file
        file: PathBuf,
    },

    /// Discard edited content and return to the built-in bundle
    Reset,
}
