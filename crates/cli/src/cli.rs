use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Mirror a remote game library for a local emulator",
    long_about = None
)]
pub struct Cli {
    /// Settings file to use instead of the default location
    #[arg(long = "config", global = true)]
    pub config_path: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Inspect or initialise the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List platforms on the server
    Platforms,
    /// List games for a platform
    Games {
        /// Platform identifier
        platform_id: u64,
    },
    /// Download a game's ROM into the local library
    Pull {
        /// Game identifier
        game_id: u64,
    },
    /// Compare local saves and states of a game with the server's
    Saves {
        /// Game identifier
        game_id: u64,
    },
    /// Show how a server path would be stored locally
    Sanitize {
        /// Raw path as reported by the server
        path: String,
    },
    /// Parse a timestamp the way the server's values are read
    ParseTime {
        /// Timestamp text
        text: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a default settings file if none exists
    Init,
    /// Print the current settings
    Show,
    /// Print the settings file location
    Path,
}
