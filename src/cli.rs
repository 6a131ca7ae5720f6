//! Command-line definitions (clap). No behavior; see `ui` for the handlers.

use clap::{Parser, Subcommand};

/// SolveBio command-line client
#[derive(Parser, Debug)]
#[command(name = "solvebio", version)]
#[command(about = "Log in to SolveBio and browse datasets from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API host (overrides SOLVEBIO_API_HOST)
    #[arg(long, global = true)]
    pub api_host: Option<String>,

    /// API key (overrides SOLVEBIO_API_KEY). With `login`, the key is
    /// validated and stored instead of prompting.
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store an API key locally
    Login,
    /// Delete the locally stored credentials
    Logout,
    /// Show the currently logged-in user
    Whoami,
    /// Dataset commands
    Dataset {
        #[command(subcommand)]
        command: DatasetCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum DatasetCommands {
    /// Show a dataset's attributes
    Show {
        /// Dataset id or full name
        id: String,
    },
    /// List a dataset's fields as a table
    Fields {
        /// Dataset id or full name
        id: String,
    },
    /// Show facets for one field of a dataset
    Facets {
        /// Dataset id or full name
        id: String,
        /// Field name
        field: String,
        /// Maximum number of facet values
        #[arg(long)]
        limit: Option<u32>,
    },
}
