//! CLI command definitions
//!
//! Defines the clap commands for the smokehouse CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run smoke tests and compare results against expectations
    Run {
        /// Test definitions file (JSON or YAML); defaults to [defaults].definitions
        definitions: Option<PathBuf>,

        /// Only run expectations whose requested URL matches this regex
        #[arg(long, short)]
        filter: Option<String>,

        /// Configuration file (default: platform config dir/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the run summary as JSON to this file
        #[arg(long)]
        summary_path: Option<PathBuf>,

        /// Don't gather artifacts, even if the config enables it
        #[arg(long)]
        no_artifacts: bool,

        /// Show passing assertions and debug logs
        #[arg(long, short)]
        verbose: bool,
    },

    /// List the tests and URLs that would run
    List {
        /// Test definitions file (JSON or YAML); defaults to [defaults].definitions
        definitions: Option<PathBuf>,

        /// Only list expectations whose requested URL matches this regex
        #[arg(long, short)]
        filter: Option<String>,

        /// Configuration file (default: platform config dir/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Commands {
    pub fn verbose(&self) -> bool {
        match self {
            Commands::Run { verbose, .. } => *verbose,
            Commands::List { .. } => false,
        }
    }
}
