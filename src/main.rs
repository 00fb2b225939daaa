//! Smokehouse - smoke tests for Lighthouse
//!
//! Runs a suite of expected Lighthouse results against a live lighthouse
//! executable and reports which assertions held.

use clap::Parser;
use smokehouse::commands::Commands;
use smokehouse::{cli, common::logging};

#[derive(Parser)]
#[command(name = "smokehouse", about = "Smoke tests for Lighthouse")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.command.verbose());

    match cli::dispatch(cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
