//! wtr-jasmine - Jasmine session adapter for test orchestration hosts
//!
//! Boots Jasmine through a framework process, runs the given spec files and
//! reports one structured result (or one error) on stdout.

use clap::Parser;
use wtr_jasmine::common::logging;
use wtr_jasmine::{cli, commands::Commands};

#[derive(Parser)]
#[command(name = "wtr-jasmine", about = "Jasmine session adapter")]
#[command(version, long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli::dispatch(cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
