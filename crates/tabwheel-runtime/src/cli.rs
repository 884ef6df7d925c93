//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tabwheel", about = "display tab rotation daemon")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the reconciliation loop against a browser window
    Run(RunOpts),
    /// Validate a config file and print the loaded entries
    Check(CheckOpts),
}

#[derive(clap::Args)]
pub struct RunOpts {
    /// Path to the display config (JSON)
    #[arg(long, short = 'c', env = "TABWHEEL_CONFIG")]
    pub config: PathBuf,

    /// Tick interval in milliseconds (must be at least 1)
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// DevTools debugging endpoint of the display browser
    #[arg(long, default_value = "http://127.0.0.1:9222")]
    pub devtools_url: String,
}

#[derive(clap::Args)]
pub struct CheckOpts {
    /// Path to the display config (JSON)
    #[arg(long, short = 'c', env = "TABWHEEL_CONFIG")]
    pub config: PathBuf,
}
