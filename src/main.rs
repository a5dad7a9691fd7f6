//! # Booster Release CLI
//!
//! Binary entry point of the `booster-release` command-line tool: parses
//! arguments with `clap` and dispatches to the command implementations.
//! The release logic itself lives in the `booster_release` library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
