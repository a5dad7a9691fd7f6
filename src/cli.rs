//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use booster_release::output::OutputConfig;

use crate::commands::{self, Context};

/// Booster Release - release automation for example repositories and their BOM
#[derive(Parser, Debug)]
#[command(name = "booster-release")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Configuration file; defaults to the user configuration directory.
    #[arg(long, global = true, value_name = "FILE", env = "BOOSTER_RELEASE_CONFIG")]
    config: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Release every example of the organisation
    Release(commands::release::ReleaseArgs),

    /// Release a single example
    ReleaseOne(commands::release_one::ReleaseOneArgs),

    /// Rebase the boosters onto a released BOM and bump the BOM
    BomRelease(commands::bom_release::BomReleaseArgs),

    /// Sync the BOM with an upstream framework release
    SyncBom(commands::sync_bom::SyncBomArgs),

    /// Align a project with an upstream framework release
    AlignBom(commands::align_bom::AlignBomArgs),

    /// Update the launcher catalog through a pull request
    CatalogPr(commands::catalog_pr::CatalogPrArgs),

    /// Set a POM property through pull requests
    UpdateProperty(commands::update_property::UpdatePropertyArgs),

    /// Generate license reports for a local project
    GenerateLicenses(commands::generate_licenses::GenerateLicensesArgs),

    /// Compute versions and branches offline
    Version(commands::version::VersionArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let ctx = Context {
            config_path: self.config,
            output: OutputConfig::from_env_and_flag(&self.color),
        };

        match self.command {
            Commands::Release(args) => commands::release::execute(args, &ctx),
            Commands::ReleaseOne(args) => commands::release_one::execute(args, &ctx),
            Commands::BomRelease(args) => commands::bom_release::execute(args, &ctx),
            Commands::SyncBom(args) => commands::sync_bom::execute(args, &ctx),
            Commands::AlignBom(args) => commands::align_bom::execute(args, &ctx),
            Commands::CatalogPr(args) => commands::catalog_pr::execute(args, &ctx),
            Commands::UpdateProperty(args) => commands::update_property::execute(args, &ctx),
            Commands::GenerateLicenses(args) => commands::generate_licenses::execute(args, &ctx),
            Commands::Version(args) => commands::version::execute(args, &ctx),
        }
    }
}

/// `RUST_LOG` wins over `--log-level` when set.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // a second init in the same process is harmless
    let _ = env_logger::Builder::from_env(env).format_timestamp_millis().try_init();
}
