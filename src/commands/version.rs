//! # Version Command Implementation
//!
//! Offline access to the version policy, for scripts and for checking what a
//! release would do before running it.

use anyhow::Result;
use clap::{Args, Subcommand};

use booster_release::version;

use super::Context;

/// Compute versions and branches without touching any repository
#[derive(Args, Debug)]
pub struct VersionArgs {
    #[command(subcommand)]
    pub command: VersionCommand,
}

#[derive(Subcommand, Debug)]
pub enum VersionCommand {
    /// Next example version, e.g. 2.2.5-2-redhat -> 2.2.5-3-redhat
    Next {
        current: String,
    },
    /// BOM development version after a release
    BomBump {
        /// Current BOM version, e.g. 1.5.15-SNAPSHOT
        current: String,
        /// Released BOM version, e.g. 1.5.15.Final
        released: String,
    },
    /// Example version after rebasing onto a BOM release
    Rebase {
        current: String,
        bom_version: String,
    },
    /// Branch of a release line
    Branch {
        #[arg(value_name = "VERSION")]
        release: String,
        /// Branch examples are released from instead of the maintenance branch.
        #[arg(long)]
        example: bool,
    },
    /// Upstream framework version a BOM release was built from
    Framework {
        bom_version: String,
    },
}

/// Execute the `version` command.
pub fn execute(args: VersionArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let answer = match args.command {
        VersionCommand::Next { current } => version::next_booster_version(&current),
        VersionCommand::BomBump { current, released } => version::next_bom_version(&current, &released),
        VersionCommand::Rebase { current, bom_version } => version::rebase_booster_version(&current, &bom_version),
        VersionCommand::Branch { release, example } => {
            if example {
                version::version_to_example_branch(&release, &config.branches)?
            } else {
                version::version_to_branch(&release, &config.branches)?
            }
        }
        VersionCommand::Framework { bom_version } => {
            version::validate_bom_version(&bom_version)?;
            version::framework_version_for_bom(&bom_version, &config.bom)?
        }
    };
    println!("{}", answer);
    Ok(())
}
