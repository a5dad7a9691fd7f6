//! # Generate-Licenses Command Implementation
//!
//! Runs the license generator on a local checkout.

use anyhow::{Context as _, Result};
use clap::Args;
use std::path::PathBuf;

use booster_release::git;
use booster_release::license::LicenseGenerator;
use booster_release::output::emoji;
use booster_release::project::ProjectTree;

use super::Context;

/// Generate license reports for a local project
#[derive(Args, Debug)]
pub struct GenerateLicensesArgs {
    /// Project directory containing the root pom.xml.
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

/// Execute the `generate-licenses` command.
pub fn execute(args: GenerateLicensesArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let generator = LicenseGenerator::from_config(&config.license)
        .context("No license generator configured (license.generator_jar)")?;

    let dir = args
        .path
        .canonicalize()
        .with_context(|| format!("Cannot open {}", args.path.display()))?;
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());
    let files = git::load_tree(&dir)?;
    let tree = generator.run(ProjectTree::materialized(name, files, &dir))?;

    println!(
        "{} Generated license reports, {} file(s) changed",
        emoji(&ctx.output, "✅", "[OK]"),
        tree.changed_paths().len()
    );
    Ok(())
}
