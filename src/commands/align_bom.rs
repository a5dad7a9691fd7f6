//! # Align-BOM Command Implementation
//!
//! Aligns a project whose parent is the upstream framework BOM with an
//! upstream release: parent, version, differing properties and README.

use anyhow::Result;
use clap::Args;
use std::sync::Arc;

use booster_release::bom::{self, HttpBomSource};
use booster_release::config;
use booster_release::editors::EditorChain;
use booster_release::git::GitProjectStore;
use booster_release::output::emoji;
use booster_release::release::{edit_in_branch, EditOutcome};
use booster_release::version;

use super::{AuthArgs, Context, RepoArgs};

/// Align a project with an upstream release
#[derive(Args, Debug)]
pub struct AlignBomArgs {
    /// Upstream framework release, e.g. 2.2.4.RELEASE
    pub upstream_version: String,

    /// Repository to align; defaults to the BOM repository.
    #[arg(long)]
    pub repo: Option<String>,

    #[command(flatten)]
    pub location: RepoArgs,

    #[command(flatten)]
    pub auth: AuthArgs,
}

/// Execute the `align-bom` command.
pub fn execute(args: AlignBomArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let source = Arc::new(HttpBomSource::new(&config.github, &config.bom, &config.branches));
    let editor = bom::align_with_upstream(source, &args.upstream_version, &config.bom)?;

    let name = args.repo.clone().unwrap_or_else(|| config.bom.repo.clone());
    let branch = version::version_to_branch(&args.upstream_version, &config.branches)?;
    let target = args.location.target(&config, &name, branch, &args.auth);
    let store = GitProjectStore::new(&config.github, &config.git);
    let message = config::render(&config.release.bom_sync_commit_message, &args.upstream_version);

    let outcome = edit_in_branch(
        &store,
        &target,
        &EditorChain::new().then(editor),
        &target.repo.branch,
        &target.repo.branch,
        &message,
    )?;
    if outcome == EditOutcome::Committed {
        println!(
            "{} {}@{} aligned with upstream {}",
            emoji(&ctx.output, "✅", "[OK]"),
            target.repo,
            target.repo.branch,
            args.upstream_version
        );
    } else {
        println!("{} {} already aligned", emoji(&ctx.output, "ℹ️ ", "[INFO]"), target.repo);
    }
    Ok(())
}
