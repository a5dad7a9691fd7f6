//! # Sync-BOM Command Implementation
//!
//! Copies changed dependency versions from an upstream framework release
//! into the BOM and commits the result to the BOM's maintenance branch.

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

/// Sync the BOM with an upstream release
#[derive(Args, Debug)]
pub struct SyncBomArgs {
    /// Upstream framework release, e.g. 2.2.6.RELEASE
    pub upstream_version: String,

    #[command(flatten)]
    pub location: RepoArgs,

    #[command(flatten)]
    pub auth: AuthArgs,
}

/// Execute the `sync-bom` command.
pub fn execute(args: SyncBomArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let source = Arc::new(HttpBomSource::new(&config.github, &config.bom, &config.branches));
    let editor = bom::sync_from_upstream(source, &args.upstream_version, &config.bom)?;

    let branch = version::version_to_branch(&args.upstream_version, &config.branches)?;
    let target = args.location.target(&config, &config.bom.repo, branch, &args.auth);
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
    match outcome {
        EditOutcome::Committed => println!(
            "{} {}@{} synced with upstream {}",
            emoji(&ctx.output, "✅", "[OK]"),
            target.repo,
            target.repo.branch,
            args.upstream_version
        ),
        EditOutcome::Unchanged => println!(
            "{} {} already matches upstream {}",
            emoji(&ctx.output, "ℹ️ ", "[INFO]"),
            target.repo,
            args.upstream_version
        ),
    }
    Ok(())
}
