//! # Catalog-PR Command Implementation
//!
//! Points the launcher catalog at the newest example tags of a framework
//! release and opens a pull request from the operator's catalog fork.

use anyhow::Result;
use clap::Args;

use booster_release::catalog::CatalogReconciler;
use booster_release::git::GitProjectStore;
use booster_release::github::GitHubClient;
use booster_release::output::emoji;
use booster_release::repository::{ReleaseTarget, RepoRef};
use booster_release::selector::{RepoFilter, RepoSelector};
use booster_release::version;

use super::{AuthArgs, Context};

/// Open a launcher catalog pull request
#[derive(Args, Debug)]
pub struct CatalogPrArgs {
    /// Upstream framework release, e.g. 2.2.5.RELEASE
    pub framework_version: String,

    /// Owner of the catalog fork the pull request is opened from.
    #[arg(long)]
    pub fork_owner: String,

    #[command(flatten)]
    pub auth: AuthArgs,
}

/// Execute the `catalog-pr` command.
pub fn execute(args: CatalogPrArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    version::validate_upstream_version(&args.framework_version)?;
    let branch = version::version_to_example_branch(&args.framework_version, &config.branches)?;

    let github = GitHubClient::new(&config.github, args.auth.token.clone());
    let repos: Vec<RepoRef> = RepoSelector::new(&github, &config)
        .select(&branch, &RepoFilter::default(), None)?
        .into_iter()
        .map(|target| target.repo)
        .collect();

    let catalog = ReleaseTarget::new(
        RepoRef::new(&args.fork_owner, &config.catalog.repo, &config.catalog.base_branch),
        args.auth.token.clone(),
    );
    let store = GitProjectStore::new(&config.github, &config.git);
    let reconciler = CatalogReconciler::new(&github, &config);

    if reconciler.publish(&store, &catalog, &args.framework_version, &repos)? {
        println!(
            "{} Opened catalog pull request for {} ({} examples)",
            emoji(&ctx.output, "✅", "[OK]"),
            args.framework_version,
            repos.len()
        );
    } else {
        println!(
            "{} Catalog already up to date for {}",
            emoji(&ctx.output, "ℹ️ ", "[INFO]"),
            args.framework_version
        );
    }
    Ok(())
}
