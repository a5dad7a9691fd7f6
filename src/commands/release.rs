//! # Release Command Implementation
//!
//! Releases every example of the organisation from one branch. Each
//! repository gets a community and a productized tag and its development
//! version is bumped. Repositories are released concurrently; a failing
//! repository is reported in the summary and does not stop the others.

use anyhow::Result;
use clap::Args;

use booster_release::environment;
use booster_release::fleet::FleetReleaseCoordinator;
use booster_release::git::GitProjectStore;
use booster_release::github::GitHubClient;
use booster_release::output::{self, emoji};
use booster_release::release::{ReleaseChains, ReleaseOrchestrator, ReleaseParams};
use booster_release::selector::{RepoFilter, RepoSelector};
use booster_release::version;

use super::{AuthArgs, Context};

/// Release all examples
#[derive(Args, Debug)]
pub struct ReleaseArgs {
    /// Upstream framework release, e.g. 2.2.5.RELEASE
    pub framework_version: String,

    /// Productized BOM version, e.g. 2.2.5.Beta1-redhat-00007
    pub prod_bom_version: String,

    /// Branch to release from; derived from the framework version by default.
    #[arg(long)]
    pub branch: Option<String>,

    /// Only release these repositories.
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Never release these repositories.
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Number of repositories released at the same time.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Do not require the internal build host to resolve.
    #[arg(long)]
    pub skip_environment_check: bool,

    #[command(flatten)]
    pub auth: AuthArgs,
}

/// Execute the `release` command.
pub fn execute(args: ReleaseArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let params = ReleaseParams::new(&args.framework_version, &args.prod_bom_version)?;
    if !args.skip_environment_check {
        environment::check(config.release.required_host.as_deref())?;
    }
    let branch = match args.branch {
        Some(branch) => branch,
        None => version::version_to_example_branch(&params.framework_version, &config.branches)?,
    };

    let github = GitHubClient::new(&config.github, args.auth.token.clone());
    let filter = RepoFilter {
        only: args.only,
        exclude: args.exclude,
    };
    let targets = RepoSelector::new(&github, &config).select(&branch, &filter, args.auth.token.as_deref())?;
    if targets.is_empty() {
        println!("{} No repositories to release on '{}'", emoji(&ctx.output, "ℹ️ ", "[INFO]"), branch);
        return Ok(());
    }

    let store = GitProjectStore::new(&config.github, &config.git);
    let orchestrator = ReleaseOrchestrator::new(
        &github,
        &store,
        ReleaseChains::from_config(&config, &params),
        &config.release,
    );
    let coordinator = FleetReleaseCoordinator::new(&orchestrator, Some(super::ceiling(&config, args.concurrency)));
    println!(
        "{} Releasing {} repositories from '{}' ({} at a time)",
        emoji(&ctx.output, "🚀", "[RELEASE]"),
        targets.len(),
        branch,
        coordinator.ceiling()
    );

    let progress = output::fleet_progress(&ctx.output, targets.len());
    let summary = coordinator.release_all(&targets, |target, _| {
        progress.set_message(target.repo.name.clone());
        progress.inc(1);
    })?;
    progress.finish_and_clear();

    output::print_release_summary(&ctx.output, &summary);
    Ok(())
}
