//! # Release-One Command Implementation
//!
//! Releases a single example. Unlike `release`, the first failure is the
//! command's failure.

use anyhow::Result;
use clap::Args;

use booster_release::environment;
use booster_release::git::GitProjectStore;
use booster_release::github::GitHubClient;
use booster_release::output;
use booster_release::release::{ReleaseChains, ReleaseOrchestrator, ReleaseParams};
use booster_release::version;

use super::{AuthArgs, Context, RepoArgs};

/// Release a single example
#[derive(Args, Debug)]
pub struct ReleaseOneArgs {
    /// Repository name, e.g. rest-http-example
    pub repo: String,

    /// Upstream framework release, e.g. 2.2.5.RELEASE
    pub framework_version: String,

    /// Productized BOM version, e.g. 2.2.5.Beta1-redhat-00007
    pub prod_bom_version: String,

    #[command(flatten)]
    pub location: RepoArgs,

    /// Do not require the internal build host to resolve.
    #[arg(long)]
    pub skip_environment_check: bool,

    #[command(flatten)]
    pub auth: AuthArgs,
}

/// Execute the `release-one` command.
pub fn execute(args: ReleaseOneArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let params = ReleaseParams::new(&args.framework_version, &args.prod_bom_version)?;
    if !args.skip_environment_check {
        environment::check(config.release.required_host.as_deref())?;
    }
    let default_branch = version::version_to_example_branch(&params.framework_version, &config.branches)?;
    let target = args.location.target(&config, &args.repo, default_branch, &args.auth);

    let github = GitHubClient::new(&config.github, args.auth.token.clone());
    let store = GitProjectStore::new(&config.github, &config.git);
    let orchestrator = ReleaseOrchestrator::new(
        &github,
        &store,
        ReleaseChains::from_config(&config, &params),
        &config.release,
    );

    let report = orchestrator.release(&target)?;
    output::print_release(&ctx.output, &report);
    Ok(())
}
