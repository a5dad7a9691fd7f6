//! # Update-Property Command Implementation
//!
//! Sets one POM property through a pull request, either on a single
//! repository or on every example of the organisation.

use anyhow::Result;
use clap::Args;

use booster_release::git::GitProjectStore;
use booster_release::github::GitHubClient;
use booster_release::output::{self, emoji};
use booster_release::propagate::{self, PropertyUpdate};
use booster_release::selector::{RepoFilter, RepoSelector};

use super::{AuthArgs, Context};

/// Update a POM property through pull requests
#[derive(Args, Debug)]
pub struct UpdatePropertyArgs {
    /// Property name, e.g. spring-boot-bom.version
    pub name: String,

    /// New value, e.g. 2.2.6.Final
    pub value: String,

    /// Branch the pull requests target.
    #[arg(long)]
    pub branch: String,

    /// Only update these repositories; all examples by default.
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Number of repositories updated at the same time.
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[command(flatten)]
    pub auth: AuthArgs,
}

/// Execute the `update-property` command.
pub fn execute(args: UpdatePropertyArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let github = GitHubClient::new(&config.github, args.auth.token.clone());
    let filter = RepoFilter {
        only: args.only,
        exclude: Vec::new(),
    };
    let targets = RepoSelector::new(&github, &config).select(&args.branch, &filter, args.auth.token.as_deref())?;
    let store = GitProjectStore::new(&config.github, &config.git);

    let summary = propagate::propagate_property(
        &github,
        &store,
        &targets,
        &args.name,
        &args.value,
        super::ceiling(&config, args.concurrency),
    )?;

    let opened = summary
        .succeeded
        .iter()
        .filter(|u| matches!(u, PropertyUpdate::PullRequest { .. }))
        .count();
    output::print_failures(&ctx.output, &summary.failures);
    println!(
        "{} Opened {} pull request(s) setting {} to {} ({} repositories checked)",
        emoji(&ctx.output, "✅", "[OK]"),
        opened,
        args.name,
        args.value,
        summary.total()
    );
    Ok(())
}
