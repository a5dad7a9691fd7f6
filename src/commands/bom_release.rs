//! # BOM Release Command Implementation
//!
//! Rolls a released BOM out to the fleet: every booster is rebased onto the
//! BOM and the BOM's own development version moves past the release.

use anyhow::Result;
use clap::Args;

use booster_release::git::GitProjectStore;
use booster_release::github::GitHubClient;
use booster_release::output::{self, emoji};
use booster_release::propagate;
use booster_release::release::EditOutcome;
use booster_release::selector::{RepoFilter, RepoSelector};
use booster_release::version;

use super::{AuthArgs, Context, RepoArgs};

/// Propagate a BOM release to the boosters
#[derive(Args, Debug)]
pub struct BomReleaseArgs {
    /// Released BOM version, e.g. 2.2.6.Final
    pub bom_version: String,

    /// Location of the BOM repository; the branch defaults to the maintenance branch.
    #[command(flatten)]
    pub bom: RepoArgs,

    /// Number of repositories updated at the same time.
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[command(flatten)]
    pub auth: AuthArgs,
}

/// Execute the `bom-release` command.
pub fn execute(args: BomReleaseArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    if version::validate_bom_version(&args.bom_version).is_err() {
        log::warn!("ignoring BOM release '{}': not a BOM version", args.bom_version);
        println!(
            "{} '{}' is not a BOM version, nothing to do",
            emoji(&ctx.output, "ℹ️ ", "[INFO]"),
            args.bom_version
        );
        return Ok(());
    }

    let booster_branch = propagate::booster_branch_for(&args.bom_version, &config.branches)?;
    let bom_branch = version::version_to_branch(&args.bom_version, &config.branches)?;
    let bom = args.bom.target(&config, &config.bom.repo, bom_branch, &args.auth);

    let github = GitHubClient::new(&config.github, args.auth.token.clone());
    let boosters =
        RepoSelector::new(&github, &config).select(&booster_branch, &RepoFilter::default(), args.auth.token.as_deref())?;
    let store = GitProjectStore::new(&config.github, &config.git);

    println!(
        "{} Updating {} boosters on '{}' to BOM {}",
        emoji(&ctx.output, "🔄", "[UPDATE]"),
        boosters.len(),
        booster_branch,
        args.bom_version
    );
    let ceiling = super::ceiling(&config, args.concurrency);
    let Some(outcome) =
        propagate::propagate_bom_release(&store, &boosters, &bom, &args.bom_version, &config, ceiling)?
    else {
        return Ok(());
    };

    let changed = outcome
        .boosters
        .succeeded
        .iter()
        .filter(|o| **o == EditOutcome::Committed)
        .count();
    output::print_failures(&ctx.output, &outcome.boosters.failures);
    println!(
        "{} {} of {} boosters updated",
        emoji(&ctx.output, "✅", "[OK]"),
        changed,
        outcome.boosters.total()
    );
    match outcome.bom_bump {
        EditOutcome::Committed => println!("{} BOM version bumped on {}", emoji(&ctx.output, "📦", "[BOM]"), bom.repo),
        EditOutcome::Unchanged => println!("{} BOM version unchanged", emoji(&ctx.output, "📦", "[BOM]")),
    }
    Ok(())
}
