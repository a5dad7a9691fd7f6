//! # CLI Command Implementations
//!
//! Each subcommand of `booster-release` lives in its own file with an
//! `Args` struct derived using `clap` and an `execute` function that calls
//! into the `booster_release` library.
//!
//! Fleet commands report their per-repository outcome and exit successfully
//! once every repository has been processed; single-repository commands
//! fail with the first error.

pub mod align_bom;
pub mod bom_release;
pub mod catalog_pr;
pub mod generate_licenses;
pub mod release;
pub mod release_one;
pub mod sync_bom;
pub mod update_property;
pub mod version;

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use booster_release::config::Config;
use booster_release::fleet;
use booster_release::output::OutputConfig;
use booster_release::repository::{ReleaseTarget, RepoRef};

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub output: OutputConfig,
}

impl Context {
    pub fn load_config(&self) -> Result<Config> {
        Config::load(self.config_path.as_deref()).map_err(|e| match &self.config_path {
            Some(path) => anyhow::anyhow!("Failed to load config from {}: {}", path.display(), e),
            None => anyhow::anyhow!("Failed to load config: {}", e),
        })
    }
}

/// GitHub credentials
#[derive(Args, Debug, Clone)]
pub struct AuthArgs {
    /// GitHub token used for API calls and pushes.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Addressing of a single repository
#[derive(Args, Debug, Clone)]
pub struct RepoArgs {
    /// Repository owner; defaults to the configured organisation.
    #[arg(long)]
    pub owner: Option<String>,

    /// Branch to work on.
    #[arg(long)]
    pub branch: Option<String>,
}

impl RepoArgs {
    pub fn target(&self, config: &Config, name: &str, default_branch: String, auth: &AuthArgs) -> ReleaseTarget {
        let owner = self.owner.clone().unwrap_or_else(|| config.org.clone());
        let branch = self.branch.clone().unwrap_or(default_branch);
        ReleaseTarget::new(RepoRef::new(owner, name, branch), auth.token.clone())
    }
}

/// Worker count of a fleet run: flag, then config, then the default ceiling.
pub fn ceiling(config: &Config, flag: Option<usize>) -> usize {
    flag.or(config.release.concurrency)
        .unwrap_or_else(fleet::concurrency_ceiling)
}
