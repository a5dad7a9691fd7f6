//! Repository selection.
//!
//! Resolves the set of repositories a command operates on: every repository
//! of the configured organisation carrying the booster topic, addressed at
//! one branch, minus the BOM and catalog repositories and any names the
//! caller excludes.

use crate::config::Config;
use crate::error::Result;
use crate::repository::{ReleaseTarget, RepoDiscovery};
use regex::Regex;

/// Name-based narrowing of the discovered repositories
#[derive(Debug, Clone, Default)]
pub struct RepoFilter {
    /// When non-empty, only these repositories are kept.
    pub only: Vec<String>,
    pub exclude: Vec<String>,
}

impl RepoFilter {
    fn accepts(&self, name: &str) -> bool {
        (self.only.is_empty() || self.only.iter().any(|n| n == name))
            && !self.exclude.iter().any(|n| n == name)
    }
}

pub struct RepoSelector<'a> {
    discovery: &'a dyn RepoDiscovery,
    config: &'a Config,
}

impl<'a> RepoSelector<'a> {
    pub fn new(discovery: &'a dyn RepoDiscovery, config: &'a Config) -> Self {
        Self { discovery, config }
    }

    /// Release targets on `branch`, sorted by name.
    pub fn select(&self, branch: &str, filter: &RepoFilter, token: Option<&str>) -> Result<Vec<ReleaseTarget>> {
        let repos = self
            .discovery
            .find_repos(&self.config.org, &self.config.topic, branch)?;
        let mut targets: Vec<ReleaseTarget> = repos
            .into_iter()
            .filter(|repo| repo.name != self.config.bom.repo && repo.name != self.config.catalog.repo)
            .filter(|repo| filter.accepts(&repo.name))
            .map(|repo| ReleaseTarget::new(repo, token.map(str::to_string)))
            .collect();
        targets.sort_by(|a, b| a.repo.name.cmp(&b.repo.name));
        log::info!(
            "Selected {} repositories of {} with topic '{}' on '{}'",
            targets.len(),
            self.config.org,
            self.config.topic,
            branch
        );
        Ok(targets)
    }
}

/// Short name of a booster repository: the first capture of `pattern`, or
/// the full name when it does not match.
pub fn booster_simple_name<'n>(name: &'n str, pattern: &Regex) -> &'n str {
    pattern
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(name)
}

/// Catalog key of a repository, after the configured name overrides.
pub fn catalog_key(name: &str, config: &Config) -> Result<String> {
    let pattern = config.name_pattern()?;
    let simple = booster_simple_name(name, &pattern);
    Ok(config
        .catalog
        .name_overrides
        .get(simple)
        .cloned()
        .unwrap_or_else(|| simple.to_string()))
}
