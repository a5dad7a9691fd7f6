//! # Collaborator Interfaces
//!
//! The release engine talks to three external systems, each behind a trait
//! so the engine can be driven by in-memory doubles in tests:
//!
//! - **`VersionControlHost`**: refs, tags, forks and pull requests on the
//!   hosting service. Implemented over the GitHub REST API in
//!   [`crate::github`].
//! - **`ProjectStore`**: checks a branch out as a [`ProjectTree`] and commits
//!   an edited tree back to a branch. Implemented with the system `git` in
//!   [`crate::git`].
//! - **`RepoDiscovery`**: lists the repositories of an organisation carrying
//!   a topic. Implemented in [`crate::github`].
//!
//! Every method is independently failable and none is retried. Callers that
//! must not fail on a remote error go through [`crate::refs`], which turns
//! failures into logged indicators.

use crate::error::Result;
use crate::project::ProjectTree;
use std::fmt;

/// A repository at a branch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
    pub branch: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            branch: branch.into(),
        }
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Browser URL of the repository under `base`, e.g. `https://github.com`.
    pub fn url(&self, base: &str) -> String {
        format!("{}/{}/{}", base.trim_end_matches('/'), self.owner, self.name)
    }

    /// The same repository at another branch.
    pub fn on_branch(&self, branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One repository to act on, with the credentials to do so
#[derive(Clone)]
pub struct ReleaseTarget {
    pub repo: RepoRef,
    token: Option<String>,
}

impl ReleaseTarget {
    pub fn new(repo: RepoRef, token: Option<String>) -> Self {
        Self { repo, token }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl fmt::Debug for ReleaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseTarget")
            .field("repo", &self.repo)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Ref, tag and pull-request operations of the hosting service
pub trait VersionControlHost: Send + Sync {
    /// Names of all tags of the repository.
    fn get_tags(&self, repo: &RepoRef) -> Result<Vec<String>>;

    /// Head commit of `branch`, `None` if the branch does not exist.
    fn get_branch_sha(&self, repo: &RepoRef, branch: &str) -> Result<Option<String>>;

    /// Creates tag `name` pointing at `sha`.
    fn create_tag_ref(&self, repo: &RepoRef, name: &str, sha: &str) -> Result<()>;

    fn delete_branch_ref(&self, repo: &RepoRef, branch: &str) -> Result<()>;

    /// Moves `branch` to `sha`.
    fn update_branch_ref(&self, repo: &RepoRef, branch: &str, sha: &str, force: bool) -> Result<()>;

    /// The repository this one was forked from, at its default branch.
    fn fork_parent(&self, repo: &RepoRef) -> Result<Option<RepoRef>>;

    /// Opens a pull request on `repo` merging `head` into `base`.
    fn create_pull_request(&self, repo: &RepoRef, head: &str, base: &str, title: &str) -> Result<()>;
}

/// Loads and stores repository content
pub trait ProjectStore: Send + Sync {
    /// Loads the repository content at `branch`.
    fn checkout(&self, target: &ReleaseTarget, branch: &str) -> Result<ProjectTree>;

    /// Commits the edits of `tree` to `branch`, creating the branch if needed.
    fn commit(&self, target: &ReleaseTarget, tree: &ProjectTree, branch: &str, message: &str) -> Result<()>;
}

/// Finds the repositories of an organisation
pub trait RepoDiscovery: Send + Sync {
    /// Repositories of `org` carrying `topic`, addressed at `branch`.
    fn find_repos(&self, org: &str, topic: &str, branch: &str) -> Result<Vec<RepoRef>>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_ref_names() {
        let repo = RepoRef::new("snowdrop", "rest-http-example", "sb-2.2.x");
        assert_eq!(repo.full_name(), "snowdrop/rest-http-example");
        assert_eq!(repo.to_string(), "snowdrop/rest-http-example");
        assert_eq!(
            repo.url("https://github.com/"),
            "https://github.com/snowdrop/rest-http-example"
        );
        assert_eq!(repo.on_branch("master").branch, "master");
    }

    #[test]
    fn test_release_target_debug_redacts_token() {
        let target = ReleaseTarget::new(
            RepoRef::new("snowdrop", "crud-example", "master"),
            Some("ghp_secret".to_string()),
        );
        let debug = format!("{:?}", target);
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("<redacted>"));
        assert_eq!(target.token(), Some("ghp_secret"));
    }
}
