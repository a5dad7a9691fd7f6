//! Failure-tolerant ref operations.
//!
//! Wrappers around [`VersionControlHost`] for callers that must keep going
//! when the host fails: every failure is logged here and reported to the
//! caller as `false` or `None`.

use crate::repository::{RepoRef, VersionControlHost};

/// Head commit of `branch`, `None` if it is missing or the lookup failed.
pub fn get_sha_of_latest_commit(host: &dyn VersionControlHost, repo: &RepoRef, branch: &str) -> Option<String> {
    match host.get_branch_sha(repo, branch) {
        Ok(Some(sha)) => Some(sha),
        Ok(None) => {
            log::warn!("{}: branch '{}' does not exist", repo, branch);
            None
        }
        Err(e) => {
            log::error!("{}: failed to read head of '{}': {}", repo, branch, e);
            None
        }
    }
}

/// Tags the head of `branch` as `tag`.
pub fn tag_branch(host: &dyn VersionControlHost, repo: &RepoRef, branch: &str, tag: &str) -> bool {
    let Some(sha) = get_sha_of_latest_commit(host, repo, branch) else {
        log::error!("{}: cannot tag '{}', head of '{}' is unknown", repo, tag, branch);
        return false;
    };
    match host.create_tag_ref(repo, tag, &sha) {
        Ok(()) => {
            log::info!("{}: tagged {} as {}", repo, sha, tag);
            true
        }
        Err(e) => {
            log::error!("{}: failed to create tag '{}': {}", repo, tag, e);
            false
        }
    }
}

pub fn delete_branch(host: &dyn VersionControlHost, repo: &RepoRef, branch: &str) -> bool {
    match host.delete_branch_ref(repo, branch) {
        Ok(()) => {
            log::debug!("{}: deleted branch '{}'", repo, branch);
            true
        }
        Err(e) => {
            log::error!("{}: failed to delete branch '{}': {}", repo, branch, e);
            false
        }
    }
}

/// Fast-forwards (by force) a fork's branch to its upstream's default branch.
///
/// A repository that is not a fork has nothing to sync and counts as synced.
pub fn sync_fork_with_upstream(host: &dyn VersionControlHost, repo: &RepoRef) -> bool {
    let upstream = match host.fork_parent(repo) {
        Ok(Some(upstream)) => upstream,
        Ok(None) => {
            log::debug!("{} is not a fork, nothing to sync", repo);
            return true;
        }
        Err(e) => {
            log::error!("{}: failed to look up fork parent: {}", repo, e);
            return false;
        }
    };
    let Some(sha) = get_sha_of_latest_commit(host, &upstream, &upstream.branch) else {
        return false;
    };
    match host.update_branch_ref(repo, &repo.branch, &sha, true) {
        Ok(()) => {
            log::info!("{}: synced '{}' with {}@{}", repo, repo.branch, upstream, upstream.branch);
            true
        }
        Err(e) => {
            log::error!("{}: failed to sync with {}: {}", repo, upstream, e);
            false
        }
    }
}

/// Opens a pull request from `branch` of a fork against its upstream.
///
/// Repositories that are not forks get the pull request against `repo.branch`
/// of the repository itself.
pub fn raise_pull_request(host: &dyn VersionControlHost, repo: &RepoRef, branch: &str, title: &str) -> bool {
    let (target, head) = match host.fork_parent(repo) {
        Ok(Some(upstream)) => (upstream, format!("{}:{}", repo.owner, branch)),
        Ok(None) => (repo.clone(), branch.to_string()),
        Err(e) => {
            log::error!("{}: failed to look up fork parent: {}", repo, e);
            return false;
        }
    };
    match host.create_pull_request(&target, &head, &target.branch, title) {
        Ok(()) => {
            log::info!("{}: opened pull request '{}' from {}", target, title, head);
            true
        }
        Err(e) => {
            log::error!("{}: failed to open pull request from {}: {}", target, head, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::mock::MockHost;

    fn repo() -> RepoRef {
        RepoRef::new("snowdrop", "crud-example", "sb-2.2.x")
    }

    #[test]
    fn test_tag_branch_uses_branch_head() {
        let host = MockHost::new();
        assert!(tag_branch(&host, &repo(), "temp-community-1", "2.2.5-3"));
        assert_eq!(
            host.created_tags(),
            vec![(
                "snowdrop/crud-example".to_string(),
                "2.2.5-3".to_string(),
                "crud-example-temp-community-1-head".to_string()
            )]
        );
    }

    #[test]
    fn test_tag_branch_missing_branch() {
        let mut host = MockHost::new();
        host.missing_branches.insert("gone".to_string());
        assert!(!tag_branch(&host, &repo(), "gone", "2.2.5-3"));
        assert!(host.created_tags().is_empty());
    }

    #[test]
    fn test_failures_become_indicators() {
        let mut host = MockHost::new();
        host.failing_repos.insert("snowdrop/crud-example".to_string());
        assert_eq!(get_sha_of_latest_commit(&host, &repo(), "sb-2.2.x"), None);
        assert!(!delete_branch(&host, &repo(), "temp"));
        assert!(!sync_fork_with_upstream(&host, &repo()));
    }

    #[test]
    fn test_sync_fork_forces_upstream_head() {
        let mut host = MockHost::new();
        host.parent = Some(RepoRef::new("fabric8-launcher", "launcher-booster-catalog", "master"));
        let fork = RepoRef::new("me", "launcher-booster-catalog", "master");
        assert!(sync_fork_with_upstream(&host, &fork));
        let updated = host.updated_refs.lock().unwrap().clone();
        assert_eq!(
            updated,
            vec![(
                "me/launcher-booster-catalog".to_string(),
                "master".to_string(),
                "launcher-booster-catalog-master-head".to_string(),
                true
            )]
        );
    }

    #[test]
    fn test_sync_of_non_fork_is_noop() {
        let host = MockHost::new();
        assert!(sync_fork_with_upstream(&host, &repo()));
        assert!(host.updated_refs.lock().unwrap().is_empty());
    }

    #[test]
    fn test_pull_request_against_upstream() {
        let mut host = MockHost::new();
        host.parent = Some(RepoRef::new("fabric8-launcher", "launcher-booster-catalog", "master"));
        let fork = RepoRef::new("me", "launcher-booster-catalog", "master");
        assert!(raise_pull_request(&host, &fork, "update-to-spring-boot-2.2.5.RELEASE", "Update"));
        let prs = host.pull_requests.lock().unwrap().clone();
        assert_eq!(prs[0].0, "fabric8-launcher/launcher-booster-catalog");
        assert_eq!(prs[0].1, "me:update-to-spring-boot-2.2.5.RELEASE");
        assert_eq!(prs[0].2, "master");
    }
}
