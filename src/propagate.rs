//! Propagation of released versions and property values across the fleet.
//!
//! A BOM release is rolled out by rebasing every booster onto it and then
//! moving the BOM's own development version past the release. Property
//! updates go through pull requests so they can be reviewed.

use crate::config::{self, BranchPolicy, Config};
use crate::editors::{properties, versions, EditorChain};
use crate::error::{Error, Result};
use crate::fleet::{self, FleetSummary};
use crate::refs;
use crate::release::{edit_in_branch, EditOutcome};
use crate::repository::{ProjectStore, ReleaseTarget, VersionControlHost};
use crate::version;

/// Branch the boosters of `bom_version` are rebased on.
pub fn booster_branch_for(bom_version: &str, policy: &BranchPolicy) -> Result<String> {
    let line = version::release_line(bom_version)?;
    if policy.is_legacy(line) {
        Ok(policy.legacy_branch.clone())
    } else {
        Ok(policy.booster_branch.clone())
    }
}

/// Result of rolling out a BOM release
#[derive(Debug)]
pub struct BomPropagation {
    pub boosters: FleetSummary<EditOutcome>,
    pub bom_bump: EditOutcome,
}

/// Rebases `boosters` onto `bom_version`, committing to each target's
/// branch, then bumps the version of the `bom` repository.
///
/// An invalid BOM version is logged and ignored: `Ok(None)`.
pub fn propagate_bom_release(
    store: &dyn ProjectStore,
    boosters: &[ReleaseTarget],
    bom: &ReleaseTarget,
    bom_version: &str,
    config: &Config,
    ceiling: usize,
) -> Result<Option<BomPropagation>> {
    if version::validate_bom_version(bom_version).is_err() {
        log::warn!("ignoring release because the version '{}' is invalid", bom_version);
        return Ok(None);
    }

    let message = config::render(&config.release.bom_update_commit_message, bom_version);
    let rebase = EditorChain::new().then(versions::rebase_onto_bom(bom_version, &config.bom)?);
    let boosters = fleet::for_each_target(
        boosters,
        ceiling,
        |target| edit_in_branch(store, target, &rebase, &target.repo.branch, &target.repo.branch, &message),
        |_, _| {},
    )?;

    let bump = EditorChain::new().then(versions::bump_bom_for_release(bom_version));
    let bom_bump = edit_in_branch(
        store,
        bom,
        &bump,
        &bom.repo.branch,
        &bom.repo.branch,
        &config.release.bom_bump_commit_message,
    )?;
    Ok(Some(BomPropagation { boosters, bom_bump }))
}

/// Outcome of a property update on one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyUpdate {
    PullRequest { branch: String },
    Unchanged,
}

/// Branch a property update is pushed to.
pub fn property_branch(name: &str, value: &str) -> String {
    format!("update-{}-{}", name, value)
}

/// Sets property `name` to `value` on a fresh branch and opens a pull
/// request against the target's branch.
pub fn update_property(
    host: &dyn VersionControlHost,
    store: &dyn ProjectStore,
    target: &ReleaseTarget,
    name: &str,
    value: &str,
) -> Result<PropertyUpdate> {
    let branch = property_branch(name, value);
    let title = format!("Update {} to {}", name, value);
    let chain = EditorChain::new().then(properties::set_property(name, value));
    match edit_in_branch(store, target, &chain, &target.repo.branch, &branch, &title)? {
        EditOutcome::Unchanged => Ok(PropertyUpdate::Unchanged),
        EditOutcome::Committed => {
            if refs::raise_pull_request(host, &target.repo, &branch, &title) {
                Ok(PropertyUpdate::PullRequest { branch })
            } else {
                Err(Error::Host {
                    operation: "create_pull_request".to_string(),
                    repo: target.repo.full_name(),
                    message: format!("no pull request opened for '{}'", branch),
                })
            }
        }
    }
}

/// [`update_property`] across the fleet.
pub fn propagate_property(
    host: &dyn VersionControlHost,
    store: &dyn ProjectStore,
    targets: &[ReleaseTarget],
    name: &str,
    value: &str,
    ceiling: usize,
) -> Result<FleetSummary<PropertyUpdate>> {
    fleet::for_each_target(
        targets,
        ceiling,
        |target| update_property(host, store, target, name, value),
        |_, _| {},
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editors::tests::EXAMPLE_POM;
    use crate::filesystem::MemoryFS;
    use crate::pom::Pom;
    use crate::repository::mock::{MockHost, MockStore};
    use crate::repository::RepoRef;

    const BOM_POM: &str = "<project>\n  <artifactId>snowdrop-dependencies</artifactId>\n  <version>2.2.6-SNAPSHOT</version>\n</project>\n";

    fn files(pom: &str) -> MemoryFS {
        let mut fs = MemoryFS::new();
        fs.add_file_string("pom.xml", pom);
        fs
    }

    fn target(name: &str, branch: &str) -> ReleaseTarget {
        ReleaseTarget::new(RepoRef::new("snowdrop", name, branch), None)
    }

    #[test]
    fn test_booster_branch_for() {
        let policy = BranchPolicy::default();
        assert_eq!(booster_branch_for("1.5.22.Final", &policy).unwrap(), "master");
        assert_eq!(booster_branch_for("2.2.6.Final", &policy).unwrap(), "sb-2.1.x");
    }

    #[test]
    fn test_propagate_bom_release() {
        let store = MockStore::new()
            .with_tree("snowdrop/rest-http-example", files(EXAMPLE_POM))
            .with_tree("snowdrop/spring-boot-bom", files(BOM_POM));
        let config = Config::default();
        let boosters = vec![target("rest-http-example", "sb-2.1.x")];
        let bom = target("spring-boot-bom", "sb-2.2.x");

        let outcome = propagate_bom_release(&store, &boosters, &bom, "2.2.6.Final", &config, 2)
            .unwrap()
            .unwrap();
        assert!(outcome.boosters.is_clean());
        assert_eq!(outcome.bom_bump, EditOutcome::Committed);

        let commits = store.commits();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].message, "[booster-release] Update BOM to 2.2.6.Final");
        let booster = Pom::parse(&commits[0].files.get_string("pom.xml").unwrap().unwrap(), "pom.xml").unwrap();
        assert_eq!(booster.version.as_deref(), Some("2.2.6-1-SNAPSHOT"));
        assert_eq!(booster.properties["spring-boot-bom.version"], "2.2.6.Final");
        assert_eq!(booster.properties["spring-boot.version"], "2.2.6.RELEASE");

        assert_eq!(commits[1].message, "Bump BOM version [ci skip]");
        let bom = Pom::parse(&commits[1].files.get_string("pom.xml").unwrap().unwrap(), "pom.xml").unwrap();
        assert_eq!(bom.version.as_deref(), Some("2.2.6.SP1-SNAPSHOT"));
    }

    #[test]
    fn test_propagate_bom_release_ignores_invalid_version() {
        let store = MockStore::new();
        let config = Config::default();
        let result = propagate_bom_release(&store, &[], &target("spring-boot-bom", "master"), "2.2.6", &config, 1);
        assert!(result.unwrap().is_none());
        assert!(store.commits().is_empty());
    }

    #[test]
    fn test_update_property_opens_pull_request() {
        let host = MockHost::new();
        let store = MockStore::new().with_tree("snowdrop/rest-http-example", files(EXAMPLE_POM));
        let outcome = update_property(
            &host,
            &store,
            &target("rest-http-example", "sb-2.2.x"),
            "spring-boot-bom.version",
            "2.2.6.Final",
        )
        .unwrap();

        assert_eq!(
            outcome,
            PropertyUpdate::PullRequest {
                branch: "update-spring-boot-bom.version-2.2.6.Final".to_string()
            }
        );
        let prs = host.pull_requests.lock().unwrap().clone();
        assert_eq!(
            prs,
            vec![(
                "snowdrop/rest-http-example".to_string(),
                "update-spring-boot-bom.version-2.2.6.Final".to_string(),
                "sb-2.2.x".to_string(),
                "Update spring-boot-bom.version to 2.2.6.Final".to_string(),
            )]
        );
    }

    #[test]
    fn test_update_property_absent_is_unchanged() {
        let host = MockHost::new();
        let store = MockStore::new().with_tree("snowdrop/rest-http-example", files(EXAMPLE_POM));
        let outcome = update_property(&host, &store, &target("rest-http-example", "sb-2.2.x"), "netty.version", "4.1.45")
            .unwrap();
        assert_eq!(outcome, PropertyUpdate::Unchanged);
        assert!(host.pull_requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_propagate_property_collects_failures() {
        let mut host = MockHost::new();
        host.failing_repos.insert("snowdrop/crud-example".to_string());
        let store = MockStore::new()
            .with_tree("snowdrop/rest-http-example", files(EXAMPLE_POM))
            .with_tree("snowdrop/crud-example", files(EXAMPLE_POM));
        let targets = vec![
            target("rest-http-example", "sb-2.2.x"),
            target("crud-example", "sb-2.2.x"),
        ];
        let summary = propagate_property(&host, &store, &targets, "spring-boot.version", "2.2.6.RELEASE", 2).unwrap();
        assert_eq!(summary.succeeded.len(), 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].repo.name, "crud-example");
    }
}
