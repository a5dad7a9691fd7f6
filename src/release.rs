//! # Release Orchestration
//!
//! Releases one example repository. The release runs as a fixed sequence of
//! phases; each phase reads state written by the one before it.
//!
//! ```text
//! Idle -> CommunityEdit -> CommunityTag -> ProdEdit -> ProdTag -> VersionBump -> Done
//!              \________________\______________\__________\___________\-> Failed
//! ```
//!
//! 1. **CommunityEdit**: the community chain (strip `-SNAPSHOT`, substitute
//!    template placeholders, generate licenses) is applied to the starting
//!    branch and committed to a throwaway branch.
//! 2. **CommunityTag**: the throwaway branch head is tagged with the version
//!    read from the edited tree, then the branch is deleted. A failed tag
//!    leaves the branch in place for manual cleanup and the release goes on.
//! 3. **ProdEdit / ProdTag**: the same for the productized chain (qualify
//!    the version, bind the productized BOM).
//! 4. **VersionBump**: the revision bump is committed to the starting branch
//!    itself.
//!
//! An edit chain that changes nothing skips its tag phase. Any error while
//! editing, committing or reaching the host moves the release to `Failed`
//! and is returned tagged with the phase it happened in.

use crate::config::{Config, ProdBomBinding, ReleaseSettings};
use crate::editors::templates::TemplateTokens;
use crate::editors::{properties, templates, versions, EditorChain};
use crate::error::{Error, Result};
use crate::license::LicenseGenerator;
use crate::pom;
use crate::project::ProjectTree;
use crate::refs;
use crate::repository::{ProjectStore, ReleaseTarget, RepoRef, VersionControlHost};
use crate::version;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePhase {
    Idle,
    CommunityEdit,
    CommunityTag,
    ProdEdit,
    ProdTag,
    VersionBump,
    Done,
    Failed,
}

impl fmt::Display for ReleasePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleasePhase::Idle => "Idle",
            ReleasePhase::CommunityEdit => "CommunityEdit",
            ReleasePhase::CommunityTag => "CommunityTag",
            ReleasePhase::ProdEdit => "ProdEdit",
            ReleasePhase::ProdTag => "ProdTag",
            ReleasePhase::VersionBump => "VersionBump",
            ReleasePhase::Done => "Done",
            ReleasePhase::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Result of one tagged phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Tagged and throwaway branch removed.
    Tagged { tag: String },
    /// Tagging failed; `branch` is left behind for manual cleanup.
    TagFailed { tag: String, branch: String },
    /// The edit chain changed nothing, so nothing was tagged.
    Skipped,
}

/// Result of an edit committed straight to a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Committed,
    Unchanged,
}

/// Everything a finished release did to one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseReport {
    pub repo: RepoRef,
    pub community: PhaseOutcome,
    pub productized: PhaseOutcome,
    pub version_bump: EditOutcome,
}

/// Interactively supplied release inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseParams {
    /// Upstream framework release, e.g. `2.2.5.RELEASE`.
    pub framework_version: String,
    /// Productized BOM, e.g. `2.2.5.Beta1-redhat-00007`.
    pub prod_bom_version: String,
}

impl ReleaseParams {
    /// Validates both versions before anything is edited.
    pub fn new(framework_version: impl Into<String>, prod_bom_version: impl Into<String>) -> Result<Self> {
        let params = Self {
            framework_version: framework_version.into(),
            prod_bom_version: prod_bom_version.into(),
        };
        version::validate_upstream_version(&params.framework_version)?;
        version::validate_prod_bom_version(&params.prod_bom_version)?;
        Ok(params)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Community,
    Productized,
}

impl Variant {
    fn edit_phase(self) -> ReleasePhase {
        match self {
            Variant::Community => ReleasePhase::CommunityEdit,
            Variant::Productized => ReleasePhase::ProdEdit,
        }
    }

    fn tag_phase(self) -> ReleasePhase {
        match self {
            Variant::Community => ReleasePhase::CommunityTag,
            Variant::Productized => ReleasePhase::ProdTag,
        }
    }

    fn branch_prefix(self) -> &'static str {
        match self {
            Variant::Community => "temp-community",
            Variant::Productized => "temp-prod",
        }
    }
}

/// Name of a throwaway branch, unique per repository and run.
pub fn throwaway_branch_name(prefix: &str, repo: &str) -> String {
    format!("{}-{}-{}", prefix, repo, chrono::Utc::now().timestamp_millis())
}

/// Editor chains of one release
#[derive(Debug, Clone)]
pub struct ReleaseChains {
    pub community: EditorChain,
    pub productized: EditorChain,
    pub version_bump: EditorChain,
}

impl ReleaseChains {
    pub fn from_config(config: &Config, params: &ReleaseParams) -> Self {
        let tokens = TemplateTokens {
            glob: config.release.template_glob.clone(),
            version_token: config.release.version_token.clone(),
            framework_token: config.release.framework_token.clone(),
            framework_property: config.bom.framework_property.clone(),
        };
        let license = LicenseGenerator::from_config(&config.license);

        let mut community = EditorChain::new()
            .then(versions::strip_snapshot())
            .then(templates::substitute(tokens.clone(), Some(params.framework_version.clone())));

        let bind_bom = match config.release.prod_bom_binding {
            ProdBomBinding::ParentVersion => versions::set_parent_version(params.prod_bom_version.clone()),
            ProdBomBinding::Property => {
                properties::set_property(config.bom.bom_property.clone(), params.prod_bom_version.clone())
            }
        };
        let mut productized = EditorChain::new()
            .then(versions::qualify(config.release.qualifier.clone()))
            .then(bind_bom)
            .then(templates::substitute(tokens, Some(params.framework_version.clone())));

        if let Some(license) = license {
            community = community.then(license.clone().editor());
            productized = productized.then(license.editor());
        }

        Self {
            community,
            productized,
            version_bump: EditorChain::new().then(versions::bump_revision()),
        }
    }
}

/// Applies `chain` to `checkout_branch` and commits the result to `commit_branch`.
///
/// Nothing is committed when the chain leaves the content unchanged.
pub fn edit_in_branch(
    store: &dyn ProjectStore,
    target: &ReleaseTarget,
    chain: &EditorChain,
    checkout_branch: &str,
    commit_branch: &str,
    message: &str,
) -> Result<EditOutcome> {
    let tree = chain.apply(store.checkout(target, checkout_branch)?)?;
    if !tree.is_modified() {
        log::info!("{}: no changes on '{}', nothing to commit", target.repo, checkout_branch);
        return Ok(EditOutcome::Unchanged);
    }
    store.commit(target, &tree, commit_branch, message)?;
    Ok(EditOutcome::Committed)
}

/// Tracks and logs the phase of one release.
struct PhaseTracker<'r> {
    repo: &'r RepoRef,
    phase: ReleasePhase,
}

impl PhaseTracker<'_> {
    fn enter(&mut self, phase: ReleasePhase) {
        log::debug!("{}: {} -> {}", self.repo, self.phase, phase);
        self.phase = phase;
    }

    fn fail(&mut self, error: Error) -> Error {
        let phase = self.phase;
        log::error!("{}: release failed during {}: {}", self.repo, phase, error);
        self.phase = ReleasePhase::Failed;
        error.in_phase(self.repo.full_name(), phase)
    }
}

/// Releases single repositories
pub struct ReleaseOrchestrator<'a> {
    host: &'a dyn VersionControlHost,
    store: &'a dyn ProjectStore,
    chains: ReleaseChains,
    settings: ReleaseSettings,
}

impl<'a> ReleaseOrchestrator<'a> {
    pub fn new(
        host: &'a dyn VersionControlHost,
        store: &'a dyn ProjectStore,
        chains: ReleaseChains,
        settings: &ReleaseSettings,
    ) -> Self {
        Self {
            host,
            store,
            chains,
            settings: settings.clone(),
        }
    }

    /// Runs every phase for `target`, starting from `target.repo.branch`.
    pub fn release(&self, target: &ReleaseTarget) -> Result<ReleaseReport> {
        let mut tracker = PhaseTracker {
            repo: &target.repo,
            phase: ReleasePhase::Idle,
        };
        log::info!("{}: releasing from '{}'", target.repo, target.repo.branch);

        let community = self.tagged_release(target, Variant::Community, &mut tracker)?;
        let productized = self.tagged_release(target, Variant::Productized, &mut tracker)?;

        tracker.enter(ReleasePhase::VersionBump);
        let version_bump = edit_in_branch(
            self.store,
            target,
            &self.chains.version_bump,
            &target.repo.branch,
            &target.repo.branch,
            &self.settings.bump_commit_message,
        )
        .map_err(|e| tracker.fail(e))?;

        tracker.enter(ReleasePhase::Done);
        Ok(ReleaseReport {
            repo: target.repo.clone(),
            community,
            productized,
            version_bump,
        })
    }

    fn tagged_release(
        &self,
        target: &ReleaseTarget,
        variant: Variant,
        tracker: &mut PhaseTracker<'_>,
    ) -> Result<PhaseOutcome> {
        tracker.enter(variant.edit_phase());
        let chain = match variant {
            Variant::Community => &self.chains.community,
            Variant::Productized => &self.chains.productized,
        };

        let tree = self
            .edit(target, chain)
            .map_err(|e| tracker.fail(e))?;
        if !tree.is_modified() {
            log::info!("{}: {:?} edit changed nothing, not tagging", target.repo, variant);
            return Ok(PhaseOutcome::Skipped);
        }
        let tag = pom::current_version(&tree).map_err(|e| tracker.fail(e))?;
        let branch = throwaway_branch_name(variant.branch_prefix(), &target.repo.name);
        self.store
            .commit(target, &tree, &branch, &self.settings.tag_commit_message)
            .map_err(|e| tracker.fail(e))?;
        drop(tree);

        tracker.enter(variant.tag_phase());
        if refs::tag_branch(self.host, &target.repo, &branch, &tag) {
            refs::delete_branch(self.host, &target.repo, &branch);
            Ok(PhaseOutcome::Tagged { tag })
        } else {
            log::warn!(
                "{}: tag '{}' was not created, leaving branch '{}' for manual cleanup",
                target.repo,
                tag,
                branch
            );
            Ok(PhaseOutcome::TagFailed { tag, branch })
        }
    }

    fn edit(&self, target: &ReleaseTarget, chain: &EditorChain) -> Result<ProjectTree> {
        let tree = self.store.checkout(target, &target.repo.branch)?;
        chain.apply(tree)
    }
}
