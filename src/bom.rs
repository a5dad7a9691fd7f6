//! # BOM synchronisation
//!
//! Keeps the BOM repository aligned with the upstream framework BOM. The
//! upstream `spring-boot-dependencies` POM is fetched, its properties are
//! diffed against ours and every property we both declare with a different
//! value is copied over, except for the configured deny-list. The framework
//! property is always set to the upstream release.
//!
//! The README documents the aligned versions as
//!
//! ```text
//! // tomcat
//! - Tomcat: 9.0.31
//! ```
//!
//! where the comment names the property (without `.version`); the value
//! after the last colon of the following line is rewritten with the POM.

use crate::config::{BomConfig, BranchPolicy, GitHubConfig};
use crate::editors::{properties, versions, Editor};
use crate::error::{Error, Result};
use crate::pom::{self, Pom};
use crate::project::{ProjectTree, ROOT_POM};
use crate::version;
use reqwest::blocking::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Source of upstream BOM documents
pub trait UpstreamBomSource: Send + Sync {
    /// Returns the upstream BOM POM of `upstream_version`.
    fn fetch(&self, upstream_version: &str) -> Result<String>;
}

/// Fetches upstream BOMs over HTTP
pub struct HttpBomSource {
    client: Client,
    upstream_url: String,
    legacy_upstream_url: String,
    branches: BranchPolicy,
}

impl HttpBomSource {
    pub fn new(github: &GitHubConfig, bom: &BomConfig, branches: &BranchPolicy) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(github.timeout_secs))
                .build()
                .unwrap_or_else(|_| Client::new()),
            upstream_url: bom.upstream_url.clone(),
            legacy_upstream_url: bom.legacy_upstream_url.clone(),
            branches: branches.clone(),
        }
    }

    /// Location of the upstream BOM; legacy lines use the old project layout.
    pub fn url_for(&self, upstream_version: &str) -> String {
        let template = if self.branches.is_legacy(upstream_version) {
            &self.legacy_upstream_url
        } else {
            &self.upstream_url
        };
        crate::config::render(template, upstream_version)
    }
}

impl UpstreamBomSource for HttpBomSource {
    fn fetch(&self, upstream_version: &str) -> Result<String> {
        let url = self.url_for(upstream_version);
        log::debug!("fetching upstream BOM from {}", url);
        let network_error = |message: String| Error::Network {
            url: url.clone(),
            message,
        };
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| network_error(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(network_error(format!(
                "no upstream BOM for '{}' ({})",
                upstream_version, status
            )));
        }
        response.text().map_err(|e| network_error(e.to_string()))
    }
}

/// Properties declared by both POMs whose values differ, mapped to the
/// reference value. Names in `deny` are never included.
pub fn property_updates(reference: &Pom, existing: &Pom, deny: &[String]) -> BTreeMap<String, String> {
    existing
        .properties
        .iter()
        .filter(|(name, _)| !deny.contains(name))
        .filter_map(|(name, value)| match reference.properties.get(name) {
            Some(upstream) if upstream != value => Some((name.clone(), upstream.clone())),
            _ => None,
        })
        .collect()
}

/// Rewrites the README lines documenting updated properties.
///
/// A `// name` comment marks the next line as documenting `name.version`.
/// Lines without a colon, or whose property was not updated, pass through.
pub fn rewrite_readme(content: &str, updates: &BTreeMap<String, String>) -> String {
    let mut pending: Option<String> = None;
    let mut lines = Vec::new();
    for line in content.split('\n') {
        if let Some(name) = line.trim_start().strip_prefix("//") {
            pending = Some(format!("{}.version", name.trim()));
            lines.push(line.to_string());
            continue;
        }
        let rewritten = pending
            .take()
            .and_then(|property| updates.get(&property))
            .and_then(|value| line.rfind(':').map(|idx| format!("{}: {}", &line[..idx], value)));
        lines.push(rewritten.unwrap_or_else(|| line.to_string()));
    }
    lines.join("\n")
}

/// Fetches upstream, diffs it against the root POM and applies the updates
/// plus the framework property. Returns everything that was set.
fn apply_upstream(
    tree: &mut ProjectTree,
    source: &dyn UpstreamBomSource,
    upstream_version: &str,
    config: &BomConfig,
) -> Result<BTreeMap<String, String>> {
    let reference = Pom::parse(&source.fetch(upstream_version)?, "upstream pom.xml")?;
    let existing = Pom::parse(&tree.require_file(ROOT_POM)?, ROOT_POM)?;

    let mut updates = property_updates(&reference, &existing, &config.ignored_properties);
    log::info!(
        "{}: updating {} propert{} from upstream {}",
        tree.name(),
        updates.len(),
        if updates.len() == 1 { "y" } else { "ies" },
        upstream_version
    );
    for (name, value) in &updates {
        log::debug!("{}: {} -> {}", tree.name(), name, value);
    }
    updates.insert(config.framework_property.clone(), upstream_version.to_string());
    properties::apply_properties(tree, &updates)?;
    Ok(updates)
}

fn update_readme(tree: &mut ProjectTree, readme: &str, updates: &BTreeMap<String, String>) -> Result<()> {
    match tree.get_file(readme)? {
        Some(content) => {
            let rewritten = rewrite_readme(&content, updates);
            tree.set_file(readme, &rewritten);
        }
        None => log::debug!("{}: no {} to update", tree.name(), readme),
    }
    Ok(())
}

fn snapshot_of(upstream_version: &str) -> Result<String> {
    version::numeric_core(upstream_version)
        .map(|core| format!("{}{}", core, version::SNAPSHOT_SUFFIX))
        .ok_or_else(|| Error::InvalidUpstreamVersion {
            version: upstream_version.to_string(),
        })
}

/// Builds the editor syncing the BOM with an upstream release.
///
/// The version is reset to `{core}-SNAPSHOT` unless it already starts with
/// the upstream core, so running the sync twice leaves the version alone.
pub fn sync_from_upstream(
    source: Arc<dyn UpstreamBomSource>,
    upstream_version: &str,
    config: &BomConfig,
) -> Result<Editor> {
    if let Err(e) = version::validate_upstream_version(upstream_version) {
        log::warn!("'{}' is not an upstream release, e.g. '1.5.15.RELEASE'", upstream_version);
        return Err(e);
    }
    let upstream_version = upstream_version.to_string();
    let snapshot = snapshot_of(&upstream_version)?;
    let config = config.clone();

    Ok(Editor::new(format!("sync-bom-from-upstream {}", upstream_version), move |mut tree| {
        let updates = apply_upstream(&mut tree, source.as_ref(), &upstream_version, &config)?;
        update_readme(&mut tree, &config.readme, &updates)?;

        let core = snapshot.trim_end_matches(version::SNAPSHOT_SUFFIX);
        let current = pom::current_version(&tree)?;
        if current.starts_with(core) {
            log::debug!("{}: version {} already on {}", tree.name(), current, core);
        } else {
            versions::apply_project_version(&mut tree, &snapshot)?;
        }
        Ok(tree)
    }))
}

/// Builds the editor aligning a project whose parent is the upstream BOM.
///
/// Unlike [`sync_from_upstream`] the version is always reset and the parent
/// moves to the upstream release.
pub fn align_with_upstream(
    source: Arc<dyn UpstreamBomSource>,
    upstream_version: &str,
    config: &BomConfig,
) -> Result<Editor> {
    version::validate_upstream_version(upstream_version)?;
    let upstream_version = upstream_version.to_string();
    let snapshot = snapshot_of(&upstream_version)?;
    let config = config.clone();

    Ok(Editor::new(format!("align-with-upstream {}", upstream_version), move |mut tree| {
        let updates = apply_upstream(&mut tree, source.as_ref(), &upstream_version, &config)?;
        versions::apply_parent_version(&mut tree, &upstream_version)?;
        versions::apply_project_version(&mut tree, &snapshot)?;
        update_readme(&mut tree, &config.readme, &updates)?;
        Ok(tree)
    }))
}
