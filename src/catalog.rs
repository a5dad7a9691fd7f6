//! Launcher catalog reconciliation
//!
//! The launcher catalog points every example at the tag it should be
//! served from, once per variant (community and productized). After a
//! release, [`CatalogReconciler`] looks up the newest tag of each example for
//! the released framework version and rewrites the catalog in place:
//!
//! - the JSON catalog (`catalog.json`): the `ref` of the entry matching the
//!   repository URL, runtime and variant id;
//! - the metadata documents (`metadata.json` or `metadata.yaml`): the
//!   human-readable variant labels;
//! - per-example descriptors (`{runtime}/{variant}/{key}/booster.yaml`):
//!   `source.git.ref`.
//!
//! Entries with no matching tag are left as they are. YAML documents are
//! edited in place so comments and formatting of untouched lines survive.

use crate::config::{self, Config, VariantConfig};
use crate::error::{Error, Result};
use crate::project::ProjectTree;
use crate::refs;
use crate::repository::{ProjectStore, ReleaseTarget, RepoRef, VersionControlHost};
use crate::selector;
use crate::version;
use crate::yaml_text::{self, Segment};
use serde_json::Value as Json;
use serde_yaml::Value as Yaml;

const DESCRIPTOR_FILE: &str = "booster.yaml";

/// Newest tag on each side of a framework version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestTags {
    pub community: Option<String>,
    pub productized: Option<String>,
}

impl LatestTags {
    fn get(&self, side: Side) -> Option<&str> {
        match side {
            Side::Community => self.community.as_deref(),
            Side::Productized => self.productized.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Community,
    Productized,
}

const SIDES: [Side; 2] = [Side::Community, Side::Productized];

/// Picks the highest-revision tag of `framework_version`'s numeric core,
/// separately for tags carrying `marker` and tags without it.
///
/// Revisions compare numerically: `2.3.0-10` is newer than `2.3.0-9`.
pub fn latest_tags(tags: &[String], framework_version: &str, marker: &str) -> Result<LatestTags> {
    let core = version::numeric_core(framework_version).ok_or_else(|| Error::InvalidUpstreamVersion {
        version: framework_version.to_string(),
    })?;
    let prefix = format!("{}-", core);

    let mut community: Option<(u64, &String)> = None;
    let mut productized: Option<(u64, &String)> = None;
    for tag in tags {
        let Some(rest) = tag.strip_prefix(&prefix) else {
            continue;
        };
        let Some(revision) = rest.split('-').next().and_then(|r| r.parse::<u64>().ok()) else {
            continue;
        };
        let slot = if tag.contains(marker) {
            &mut productized
        } else {
            &mut community
        };
        if slot.map_or(true, |(best, _)| revision > best) {
            *slot = Some((revision, tag));
        }
    }

    Ok(LatestTags {
        community: community.map(|(_, tag)| tag.clone()),
        productized: productized.map(|(_, tag)| tag.clone()),
    })
}

/// Writes JSON the way the catalog repository formats it.
fn to_pretty_json(value: &Json, trailing_newline: bool) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value)?;
    if trailing_newline {
        out.push('\n');
    }
    Ok(out)
}

/// Syntax of a metadata document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Json,
    Yaml,
}

impl DocFormat {
    /// Format of the document at `path`, by extension.
    pub fn from_path(path: &str) -> Self {
        if path.ends_with(".yaml") || path.ends_with(".yml") {
            DocFormat::Yaml
        } else {
            DocFormat::Json
        }
    }
}

/// Keeps the in-place edit when it parses to `expected`, otherwise rewrites
/// the whole document.
fn keep_layout(edited: Option<String>, expected: &Yaml, document: &str) -> Result<String> {
    if let Some(text) = edited {
        if serde_yaml::from_str::<Yaml>(&text).ok().as_ref() == Some(expected) {
            return Ok(text);
        }
    }
    log::warn!("{}: cannot be edited in place, rewriting the whole document", document);
    Ok(serde_yaml::to_string(expected)?)
}

/// Sets `source.git.ref` of a descriptor, keeping every other line.
pub fn set_descriptor_ref(content: &str, tag: &str) -> Result<String> {
    let mut doc: Yaml = serde_yaml::from_str(content)?;
    let nested_ok = |v: &Yaml| v.is_null() || v.is_mapping();
    if !doc.is_mapping() || !nested_ok(&doc["source"]) || !nested_ok(&doc["source"]["git"]) {
        return Err(Error::Catalog {
            message: "descriptor has no 'source.git' mapping".to_string(),
        });
    }
    if doc["source"]["git"]["ref"] == tag {
        return Ok(content.to_string());
    }
    doc["source"]["git"]["ref"] = Yaml::String(tag.to_string());

    let git = [Segment::key("source"), Segment::key("git")];
    let reference = [Segment::key("source"), Segment::key("git"), Segment::key("ref")];
    let edited = yaml_text::replace_scalar(content, &reference, tag)
        .or_else(|| yaml_text::insert_key(content, &git, "ref", tag));
    keep_layout(edited, &doc, DESCRIPTOR_FILE)
}

/// Newest tags of one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTags {
    pub repo: RepoRef,
    pub latest: LatestTags,
}

/// Reconciles catalog documents with live tags
pub struct CatalogReconciler<'a> {
    host: &'a dyn VersionControlHost,
    config: &'a Config,
}

impl<'a> CatalogReconciler<'a> {
    pub fn new(host: &'a dyn VersionControlHost, config: &'a Config) -> Self {
        Self { host, config }
    }

    fn variant(&self, side: Side) -> &VariantConfig {
        match side {
            Side::Community => &self.config.catalog.community,
            Side::Productized => &self.config.catalog.productized,
        }
    }

    /// Variant id for `framework_version`, e.g. `current-community`.
    pub fn variant_id(&self, framework_version: &str, variant: &VariantConfig) -> Result<String> {
        let line = version::release_line(framework_version)?;
        let generation = if self.config.catalog.previous_lines.iter().any(|l| l == line) {
            "previous"
        } else {
            "current"
        };
        Ok(format!("{}-{}", generation, variant.suffix))
    }

    /// Newest tags of `repo`. Host failures are logged and yield no tags.
    pub fn latest_tags_for(&self, repo: &RepoRef, framework_version: &str) -> Result<LatestTags> {
        let tags = match self.host.get_tags(repo) {
            Ok(tags) => tags,
            Err(e) => {
                log::error!("{}: failed to list tags: {}", repo, e);
                return Ok(LatestTags::default());
            }
        };
        latest_tags(&tags, framework_version, &self.config.release.qualifier)
    }

    /// Newest tags of every repository, looked up once per run.
    pub fn collect_tags(&self, repos: &[RepoRef], framework_version: &str) -> Result<Vec<RepoTags>> {
        repos
            .iter()
            .map(|repo| {
                Ok(RepoTags {
                    repo: repo.clone(),
                    latest: self.latest_tags_for(repo, framework_version)?,
                })
            })
            .collect()
    }

    /// Rewrites the JSON catalog and JSON metadata documents.
    pub fn reconcile(
        &self,
        catalog: &str,
        metadata: &str,
        framework_version: &str,
        repos: &[RepoRef],
    ) -> Result<(String, String)> {
        version::validate_upstream_version(framework_version)?;
        let tags = self.collect_tags(repos, framework_version)?;
        let catalog_out = self.reconcile_catalog(catalog, framework_version, &tags)?;
        let metadata_out = self.reconcile_metadata(metadata, framework_version, DocFormat::Json)?;
        Ok((catalog_out, metadata_out))
    }

    /// Points the matching entries of the JSON catalog at the newest tags.
    pub fn reconcile_catalog(&self, catalog: &str, framework_version: &str, tags: &[RepoTags]) -> Result<String> {
        let mut entries: Json = serde_json::from_str(catalog)?;
        let runtime = self.config.catalog.runtime.as_str();

        let Some(list) = entries.as_array_mut() else {
            return Err(Error::Catalog {
                message: "catalog document is not a JSON array".to_string(),
            });
        };
        for RepoTags { repo, latest } in tags {
            let url = repo.url(&self.config.github.clone_url);
            for side in SIDES {
                let Some(tag) = latest.get(side) else {
                    log::debug!("{}: no {:?} tag for {}", repo, side, framework_version);
                    continue;
                };
                let id = self.variant_id(framework_version, self.variant(side))?;
                let matching = list.iter_mut().filter(|entry| {
                    entry["repo"] == url.as_str()
                        && entry["metadata"]["runtime"] == runtime
                        && entry["metadata"]["version"] == id.as_str()
                });
                let mut updated = 0;
                for entry in matching {
                    entry["ref"] = Json::String(tag.to_string());
                    updated += 1;
                }
                if updated == 0 {
                    log::debug!("{}: no catalog entry for variant '{}'", repo, id);
                } else {
                    log::info!("{}: catalog variant '{}' now at {}", repo, id, tag);
                }
            }
        }

        to_pretty_json(&entries, catalog.ends_with('\n'))
    }

    /// Variant ids and labels of `framework_version`, community first.
    fn labels(&self, framework_version: &str) -> Result<Vec<(String, String)>> {
        let core = version::numeric_core(framework_version).ok_or_else(|| Error::InvalidUpstreamVersion {
            version: framework_version.to_string(),
        })?;
        SIDES
            .iter()
            .map(|&side| {
                let variant = self.variant(side);
                let id = self.variant_id(framework_version, variant)?;
                Ok((id, format!("{}.RELEASE ({})", core, variant.label)))
            })
            .collect()
    }

    /// Rewrites the variant labels of the owned runtime.
    ///
    /// Variants missing from the runtime are appended.
    pub fn reconcile_metadata(&self, metadata: &str, framework_version: &str, format: DocFormat) -> Result<String> {
        match format {
            DocFormat::Json => self.reconcile_json_metadata(metadata, framework_version),
            DocFormat::Yaml => self.reconcile_yaml_metadata(metadata, framework_version),
        }
    }

    fn missing_versions(&self) -> Error {
        Error::Catalog {
            message: format!(
                "metadata document has no versions for runtime '{}'",
                self.config.catalog.runtime
            ),
        }
    }

    fn reconcile_json_metadata(&self, metadata: &str, framework_version: &str) -> Result<String> {
        let mut doc: Json = serde_json::from_str(metadata)?;
        let labels = self.labels(framework_version)?;
        let runtime = self.config.catalog.runtime.as_str();

        let runtimes = doc
            .get_mut("runtimes")
            .and_then(Json::as_array_mut)
            .ok_or_else(|| Error::Catalog {
                message: "metadata document has no 'runtimes' array".to_string(),
            })?;
        let versions = runtimes
            .iter_mut()
            .find(|r| r["id"] == runtime)
            .and_then(|r| r.get_mut("versions"))
            .and_then(Json::as_array_mut)
            .ok_or_else(|| self.missing_versions())?;

        for (id, name) in labels {
            match versions.iter_mut().find(|v| v["id"] == id.as_str()) {
                Some(existing) => existing["name"] = Json::String(name),
                None => versions.push(serde_json::json!({ "id": id, "name": name })),
            }
        }

        to_pretty_json(&doc, metadata.ends_with('\n'))
    }

    fn reconcile_yaml_metadata(&self, metadata: &str, framework_version: &str) -> Result<String> {
        let mut doc: Yaml = serde_yaml::from_str(metadata)?;
        let labels = self.labels(framework_version)?;
        let runtime = self.config.catalog.runtime.as_str();

        let runtimes = doc["runtimes"].as_sequence_mut().ok_or_else(|| Error::Catalog {
            message: "metadata document has no 'runtimes' sequence".to_string(),
        })?;
        let index = runtimes
            .iter()
            .position(|r| r["id"] == runtime)
            .ok_or_else(|| self.missing_versions())?;
        let versions = runtimes[index]["versions"]
            .as_sequence_mut()
            .ok_or_else(|| self.missing_versions())?;

        let sequence = [Segment::key("runtimes"), Segment::Item(index), Segment::key("versions")];
        let mut edited = Some(metadata.to_string());
        for (id, name) in labels {
            match versions.iter().position(|v| v["id"] == id.as_str()) {
                Some(position) => {
                    if versions[position]["name"] == name.as_str() {
                        continue;
                    }
                    versions[position]["name"] = Yaml::String(name.clone());
                    let mut path = sequence.to_vec();
                    path.extend([Segment::Item(position), Segment::key("name")]);
                    edited = edited.and_then(|text| yaml_text::replace_scalar(&text, &path, &name));
                }
                None => {
                    let mut entry = serde_yaml::Mapping::new();
                    entry.insert(Yaml::from("id"), Yaml::from(id.clone()));
                    entry.insert(Yaml::from("name"), Yaml::from(name.clone()));
                    versions.push(Yaml::Mapping(entry));
                    edited = edited.and_then(|text| {
                        yaml_text::append_item(&text, &sequence, &[("id", id.as_str()), ("name", name.as_str())])
                    });
                }
            }
        }

        keep_layout(edited, &doc, "metadata")
    }

    /// Updates the per-example descriptors of `tree`. Returns how many changed.
    pub fn reconcile_descriptors(
        &self,
        tree: &mut ProjectTree,
        framework_version: &str,
        tags: &[RepoTags],
    ) -> Result<usize> {
        let mut changed = 0;
        for RepoTags { repo, latest } in tags {
            let key = selector::catalog_key(&repo.name, self.config)?;
            for side in SIDES {
                let id = self.variant_id(framework_version, self.variant(side))?;
                let path = format!("{}/{}/{}/{}", self.config.catalog.runtime, id, key, DESCRIPTOR_FILE);
                let Some(content) = tree.get_file(&path)? else {
                    log::debug!("{}: no descriptor at '{}'", repo, path);
                    continue;
                };
                let Some(tag) = latest.get(side) else {
                    log::debug!("{}: no {:?} tag for {}", repo, side, framework_version);
                    continue;
                };
                let updated = set_descriptor_ref(&content, tag)?;
                if updated != content {
                    log::info!("{}: '{}' now at {}", repo, path, tag);
                    tree.set_file(&path, &updated);
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    /// Reconciles every catalog document present in `tree`.
    ///
    /// The catalog, the metadata documents and the descriptors are each
    /// optional; tags are looked up once for all of them.
    pub fn reconcile_tree(&self, tree: &mut ProjectTree, framework_version: &str, repos: &[RepoRef]) -> Result<()> {
        version::validate_upstream_version(framework_version)?;
        let tags = self.collect_tags(repos, framework_version)?;

        let catalog_file = self.config.catalog.catalog_file.as_str();
        match tree.get_file(catalog_file)? {
            Some(catalog) => {
                let updated = self.reconcile_catalog(&catalog, framework_version, &tags)?;
                tree.set_file(catalog_file, &updated);
            }
            None => log::debug!("{}: no '{}'", tree.name(), catalog_file),
        }

        for metadata_file in &self.config.catalog.metadata_files {
            if let Some(metadata) = tree.get_file(metadata_file)? {
                let format = DocFormat::from_path(metadata_file);
                let updated = self.reconcile_metadata(&metadata, framework_version, format)?;
                tree.set_file(metadata_file, &updated);
            }
        }

        self.reconcile_descriptors(tree, framework_version, &tags)?;
        Ok(())
    }

    /// Syncs the catalog fork, reconciles it on a fresh branch and opens a
    /// pull request against upstream.
    ///
    /// Returns `false` when the catalog is already up to date.
    pub fn publish(
        &self,
        store: &dyn ProjectStore,
        catalog: &ReleaseTarget,
        framework_version: &str,
        repos: &[RepoRef],
    ) -> Result<bool> {
        version::validate_upstream_version(framework_version)?;
        if !refs::sync_fork_with_upstream(self.host, &catalog.repo) {
            return Err(Error::Catalog {
                message: format!("could not sync {} with its upstream", catalog.repo),
            });
        }

        let mut tree = store.checkout(catalog, &catalog.repo.branch)?;
        self.reconcile_tree(&mut tree, framework_version, repos)?;
        if !tree.is_modified() {
            log::info!("{}: catalog already up to date for {}", catalog.repo, framework_version);
            return Ok(false);
        }

        let branch = config::render(&self.config.catalog.branch_format, framework_version);
        let message = config::render(&self.config.catalog.commit_message, framework_version);
        store.commit(catalog, &tree, &branch, &message)?;
        if !refs::raise_pull_request(self.host, &catalog.repo, &branch, &message) {
            return Err(Error::Catalog {
                message: format!("could not open a pull request from '{}'", branch),
            });
        }
        Ok(true)
    }
}
