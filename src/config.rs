//! # Configuration
//!
//! This module defines the `booster-release` configuration file and the logic
//! for loading it. Every value the release engine would otherwise hard-code
//! (organisation, topic, repository names, property names, branch policy,
//! the deny-list of BOM properties, catalog variant ids) lives here and is
//! passed explicitly into each entry point.
//!
//! ## Format
//!
//! The file is YAML. Every section and field is optional; omitted values fall
//! back to the defaults below, so an empty file is a valid configuration.
//!
//! ```yaml
//! org: snowdrop
//! topic: booster
//! bom:
//!   ignored_properties: [hibernate.version, hibernate-validator.version]
//! catalog:
//!   name_overrides:
//!     secured: rest-http-secured
//! ```

use crate::defaults;
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Placeholder substituted by [`render`] in message and URL templates.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Organisation that owns the booster repositories.
    pub org: String,
    /// Topic every booster repository carries.
    pub topic: String,
    /// Regex whose first capture group is the booster's short name.
    ///
    /// Repository names that do not match are used as-is.
    pub repo_name_pattern: String,
    pub branches: BranchPolicy,
    pub bom: BomConfig,
    pub release: ReleaseSettings,
    pub license: LicenseConfig,
    pub catalog: CatalogConfig,
    pub github: GitHubConfig,
    pub git: GitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            org: "snowdrop".to_string(),
            topic: "booster".to_string(),
            repo_name_pattern: "^spring-boot-(.+)-booster$".to_string(),
            branches: BranchPolicy::default(),
            bom: BomConfig::default(),
            release: ReleaseSettings::default(),
            license: LicenseConfig::default(),
            catalog: CatalogConfig::default(),
            github: GitHubConfig::default(),
            git: GitConfig::default(),
        }
    }
}

/// How framework versions map onto branch names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BranchPolicy {
    /// Branch name template; `{line}` is replaced by `MAJOR.MINOR`.
    pub format: String,
    /// Release lines whose examples still live on the legacy branch.
    pub legacy_lines: Vec<String>,
    /// Branch used by examples of a legacy line.
    pub legacy_branch: String,
    /// Branch boosters are rebased on when a non-legacy BOM is released.
    pub booster_branch: String,
}

impl Default for BranchPolicy {
    fn default() -> Self {
        Self {
            format: "sb-{line}.x".to_string(),
            legacy_lines: vec!["1.5".to_string()],
            legacy_branch: "master".to_string(),
            booster_branch: "sb-2.1.x".to_string(),
        }
    }
}

impl BranchPolicy {
    /// Returns true if `version` belongs to one of the legacy release lines.
    pub fn is_legacy(&self, version: &str) -> bool {
        self.legacy_lines.iter().any(|line| version.starts_with(line.as_str()))
    }
}

/// BOM repository and upstream synchronisation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BomConfig {
    /// Name of the BOM repository inside the organisation.
    pub repo: String,
    /// POM property boosters use to pin the BOM version.
    pub bom_property: String,
    /// POM property carrying the upstream framework version.
    pub framework_property: String,
    /// Properties never copied from the upstream BOM.
    pub ignored_properties: Vec<String>,
    /// Human-readable document rewritten alongside the POM.
    pub readme: String,
    /// Upstream BOM location; `{version}` is the upstream release.
    pub upstream_url: String,
    /// Upstream BOM location for legacy release lines.
    pub legacy_upstream_url: String,
    /// Release lines whose framework version keeps the BOM qualifier instead of `.RELEASE`.
    pub qualifier_preserving_lines: Vec<String>,
}

impl Default for BomConfig {
    fn default() -> Self {
        Self {
            repo: "spring-boot-bom".to_string(),
            bom_property: "spring-boot-bom.version".to_string(),
            framework_property: "spring-boot.version".to_string(),
            ignored_properties: vec![
                "hibernate.version".to_string(),
                "hibernate-validator.version".to_string(),
            ],
            readme: "README.adoc".to_string(),
            upstream_url: "https://raw.githubusercontent.com/spring-projects/spring-boot/v{version}/spring-boot-project/spring-boot-dependencies/pom.xml".to_string(),
            legacy_upstream_url: "https://raw.githubusercontent.com/spring-projects/spring-boot/v{version}/spring-boot-dependencies/pom.xml".to_string(),
            qualifier_preserving_lines: vec!["2.4".to_string(), "2.5".to_string()],
        }
    }
}

/// Where the productized BOM version is recorded in an example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProdBomBinding {
    /// The BOM is the example's parent POM.
    ParentVersion,
    /// The BOM is imported through the `bom.bom_property` property.
    Property,
}

/// Release orchestration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseSettings {
    /// Marker distinguishing productized versions and tags.
    pub qualifier: String,
    /// Glob matching the OpenShift templates to substitute.
    pub template_glob: String,
    /// Token replaced by the example version in templates.
    pub version_token: String,
    /// Token replaced by the framework version in templates.
    pub framework_token: String,
    pub prod_bom_binding: ProdBomBinding,
    /// Host that must resolve before a release may start.
    pub required_host: Option<String>,
    pub tag_commit_message: String,
    pub bump_commit_message: String,
    /// Commit message used when rebasing boosters onto a released BOM.
    pub bom_update_commit_message: String,
    /// Commit message used when bumping the BOM's own version.
    pub bom_bump_commit_message: String,
    /// Commit message used when syncing the BOM with an upstream release.
    pub bom_sync_commit_message: String,
    /// Fixed fleet concurrency; defaults to one less than the available parallelism.
    pub concurrency: Option<usize>,
}

impl Default for ReleaseSettings {
    fn default() -> Self {
        Self {
            qualifier: "redhat".to_string(),
            template_glob: "**/.openshiftio/application.y*ml".to_string(),
            version_token: "BOOSTER_VERSION".to_string(),
            framework_token: "SPRING_BOOT_VERSION".to_string(),
            prod_bom_binding: ProdBomBinding::ParentVersion,
            required_host: Some("indy.psi.redhat.com".to_string()),
            tag_commit_message: "[booster-release][ci skip] Tag example".to_string(),
            bump_commit_message: "[booster-release][ci skip] Bump version".to_string(),
            bom_update_commit_message: "[booster-release] Update BOM to {version}".to_string(),
            bom_bump_commit_message: "Bump BOM version [ci skip]".to_string(),
            bom_sync_commit_message: "Update BOM for upstream {version}".to_string(),
            concurrency: None,
        }
    }
}

/// External license-report generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LicenseConfig {
    /// Generator jar; license generation is skipped when unset.
    pub generator_jar: Option<PathBuf>,
    /// Directory holding `generator.properties` and the alias/exception files.
    ///
    /// Defaults to the directory containing the jar.
    pub config_dir: Option<PathBuf>,
    /// Java launcher.
    pub java: String,
    /// Report destination relative to the project root.
    pub destination: String,
    /// Warn and skip instead of failing when the project is not on disk.
    pub skip_in_memory: bool,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            generator_jar: None,
            config_dir: None,
            java: "java".to_string(),
            destination: "src/licenses".to_string(),
            skip_in_memory: false,
        }
    }
}

/// One catalog variant (community or productized).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantConfig {
    /// Suffix of the variant id, e.g. `community` in `current-community`.
    pub suffix: String,
    /// Human-readable label used in the metadata document.
    pub label: String,
}

/// Launcher catalog settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Name of the catalog repository (a fork owned by the operator).
    pub repo: String,
    /// Branch the catalog is released from.
    pub base_branch: String,
    /// Runtime id of catalog entries this tool owns.
    pub runtime: String,
    pub catalog_file: String,
    /// Metadata documents holding the variant labels; `.yaml`/`.yml` files
    /// are read as YAML, anything else as JSON.
    pub metadata_files: Vec<String>,
    /// Release lines published under the `previous-*` variant ids.
    pub previous_lines: Vec<String>,
    pub community: VariantConfig,
    pub productized: VariantConfig,
    /// Repository short name to catalog key, where the two differ.
    pub name_overrides: BTreeMap<String, String>,
    pub branch_format: String,
    pub commit_message: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let mut name_overrides = BTreeMap::new();
        name_overrides.insert("secured".to_string(), "rest-http-secured".to_string());
        name_overrides.insert("messaging-work-queue".to_string(), "messaging".to_string());
        Self {
            repo: "launcher-booster-catalog".to_string(),
            base_branch: "master".to_string(),
            runtime: "spring-boot".to_string(),
            catalog_file: "catalog.json".to_string(),
            metadata_files: vec!["metadata.json".to_string(), "metadata.yaml".to_string()],
            previous_lines: vec!["1.5".to_string()],
            community: VariantConfig {
                suffix: "community".to_string(),
                label: "Community".to_string(),
            },
            productized: VariantConfig {
                suffix: "redhat".to_string(),
                label: "Red Hat Runtimes".to_string(),
            },
            name_overrides,
            branch_format: "update-to-spring-boot-{version}".to_string(),
            commit_message: "Update Spring Boot to {version}".to_string(),
        }
    }
}

/// Version-control host API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig {
    pub api_url: String,
    /// Base URL repositories are cloned from.
    pub clone_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            clone_url: "https://github.com".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Local git checkout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitConfig {
    /// Directory checkouts are created under.
    pub work_root: PathBuf,
    pub committer_name: String,
    pub committer_email: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            work_root: defaults::default_work_root(),
            committer_name: "booster-release".to_string(),
            committer_email: "booster-release@users.noreply.github.com".to_string(),
        }
    }
}

impl Config {
    /// Compiled form of `repo_name_pattern`.
    pub fn name_pattern(&self) -> Result<Regex> {
        Regex::new(&self.repo_name_pattern).map_err(|e| Error::ConfigParse {
            message: format!("invalid repo_name_pattern '{}': {}", self.repo_name_pattern, e),
            hint: Some("The pattern must be a valid regex with one capture group".to_string()),
        })
    }

    /// Checks values serde cannot validate on its own.
    pub fn validate(&self) -> Result<()> {
        let pattern = self.name_pattern()?;
        if pattern.captures_len() < 2 {
            return Err(Error::ConfigParse {
                message: format!(
                    "repo_name_pattern '{}' has no capture group",
                    self.repo_name_pattern
                ),
                hint: Some("Wrap the short name in parentheses, e.g. ^spring-boot-(.+)-booster$".to_string()),
            });
        }
        glob::Pattern::new(&self.release.template_glob).map_err(|e| Error::ConfigParse {
            message: format!("invalid release.template_glob: {}", e),
            hint: None,
        })?;
        if self.release.qualifier.is_empty() {
            return Err(Error::ConfigParse {
                message: "release.qualifier must not be empty".to_string(),
                hint: Some("The default productized marker is 'redhat'".to_string()),
            });
        }
        if self.release.concurrency == Some(0) {
            return Err(Error::ConfigParse {
                message: "release.concurrency must be at least 1".to_string(),
                hint: Some("Remove the setting to use the detected parallelism".to_string()),
            });
        }
        if self.catalog.community.suffix == self.catalog.productized.suffix {
            return Err(Error::ConfigParse {
                message: "catalog variants must use distinct suffixes".to_string(),
                hint: None,
            });
        }
        Ok(())
    }

    /// Loads the configuration from `path`, or from the default location.
    ///
    /// When no path is given and the default file does not exist, the
    /// built-in defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => from_file(path),
            None => {
                let default_path = defaults::default_config_path();
                if default_path.exists() {
                    log::debug!("Loading configuration from {}", default_path.display());
                    from_file(default_path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }
}

/// Parses a YAML string into a validated [`Config`].
pub fn parse(yaml_content: &str) -> Result<Config> {
    // serde_yaml rejects an empty document for a struct
    if yaml_content.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(yaml_content).map_err(|e| Error::ConfigParse {
        message: e.to_string(),
        hint: Some("Run 'booster-release --help' for the list of settings".to_string()),
    })?;
    config.validate()?;
    Ok(config)
}

/// Parses a [`Config`] from a YAML file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Replaces `{version}` in a message or URL template.
pub fn render(template: &str, version: &str) -> String {
    template.replace(VERSION_PLACEHOLDER, version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.org, "snowdrop");
        assert_eq!(config.bom.framework_property, "spring-boot.version");
    }

    #[test]
    fn test_parse_partial_config() {
        let yaml = r#"
org: my-org
bom:
  ignored_properties: [jackson.version]
catalog:
  name_overrides:
    circuit-breaker: circuit-breaker-ng
"#;
        let config = parse(yaml).unwrap();
        assert_eq!(config.org, "my-org");
        assert_eq!(config.topic, "booster");
        assert_eq!(config.bom.ignored_properties, vec!["jackson.version"]);
        assert_eq!(config.bom.repo, "spring-boot-bom");
        assert_eq!(
            config.catalog.name_overrides.get("circuit-breaker").map(String::as_str),
            Some("circuit-breaker-ng")
        );
        assert!(!config.catalog.name_overrides.contains_key("secured"));
    }

    #[test]
    fn test_parse_prod_bom_binding() {
        let config = parse("release:\n  prod_bom_binding: property\n").unwrap();
        assert_eq!(config.release.prod_bom_binding, ProdBomBinding::Property);
    }

    #[test]
    fn test_parse_rejects_unknown_field() {
        let result = parse("organisation: typo\n");
        assert!(matches!(result, Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_validate_rejects_pattern_without_group() {
        let result = parse("repo_name_pattern: '^spring-boot-.+$'\n");
        match result {
            Err(Error::ConfigParse { message, hint }) => {
                assert!(message.contains("capture group"));
                assert!(hint.is_some());
            }
            other => panic!("expected ConfigParse, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let result = parse("release:\n  concurrency: 0\n");
        assert!(matches!(result, Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_branch_policy_legacy_lines() {
        let policy = BranchPolicy::default();
        assert!(policy.is_legacy("1.5.22.RELEASE"));
        assert!(!policy.is_legacy("2.2.5.RELEASE"));
    }

    #[test]
    fn test_render_replaces_placeholder() {
        assert_eq!(
            render("[booster-release] Update BOM to {version}", "2.1.6.Final"),
            "[booster-release] Update BOM to 2.1.6.Final"
        );
    }

    #[test]
    fn test_from_file_nonexistent() {
        let result = from_file("nonexistent_file.yaml");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_from_file_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "topic: example\n").unwrap();
        let config = from_file(&path).unwrap();
        assert_eq!(config.topic, "example");
    }
}
