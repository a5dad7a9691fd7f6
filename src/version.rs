//! # Version Policy
//!
//! Pure functions computing the next version of boosters, examples and the
//! BOM. Nothing in this module touches a project; editors in
//! [`crate::editors`] read the current version, call into here and write the
//! result back.
//!
//! ## Version shapes
//!
//! - **Booster/example**: `MAJOR.MINOR.PATCH-REVISION[-QUALIFIER]`, e.g.
//!   `2.2.5-3-SNAPSHOT` or `2.2.5-3-redhat`.
//! - **BOM**: `MAJOR.MINOR.PATCH.QUALIFIER`, e.g. `2.2.5.Final`, `2.2.5.SP2`,
//!   `2.2.5.Beta1`.
//! - **Upstream release**: `MAJOR.MINOR.PATCH.RELEASE`.
//!
//! The background fleet path never fails on a malformed current version: the
//! version is returned unchanged and a warning is logged. Interactively
//! supplied versions are validated up front with the `validate_*` functions,
//! which reject the offending string.

use crate::config::{BomConfig, BranchPolicy};
use crate::error::{Error, Result};
use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

/// Suffix of versions that are still in development.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

static BOOSTER_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\d+\.\d+)-(\d+)(-\w+)?$").expect("valid regex"));

static BOM_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\d+\.\d+)\.(\w+)$").expect("valid regex"));

static UPSTREAM_RELEASE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\d+\.\d+)\.RELEASE$").expect("valid regex"));

static PROD_BOM_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\d+\.\d+)\.(\w+)-redhat-\d+$").expect("valid regex"));

static NUMERIC_CORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\d+\.\d+)").expect("valid regex"));

static RELEASE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\d+)").expect("valid regex"));

/// A parsed booster/example version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoosterVersion {
    pub core: Version,
    pub revision: u64,
    /// Trailing qualifier without its leading dash, e.g. `SNAPSHOT` or `redhat`.
    pub qualifier: Option<String>,
}

impl BoosterVersion {
    /// Parses `MAJOR.MINOR.PATCH-REVISION[-QUALIFIER]`.
    pub fn parse(version: &str) -> Option<Self> {
        let caps = BOOSTER_VERSION.captures(version)?;
        Some(Self {
            core: Version::parse(&caps[1]).ok()?,
            revision: caps[2].parse().ok()?,
            qualifier: caps.get(3).map(|q| q.as_str()[1..].to_string()),
        })
    }
}

impl std::fmt::Display for BoosterVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.core, self.revision)?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, "-{}", qualifier)?;
        }
        Ok(())
    }
}

/// A parsed BOM version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BomVersion {
    pub core: Version,
    pub qualifier: String,
}

impl BomVersion {
    /// Parses `MAJOR.MINOR.PATCH.QUALIFIER`.
    pub fn parse(version: &str) -> Option<Self> {
        let caps = BOM_VERSION.captures(version)?;
        Some(Self {
            core: Version::parse(&caps[1]).ok()?,
            qualifier: caps[2].to_string(),
        })
    }
}

/// Returns the leading `MAJOR.MINOR.PATCH` of any version string.
pub fn numeric_core(version: &str) -> Option<&str> {
    NUMERIC_CORE
        .captures(version)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Returns the `MAJOR.MINOR` release line of a version string.
pub fn release_line(version: &str) -> Result<&str> {
    RELEASE_LINE
        .captures(version)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| Error::InvalidVersionFormat {
            version: version.to_string(),
        })
}

/// Removes a trailing `-SNAPSHOT`.
pub fn strip_snapshot(version: &str) -> &str {
    version.strip_suffix(SNAPSHOT_SUFFIX).unwrap_or(version)
}

/// Bumps the revision of a booster/example version.
///
/// `2.2.5-2-redhat` becomes `2.2.5-3-redhat`. Versions of any other shape
/// are returned unchanged.
pub fn next_booster_version(current: &str) -> String {
    match BoosterVersion::parse(current) {
        Some(mut version) => match version.revision.checked_add(1) {
            Some(revision) => {
                version.revision = revision;
                version.to_string()
            }
            None => {
                log::warn!("Revision of '{}' cannot be bumped any further, leaving it unchanged", current);
                current.to_string()
            }
        },
        None => {
            log::warn!("Version '{}' is not a booster version, leaving it unchanged", current);
            current.to_string()
        }
    }
}

/// Re-bases a booster onto a released BOM.
///
/// A booster whose numeric core differs from the BOM's restarts at
/// `{bomCore}-1-SNAPSHOT`; an already aligned booster keeps its version.
pub fn rebase_booster_version(current: &str, bom_version: &str) -> String {
    realign(current, bom_version, "BOM")
}

/// Aligns an example with an upstream framework release.
///
/// Same rule as [`rebase_booster_version`], keyed on the upstream version.
pub fn realign_to_upstream(current: &str, upstream_version: &str) -> String {
    realign(current, upstream_version, "upstream")
}

fn realign(current: &str, reference: &str, kind: &str) -> String {
    let Some(current_version) = BoosterVersion::parse(current) else {
        log::warn!("Version '{}' is not a booster version, leaving it unchanged", current);
        return current.to_string();
    };
    let Some(reference_core) = numeric_core(reference) else {
        log::warn!("{} version '{}' has no numeric core, leaving '{}' unchanged", kind, reference, current);
        return current.to_string();
    };
    if current_version.core.to_string() == reference_core {
        log::debug!("Version '{}' already matches {} version '{}'", current, kind, reference);
        current.to_string()
    } else {
        format!("{}-1{}", reference_core, SNAPSHOT_SUFFIX)
    }
}

/// Computes the BOM's own development version after releasing `released`.
///
/// | released qualifier | result                         |
/// |--------------------|--------------------------------|
/// | `Beta*`            | unchanged                      |
/// | `Final`            | `{current}.SP1-SNAPSHOT`       |
/// | `SPk`              | `{current}.SP(k+1)-SNAPSHOT`   |
/// | anything else      | unchanged, with a warning      |
///
/// `{current}` is the current version without `-SNAPSHOT`.
pub fn next_bom_version(current: &str, released: &str) -> String {
    let Some(released_version) = BomVersion::parse(released) else {
        log::warn!("BOM version '{}' is invalid, no update to the BOM version will be performed", released);
        return current.to_string();
    };
    let qualifier = released_version.qualifier.as_str();
    if qualifier.starts_with("Beta") {
        log::info!("No need to update the BOM version after releasing {}", released);
        return current.to_string();
    }
    let next_qualifier = if qualifier == "Final" {
        1
    } else if let Some(next) = qualifier
        .strip_prefix("SP")
        .and_then(|n| n.parse::<u32>().ok())
        .and_then(|n| n.checked_add(1))
    {
        next
    } else {
        log::warn!("Unexpected qualifier '{}' in released BOM version '{}', ignoring it", qualifier, released);
        return current.to_string();
    };
    format!("{}.SP{}{}", strip_snapshot(current), next_qualifier, SNAPSHOT_SUFFIX)
}

/// Maps a BOM version onto the upstream framework version it was built from.
///
/// Most lines map `2.2.6.Final` to `2.2.6.RELEASE`; lines listed in
/// `qualifier_preserving_lines` keep the BOM version as-is.
pub fn framework_version_for_bom(bom_version: &str, config: &BomConfig) -> Result<String> {
    let core = numeric_core(bom_version).ok_or_else(|| Error::InvalidVersionFormat {
        version: bom_version.to_string(),
    })?;
    let line = release_line(core)?;
    if config.qualifier_preserving_lines.iter().any(|l| l == line) {
        let version = BomVersion::parse(bom_version).ok_or_else(|| Error::InvalidVersionFormat {
            version: bom_version.to_string(),
        })?;
        return Ok(format!("{}.{}", version.core, version.qualifier));
    }
    Ok(format!("{}.RELEASE", core))
}

/// Returns the maintenance branch of a release line, e.g. `sb-2.2.x`.
pub fn version_to_branch(version: &str, policy: &BranchPolicy) -> Result<String> {
    let line = release_line(version)?;
    Ok(policy.format.replace("{line}", line))
}

/// Returns the branch examples of `version` are released from.
///
/// Legacy lines use the legacy branch, everything else its maintenance branch.
pub fn version_to_example_branch(version: &str, policy: &BranchPolicy) -> Result<String> {
    let line = release_line(version)?;
    if policy.is_legacy(line) {
        return Ok(policy.legacy_branch.clone());
    }
    version_to_branch(version, policy)
}

/// Rejects anything but `MAJOR.MINOR.PATCH.RELEASE`.
pub fn validate_upstream_version(version: &str) -> Result<()> {
    if UPSTREAM_RELEASE_VERSION.is_match(version) {
        Ok(())
    } else {
        Err(Error::InvalidUpstreamVersion {
            version: version.to_string(),
        })
    }
}

/// Rejects anything but a productized BOM version such as `2.2.5.Beta1-redhat-00007`.
pub fn validate_prod_bom_version(version: &str) -> Result<()> {
    if PROD_BOM_VERSION.is_match(version) {
        Ok(())
    } else {
        Err(Error::InvalidVersionFormat {
            version: version.to_string(),
        })
    }
}

/// Rejects anything but `MAJOR.MINOR.PATCH.QUALIFIER`.
pub fn validate_bom_version(version: &str) -> Result<()> {
    BomVersion::parse(version)
        .map(|_| ())
        .ok_or_else(|| Error::InvalidVersionFormat {
            version: version.to_string(),
        })
}
