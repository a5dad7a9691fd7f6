//! # Booster Release Library
//!
//! Release automation for a fleet of example ("booster") repositories and
//! the Maven BOM they build on. The `booster-release` command-line tool is a
//! thin wrapper around this crate.
//!
//! ## Quick Example
//!
//! ```
//! use booster_release::version;
//!
//! assert_eq!(version::next_booster_version("2.2.5-2-redhat"), "2.2.5-3-redhat");
//! assert_eq!(version::next_bom_version("1.5.15-SNAPSHOT", "1.5.15.Final"), "1.5.15.SP1-SNAPSHOT");
//! ```
//!
//! ## Core Concepts
//!
//! - **Version policy (`version`)**: parsing, bumping and mapping of
//!   example, BOM and upstream versions.
//! - **Projects (`project`, `filesystem`, `pom`)**: a repository checkout held
//!   in memory, with POM reading and byte-preserving POM edits.
//! - **Editors (`editors`, `license`)**: named tree transformations composed
//!   into chains that apply all-or-nothing.
//! - **Collaborators (`repository`, `github`, `git`, `refs`)**: the hosting
//!   service, the checkout/commit store and repository discovery.
//! - **Orchestration (`release`, `fleet`, `propagate`)**: releasing one
//!   repository through its phases, and fanning that out over the fleet.
//! - **Catalog and BOM (`catalog`, `bom`)**: keeping the launcher catalog and
//!   the BOM aligned with released tags and upstream.
//!
//! ## Execution Flow
//!
//! A fleet release:
//!
//! 1.  **Environment**: check that the internal build host resolves.
//! 2.  **Selection**: discover the organisation's example repositories.
//! 3.  **Release**: per repository, tag a community and a productized
//!     variant from throwaway branches, then bump the development version.
//! 4.  **Summary**: collect one result per repository.

pub mod bom;
pub mod catalog;
pub mod config;
pub mod defaults;
pub mod editors;
pub mod environment;
pub mod error;
pub mod filesystem;
pub mod fleet;
pub mod git;
pub mod github;
pub mod license;
pub mod output;
pub mod pom;
pub mod project;
pub mod propagate;
pub mod refs;
pub mod release;
pub mod repository;
pub mod selector;
pub mod version;
pub mod yaml_text;

#[cfg(test)]
mod version_proptest;
