//! Shared test utilities for the CLI end-to-end tests.
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_config(configs::DEFAULTS);
//! fixture.command().args(["version", "next", "2.2.5-2"]).assert().success();
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    pub use super::TestFixture;
}

/// Configuration files used across tests.
#[allow(dead_code)]
pub mod configs {
    /// Every setting at its default.
    pub const DEFAULTS: &str = "";

    /// A different branch layout and qualifier-preserving lines.
    pub const CUSTOM_BRANCHES: &str = r#"
branches:
  format: "release-{line}"
  legacy_lines: ["2.1"]
  legacy_branch: "legacy"
bom:
  qualifier_preserving_lines: ["2.2"]
"#;

    /// Rejected: unknown key.
    pub const UNKNOWN_KEY: &str = "organisation: snowdrop\n";

    /// Rejected: zero workers.
    pub const ZERO_CONCURRENCY: &str = "release:\n  concurrency: 0\n";

    /// Offline release: no internal host required.
    pub const NO_REQUIRED_HOST: &str = "release:\n  required_host: ~\n";
}

/// A temporary directory holding a configuration file.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Writes `booster-release.yaml` with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child("booster-release.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("booster-release.yaml")
    }

    /// A command running in the fixture directory with its configuration.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("booster-release");
        cmd.current_dir(self.path())
            .env_remove("GITHUB_TOKEN")
            .env_remove("BOOSTER_RELEASE_CONFIG")
            .arg("--config")
            .arg(self.config_path());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
