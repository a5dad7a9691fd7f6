//! License-report generation.
//!
//! Runs the external license generator against a project's root POM and
//! picks up the reports it writes. The generator needs a real checkout, so
//! in-memory trees are rejected unless `license.skip_in_memory` is set.

use crate::config::LicenseConfig;
use crate::editors::Editor;
use crate::error::{Error, Result};
use crate::git;
use crate::project::{ProjectTree, ROOT_POM};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Settings for one generator invocation
#[derive(Debug, Clone)]
pub struct LicenseGenerator {
    java: String,
    jar: PathBuf,
    config_dir: PathBuf,
    destination: String,
    skip_in_memory: bool,
}

impl LicenseGenerator {
    /// Returns `None` when no generator jar is configured.
    pub fn from_config(config: &LicenseConfig) -> Option<Self> {
        let jar = config.generator_jar.clone()?;
        let config_dir = config
            .config_dir
            .clone()
            .or_else(|| jar.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Some(Self {
            java: config.java.clone(),
            jar,
            config_dir,
            destination: config.destination.clone(),
            skip_in_memory: config.skip_in_memory,
        })
    }

    /// Arguments passed to the Java launcher for a checkout in `base_dir`.
    pub fn args(&self, base_dir: &Path) -> Vec<String> {
        vec![
            "-jar".to_string(),
            self.jar.display().to_string(),
            format!("-Dpom={}", base_dir.join(ROOT_POM).display()),
            format!("-Ddestination={}", self.destination),
            format!(
                "-DgeneratorProperties={}",
                self.config_dir.join("generator.properties").display()
            ),
            format!(
                "-DaliasesFile={}",
                self.config_dir.join("rh-license-names.json").display()
            ),
            format!(
                "-DexceptionsFile={}",
                self.config_dir.join("rh-license-exceptions.json").display()
            ),
        ]
    }

    /// Generates the reports for `tree` and returns the tree with them added.
    pub fn run(&self, mut tree: ProjectTree) -> Result<ProjectTree> {
        let Some(base_dir) = tree.base_dir().map(Path::to_path_buf) else {
            if self.skip_in_memory {
                log::warn!("{}: project is not on disk, skipping license generation", tree.name());
                return Ok(tree);
            }
            return Err(Error::LicenseGeneration {
                message: format!(
                    "Can only generate licenses for a materialized project, {} is in memory",
                    tree.name()
                ),
            });
        };

        // the generator reads the POM from disk
        tree.flush()?;

        log::info!("{}: generating licenses", tree.name());
        let output = Command::new(&self.java)
            .args(self.args(&base_dir))
            .current_dir(&base_dir)
            .output()
            .map_err(|e| Error::LicenseGeneration {
                message: format!("{}: failed to start {}: {}", tree.name(), self.java, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::LicenseGeneration {
                message: format!("{}: generator exited with {}: {}", tree.name(), output.status, stderr.trim()),
            });
        }

        tree.replace_files(git::load_tree(&base_dir)?);
        Ok(tree)
    }

    /// The generator as a chainable editor.
    pub fn editor(self) -> Editor {
        Editor::new("generate-licenses", move |tree| self.run(tree))
    }
}
