//! Project trees: the content of one repository at one branch.
//!
//! A [`ProjectTree`] is what every editor consumes and produces. It keeps the
//! content it was loaded with as a baseline so the release engine can tell a
//! real edit from a no-op, and it optionally remembers the on-disk checkout it
//! was loaded from. Only materialized trees can be handed to external
//! processes such as the license generator.

use crate::error::{Error, Result};
use crate::filesystem::MemoryFS;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Name of the root POM.
pub const ROOT_POM: &str = "pom.xml";

/// Content of one repository at one branch
#[derive(Debug)]
pub struct ProjectTree {
    name: String,
    files: MemoryFS,
    baseline: MemoryFS,
    base_dir: Option<PathBuf>,
    // Keeps the checkout alive until the last tree referring to it is dropped.
    _workspace: Option<Arc<TempDir>>,
}

impl ProjectTree {
    /// Creates an in-memory tree.
    pub fn in_memory(name: impl Into<String>, files: MemoryFS) -> Self {
        Self {
            name: name.into(),
            baseline: files.clone(),
            files,
            base_dir: None,
            _workspace: None,
        }
    }

    /// Creates a tree backed by a checkout in `base_dir`.
    pub fn materialized(name: impl Into<String>, files: MemoryFS, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            baseline: files.clone(),
            files,
            base_dir: Some(base_dir.into()),
            _workspace: None,
        }
    }

    /// Creates a tree backed by a temporary checkout that is removed on drop.
    pub fn in_workspace(name: impl Into<String>, files: MemoryFS, workspace: TempDir) -> Self {
        let base_dir = workspace.path().to_path_buf();
        Self {
            name: name.into(),
            baseline: files.clone(),
            files,
            base_dir: Some(base_dir),
            _workspace: Some(Arc::new(workspace)),
        }
    }

    /// Repository name, used in log lines and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// On-disk checkout, if the tree is materialized.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn is_materialized(&self) -> bool {
        self.base_dir.is_some()
    }

    pub fn files(&self) -> &MemoryFS {
        &self.files
    }

    /// Reads a text file, `None` if it does not exist.
    pub fn get_file(&self, path: &str) -> Result<Option<String>> {
        self.files.get_string(path)
    }

    /// Reads a text file that must exist.
    pub fn require_file(&self, path: &str) -> Result<String> {
        self.get_file(path)?.ok_or_else(|| Error::Filesystem {
            message: format!("{}: file not found: {}", self.name, path),
        })
    }

    pub fn set_file(&mut self, path: &str, content: &str) {
        self.files.add_file_string(path, content);
    }

    /// Paths matching `pattern`, in path order.
    pub fn find_files(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        self.files.list_files_glob(pattern)
    }

    /// Rewrites every text file matching `pattern` through `transform`.
    ///
    /// Returns the number of files whose content changed.
    pub fn transform_files<F>(&mut self, pattern: &str, mut transform: F) -> Result<usize>
    where
        F: FnMut(&Path, &str) -> Result<String>,
    {
        let mut changed = 0;
        for path in self.find_files(pattern)? {
            let Some(content) = self.files.get_string(&path)? else {
                continue;
            };
            let updated = transform(&path, &content)?;
            if updated != content {
                self.files.add_file_string(&path, &updated);
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Replaces the whole file set, keeping baseline and checkout.
    pub fn replace_files(&mut self, files: MemoryFS) {
        self.files = files;
    }

    /// Paths edited since the tree was loaded.
    pub fn changed_paths(&self) -> Vec<PathBuf> {
        self.files.changed_paths(&self.baseline)
    }

    pub fn is_modified(&self) -> bool {
        !self.changed_paths().is_empty()
    }

    /// Writes every edited file into the checkout.
    pub fn flush(&self) -> Result<()> {
        let base_dir = self.base_dir.as_ref().ok_or_else(|| Error::Filesystem {
            message: format!("{} is not materialized", self.name),
        })?;
        for path in self.changed_paths() {
            let target = base_dir.join(&path);
            match self.files.get_file(&path) {
                Some(content) => {
                    if let Some(parent) = target.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&target, content)?;
                }
                None => {
                    if target.exists() {
                        std::fs::remove_file(&target)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> ProjectTree {
        let mut fs = MemoryFS::new();
        fs.add_file_string("pom.xml", "<project><version>1.0.0-1-SNAPSHOT</version></project>");
        fs.add_file_string(".openshiftio/application.yaml", "version: BOOSTER_VERSION");
        ProjectTree::in_memory("crud-example", fs)
    }

    #[test]
    fn test_in_memory_tree_is_not_materialized() {
        let tree = sample_tree();
        assert!(!tree.is_materialized());
        assert!(tree.flush().is_err());
    }

    #[test]
    fn test_require_file_names_repo_and_path() {
        let tree = sample_tree();
        let error = tree.require_file("README.adoc").unwrap_err();
        let display = error.to_string();
        assert!(display.contains("crud-example"));
        assert!(display.contains("README.adoc"));
    }

    #[test]
    fn test_transform_files_counts_changes() {
        let mut tree = sample_tree();
        let changed = tree
            .transform_files("**/application.y*ml", |_, content| {
                Ok(content.replace("BOOSTER_VERSION", "1.0.0-1"))
            })
            .unwrap();
        assert_eq!(changed, 1);
        assert!(tree.is_modified());
        assert_eq!(
            tree.changed_paths(),
            vec![PathBuf::from(".openshiftio/application.yaml")]
        );
    }

    #[test]
    fn test_flush_writes_changed_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = MemoryFS::new();
        fs.add_file_string("pom.xml", "<project/>");
        fs.add_file_string("README.adoc", "= Example");
        let mut tree = ProjectTree::materialized("crud-example", fs, dir.path());

        tree.set_file("pom.xml", "<project><version>2</version></project>");
        tree.flush().unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("pom.xml")).unwrap(),
            "<project><version>2</version></project>"
        );
        assert!(!dir.path().join("README.adoc").exists());
    }
}
