//! In-memory filesystem holding the content of one repository checkout

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Glob options: `*` stays within one directory, `**` crosses directories.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// In-memory filesystem keyed by repository-relative path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryFS {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemoryFS {
    /// Create a new empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a file
    pub fn add_file_content<P: AsRef<Path>>(&mut self, path: P, content: Vec<u8>) {
        self.files.insert(path.as_ref().to_path_buf(), content);
    }

    /// Add or update a file with string content
    pub fn add_file_string<P: AsRef<Path>>(&mut self, path: P, content: &str) {
        self.add_file_content(path, content.as_bytes().to_vec());
    }

    /// Get the raw content of a file
    pub fn get_file<P: AsRef<Path>>(&self, path: P) -> Option<&[u8]> {
        self.files.get(path.as_ref()).map(Vec::as_slice)
    }

    /// Get the content of a file as UTF-8 text
    pub fn get_string<P: AsRef<Path>>(&self, path: P) -> Result<Option<String>> {
        let path = path.as_ref();
        match self.files.get(path) {
            None => Ok(None),
            Some(bytes) => String::from_utf8(bytes.clone())
                .map(Some)
                .map_err(|_| Error::Filesystem {
                    message: format!("File is not valid UTF-8: {}", path.display()),
                }),
        }
    }

    /// Remove a file
    pub fn remove_file<P: AsRef<Path>>(&mut self, path: P) -> Option<Vec<u8>> {
        self.files.remove(path.as_ref())
    }

    /// Check if a file exists
    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.files.contains_key(path.as_ref())
    }

    /// List all files in path order
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    /// List files matching a glob pattern, in path order
    ///
    /// A leading `**/` also matches files at the repository root.
    pub fn list_files_glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let full = Pattern::new(pattern).map_err(Error::Glob)?;
        let rooted = match pattern.strip_prefix("**/") {
            Some(rest) => Some(Pattern::new(rest).map_err(Error::Glob)?),
            None => None,
        };

        let mut matches = Vec::new();
        for path in self.files.keys() {
            let Some(path_str) = path.to_str() else {
                continue;
            };
            let matched = full.matches_with(path_str, MATCH_OPTIONS)
                || rooted
                    .as_ref()
                    .is_some_and(|p| p.matches_with(path_str, MATCH_OPTIONS));
            if matched {
                matches.push(path.clone());
            }
        }

        Ok(matches)
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if filesystem is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over all files as (path, content) pairs
    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &Vec<u8>)> {
        self.files.iter()
    }

    /// Paths that were added, modified or removed relative to `baseline`
    pub fn changed_paths(&self, baseline: &MemoryFS) -> Vec<PathBuf> {
        let mut changed: Vec<PathBuf> = self
            .files
            .iter()
            .filter(|(path, content)| baseline.files.get(*path) != Some(*content))
            .map(|(path, _)| path.clone())
            .collect();
        changed.extend(
            baseline
                .files
                .keys()
                .filter(|path| !self.files.contains_key(*path))
                .cloned(),
        );
        changed.sort();
        changed
    }
}
