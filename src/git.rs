//! `ProjectStore` backed by the system `git` binary.
//!
//! Using the `git` command means authentication configured on the machine
//! (credential helpers, SSH keys) keeps working; when a target carries a
//! token it is embedded in the clone URL instead.

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::config::{GitConfig, GitHubConfig};
use crate::error::{Error, Result};
use crate::filesystem::MemoryFS;
use crate::project::ProjectTree;
use crate::repository::{ProjectStore, ReleaseTarget};
use url::Url;
use walkdir::WalkDir;

/// Load a checkout into a MemoryFS, skipping `.git`
pub fn load_tree(dir: &Path) -> Result<MemoryFS> {
    let mut fs = MemoryFS::new();
    let walker = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != ".git");
    for entry in walker {
        let entry = entry.map_err(|e| Error::Filesystem {
            message: format!("Failed to walk {}: {}", dir.display(), e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).map_err(|e| Error::Filesystem {
            message: format!("{} is outside {}: {}", entry.path().display(), dir.display(), e),
        })?;
        fs.add_file_content(relative, fs::read(entry.path())?);
    }
    Ok(fs)
}

/// Write every file of a MemoryFS below `dir`
pub fn write_tree(dir: &Path, fs: &MemoryFS) -> Result<()> {
    for (path, content) in fs.files() {
        let full_path = dir.join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, content)?;
    }
    Ok(())
}

/// Clone URL for a target, with its token embedded when present
pub fn clone_url(base: &str, target: &ReleaseTarget) -> Result<String> {
    let mut url = Url::parse(&format!("{}.git", target.repo.url(base)))?;
    if let Some(token) = target.token() {
        url.set_username("x-access-token").map_err(|_| Error::Filesystem {
            message: format!("cannot add credentials to {}", base),
        })?;
        url.set_password(Some(token)).map_err(|_| Error::Filesystem {
            message: format!("cannot add credentials to {}", base),
        })?;
    }
    Ok(url.to_string())
}

/// Runs git in `dir`, mapping failures to `Error::GitCommand`
fn run_git(dir: Option<&Path>, args: &[&str], repo: &str) -> Result<String> {
    let mut command = Command::new("git");
    if let Some(dir) = dir {
        command.current_dir(dir);
    }
    let display = args.join(" ");
    let output = command.args(args).output().map_err(|e| Error::GitCommand {
        command: display.clone(),
        repo: repo.to_string(),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::GitCommand {
            command: display,
            repo: repo.to_string(),
            stderr: redact(&stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Strips credentials git may echo back in error output
fn redact(text: &str) -> String {
    text.split_whitespace()
        .map(|word| match Url::parse(word) {
            Ok(mut url) if url.password().is_some() => {
                let _ = url.set_password(None);
                let _ = url.set_username("");
                url.to_string()
            }
            _ => word.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Checks out repositories into temporary directories and pushes commits
#[derive(Debug, Clone)]
pub struct GitProjectStore {
    clone_base: String,
    git: GitConfig,
}

impl GitProjectStore {
    pub fn new(github: &GitHubConfig, git: &GitConfig) -> Self {
        Self {
            clone_base: github.clone_url.clone(),
            git: git.clone(),
        }
    }
}

impl ProjectStore for GitProjectStore {
    fn checkout(&self, target: &ReleaseTarget, branch: &str) -> Result<ProjectTree> {
        let repo = target.repo.full_name();
        fs::create_dir_all(&self.git.work_root)?;
        let workspace = tempfile::Builder::new()
            .prefix(&format!("{}-", target.repo.name))
            .tempdir_in(&self.git.work_root)?;

        let url = clone_url(&self.clone_base, target)?;
        let dir = workspace.path().to_string_lossy().into_owned();
        log::debug!("{}: cloning branch '{}'", repo, branch);
        run_git(
            None,
            &["clone", "--depth=1", "--branch", branch, &url, &dir],
            &repo,
        )?;

        let files = load_tree(workspace.path())?;
        Ok(ProjectTree::in_workspace(target.repo.name.clone(), files, workspace))
    }

    fn commit(&self, target: &ReleaseTarget, tree: &ProjectTree, branch: &str, message: &str) -> Result<()> {
        let repo = target.repo.full_name();
        let dir = tree.base_dir().ok_or_else(|| Error::GitCommand {
            command: "commit".to_string(),
            repo: repo.clone(),
            stderr: format!("{} was not checked out through git", tree.name()),
        })?;

        tree.flush()?;
        let user_name = format!("user.name={}", self.git.committer_name);
        let user_email = format!("user.email={}", self.git.committer_email);
        run_git(Some(dir), &["checkout", "-B", branch], &repo)?;
        run_git(Some(dir), &["add", "--all"], &repo)?;
        run_git(
            Some(dir),
            &["-c", &user_name, "-c", &user_email, "commit", "-m", message],
            &repo,
        )?;
        let refspec = format!("HEAD:refs/heads/{}", branch);
        run_git(Some(dir), &["push", "origin", &refspec], &repo)?;
        log::info!("{}: pushed '{}' to {}", repo, message, branch);
        Ok(())
    }
}
