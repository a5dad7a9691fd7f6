//! Default values for booster-release configuration.
//!
//! This module provides centralized default locations used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Returns the default configuration file path.
///
/// Uses the platform-appropriate configuration directory:
/// - Linux: `~/.config/booster-release/config.yaml` (XDG Base Directory)
/// - macOS: `~/Library/Application Support/booster-release/config.yaml`
/// - Windows: `{FOLDERID_RoamingAppData}\booster-release\config.yaml`
///
/// Falls back to `booster-release.yaml` in the current directory if the
/// platform configuration directory cannot be determined.
///
/// This can be overridden by the `--config` CLI flag or the
/// `BOOSTER_RELEASE_CONFIG` environment variable.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("booster-release").join("config.yaml"))
        .unwrap_or_else(|| PathBuf::from("booster-release.yaml"))
}

/// Returns the directory under which repositories are checked out.
///
/// Each checkout gets its own temporary directory below this root and is
/// removed once the release run that owns it has finished.
pub fn default_work_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".booster-release-work"))
        .join("booster-release")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path_ends_with_file_name() {
        let path = default_config_path();
        assert!(path.ends_with("config.yaml") || path.ends_with("booster-release.yaml"));
    }

    #[test]
    fn test_default_work_root_is_absolute_or_fallback() {
        let root = default_work_root();
        assert!(
            root.is_absolute() || root.starts_with(".booster-release-work"),
            "Expected absolute path or fallback, got: {:?}",
            root
        );
    }
}
