//! # Error Handling
//!
//! This module defines the centralized error type for `booster-release`.
//! It uses `thiserror` to build an `Error` enum covering every failure mode
//! of the release engine, each variant carrying enough context (repository,
//! phase, URL, command) to make a log line actionable on its own.
//!
//! ## Key Components
//!
//! - **`Error`**: all failures the library can report.
//! - **`Result<T>`**: alias for `std::result::Result<T, Error>`.
//!
//! Fleet operations never propagate a single repository's `Error` to its
//! siblings; they collect one `Result` per target instead (see
//! [`crate::fleet`]). Interactive single-repository commands surface the
//! first `Error` they hit.

use thiserror::Error;

/// Main error type for booster-release operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be parsed or failed validation.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A version string did not match the shape an operation requires.
    #[error("Unsupported version format '{version}'")]
    InvalidVersionFormat { version: String },

    /// An interactively supplied upstream framework version was malformed.
    #[error("Invalid upstream version: '{version}'")]
    InvalidUpstreamVersion { version: String },

    /// An error occurred while executing a Git command.
    #[error("Git command failed for {repo}: {command} - {stderr}")]
    GitCommand {
        command: String,
        repo: String,
        stderr: String,
    },

    /// The version-control host rejected or failed a request.
    #[error("Version control host error during {operation} on {repo}: {message}")]
    Host {
        operation: String,
        repo: String,
        message: String,
    },

    /// A POM document could not be read or edited.
    #[error("POM error in {path}: {message}")]
    Pom { path: String, message: String },

    /// A project editor failed; the whole chain is abandoned.
    #[error("Editor '{editor}' failed: {message}")]
    Editor { editor: String, message: String },

    /// The external license-report generator could not run or failed.
    #[error("License generation error: {message}")]
    LicenseGeneration { message: String },

    /// A catalog or metadata document could not be reconciled.
    #[error("Catalog error: {message}")]
    Catalog { message: String },

    /// The execution environment does not allow the requested operation.
    #[error("Environment check failed: {message}")]
    Environment { message: String },

    /// A release phase failed for one repository.
    #[error("Release of {repo} failed during {phase}: {source}")]
    Release {
        repo: String,
        phase: String,
        #[source]
        source: Box<Error>,
    },

    /// The fleet worker pool could not be set up.
    #[error("Fleet execution error: {message}")]
    Fleet { message: String },

    /// An error occurred with an in-memory filesystem operation.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An error occurred during a network operation.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A semantic versioning parsing error, wrapped from `semver::Error`.
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),
}

impl Error {
    /// Wraps this error with the repository and release phase it occurred in.
    pub fn in_phase(self, repo: impl Into<String>, phase: impl std::fmt::Display) -> Self {
        Error::Release {
            repo: repo.into(),
            phase: phase.to_string(),
            source: Box::new(self),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
