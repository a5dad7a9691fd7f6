//! # Output Configuration
//!
//! Controls how CLI output looks: emoji or plain markers, and whether fleet
//! runs draw a progress bar. Honours `--color=never|always|auto` and, in
//! auto mode, `NO_COLOR`, `CLICOLOR`, `CLICOLOR_FORCE` and `TERM=dumb`.
//!
//! ```rust,ignore
//! use booster_release::output::{OutputConfig, emoji};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! println!("{} Releasing...", emoji(&config, "🚀", "[RELEASE]"));
//! ```

use crate::fleet::{FleetFailure, FleetSummary};
use crate::release::{EditOutcome, PhaseOutcome, ReleaseReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::env;

/// Output configuration for colors, emojis and progress bars.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// `color_flag` is the value of `--color`: `always`, `never` or `auto`.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // https://no-color.org/: presence alone disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// The emoji when colors are enabled, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Progress bar for a fleet run; hidden when output is plain.
pub fn fleet_progress(config: &OutputConfig, len: usize) -> ProgressBar {
    if !config.use_color {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// One-line description of a tagged phase.
pub fn describe_phase(outcome: &PhaseOutcome) -> String {
    match outcome {
        PhaseOutcome::Tagged { tag } => format!("tagged {}", tag),
        PhaseOutcome::TagFailed { tag, branch } => {
            format!("tag {} FAILED, branch '{}' left for cleanup", tag, branch)
        }
        PhaseOutcome::Skipped => "no changes, not tagged".to_string(),
    }
}

fn describe_bump(outcome: EditOutcome) -> &'static str {
    match outcome {
        EditOutcome::Committed => "version bumped",
        EditOutcome::Unchanged => "version unchanged",
    }
}

/// Prints one released repository.
pub fn print_release(config: &OutputConfig, report: &ReleaseReport) {
    let marker = match (&report.community, &report.productized) {
        (PhaseOutcome::TagFailed { .. }, _) | (_, PhaseOutcome::TagFailed { .. }) => {
            emoji(config, "⚠️ ", "[WARN]")
        }
        _ => emoji(config, "✅", "[OK]"),
    };
    println!("{} {}", marker, report.repo);
    println!("   community:   {}", describe_phase(&report.community));
    println!("   productized: {}", describe_phase(&report.productized));
    println!("   {}", describe_bump(report.version_bump));
}

/// Prints the failures of a fleet run.
pub fn print_failures(config: &OutputConfig, failures: &[FleetFailure]) {
    for failure in failures {
        println!("{} {}: {}", emoji(config, "❌", "[FAIL]"), failure.repo, failure.error);
    }
}

/// Prints the summary of a fleet release.
pub fn print_release_summary(config: &OutputConfig, summary: &FleetSummary<ReleaseReport>) {
    for report in &summary.succeeded {
        print_release(config, report);
    }
    print_failures(config, &summary.failures);
    println!(
        "\n{} {} of {} repositories released",
        emoji(config, "📦", "[DONE]"),
        summary.succeeded.len(),
        summary.total()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_always() {
        assert!(OutputConfig::from_env_and_flag("always").use_color);
    }

    #[test]
    fn test_color_never() {
        assert!(!OutputConfig::from_env_and_flag("NEVER").use_color);
    }

    #[test]
    fn test_emoji_helper() {
        assert_eq!(emoji(&OutputConfig::with_color(), "🚀", "[RELEASE]"), "🚀");
        assert_eq!(emoji(&OutputConfig::without_color(), "🚀", "[RELEASE]"), "[RELEASE]");
    }

    #[test]
    fn test_describe_phase() {
        assert_eq!(
            describe_phase(&PhaseOutcome::Tagged {
                tag: "2.2.5-3".to_string()
            }),
            "tagged 2.2.5-3"
        );
        let failed = describe_phase(&PhaseOutcome::TagFailed {
            tag: "2.2.5-3-redhat".to_string(),
            branch: "temp-prod-crud-example-1".to_string(),
        });
        assert!(failed.contains("temp-prod-crud-example-1"));
        assert_eq!(describe_phase(&PhaseOutcome::Skipped), "no changes, not tagged");
    }

    #[test]
    fn test_plain_output_hides_progress() {
        let bar = fleet_progress(&OutputConfig::without_color(), 10);
        assert!(bar.is_hidden());
    }
}
