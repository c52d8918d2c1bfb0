//! Core data types for `migration_parity`.
//!
//! - `Fixture` - one differential test case from the fixture catalog
//! - `BenchFixture` - one benchmark case
//! - `Mode`, `ParityCriteria`, `Gate` - the closed vocabularies of a fixture row
//! - `Status` - the parity outcome of a fixture
//! - `Invocation` - one captured engine run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Whether a fixture is expected to compile or to be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Success,
    Error,
}

impl Mode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Parse the verbatim table value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The comparison contract between the two engines' outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParityCriteria {
    /// Normalized outputs (or diagnostics) must be equal.
    Match,
    /// Differences are tolerated and reported as gaps.
    KnownMismatchAllowed,
    /// Only the legacy engine is consulted.
    ScalaOracleOnly,
}

impl ParityCriteria {
    /// Older catalogs spell `match` after the engines it compares.
    pub const LEGACY_MATCH_ALIAS: &'static str = "match_scala_vs_cpp17_ir";

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::KnownMismatchAllowed => "known_mismatch_allowed",
            Self::ScalaOracleOnly => "scala_oracle_only",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "match" | Self::LEGACY_MATCH_ALIAS => Some(Self::Match),
            "known_mismatch_allowed" => Some(Self::KnownMismatchAllowed),
            "scala_oracle_only" => Some(Self::ScalaOracleOnly),
            _ => None,
        }
    }

    /// Does this criteria require running the migrated engine?
    #[must_use]
    pub const fn compares_migrated(&self) -> bool {
        matches!(self, Self::Match | Self::KnownMismatchAllowed)
    }
}

impl fmt::Display for ParityCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Release severity of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// Blocks release.
    Required,
    /// Tracked but non-blocking unless everything is enforced.
    #[default]
    Visibility,
}

impl Gate {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Visibility => "visibility",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "required" => Some(Self::Required),
            "visibility" => Some(Self::Visibility),
            _ => None,
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parity outcome of one fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Match,
    Mismatch,
    /// Declared, tracked incompleteness. Never counts as a failure.
    Gap,
    Error,
}

impl Status {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Mismatch => "mismatch",
            Self::Gap => "gap",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Mismatch | Self::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One differential fixture. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: String,
    pub category: String,
    pub mode: Mode,
    /// Specification path as written in the catalog (relative to the repo root).
    pub spec_path: PathBuf,
    pub target: String,
    pub parity_criteria: ParityCriteria,
    pub known_deviation: String,
    pub gate: Gate,
}

/// One benchmark fixture (success-mode rows of a benchmark table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchFixture {
    pub id: String,
    pub category: String,
    /// Spec column as written; `inline:<name>` when `inline_template` is set.
    pub spec_path: PathBuf,
    pub target: String,
    pub notes: String,
    /// Built-in template name, materialized per fixture before timing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_template: Option<String>,
}

/// Captured result of running one engine once.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: Vec<String>,
    /// `None` when the process was killed by a signal or timed out.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub artifact_dir: PathBuf,
    pub elapsed: Duration,
    /// Peak resident set size, present when the run was instrumented.
    pub peak_rss_kb: Option<u64>,
    pub timed_out: bool,
}

impl Invocation {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Shell-ish rendering of the command for logs and error messages.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    #[must_use]
    pub fn exit_label(&self) -> String {
        if self.timed_out {
            return "timeout".to_string();
        }
        self.exit_code
            .map_or_else(|| "signal".to_string(), |code| code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_verbatim() {
        assert_eq!(Mode::parse("success"), Some(Mode::Success));
        assert_eq!(Mode::parse("Success"), None);
        assert_eq!(Gate::parse("required"), Some(Gate::Required));
        assert_eq!(Gate::parse(" required"), None);
    }

    #[test]
    fn legacy_match_alias_maps_to_match() {
        assert_eq!(
            ParityCriteria::parse("match_scala_vs_cpp17_ir"),
            Some(ParityCriteria::Match)
        );
        assert_eq!(ParityCriteria::Match.as_str(), "match");
        assert_eq!(ParityCriteria::parse("loose"), None);
    }

    #[test]
    fn gap_is_not_a_failure() {
        assert!(!Status::Gap.is_failure());
        assert!(!Status::Match.is_failure());
        assert!(Status::Mismatch.is_failure());
        assert!(Status::Error.is_failure());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&Status::Mismatch).unwrap();
        assert_eq!(json, "\"mismatch\"");
        let json = serde_json::to_string(&ParityCriteria::KnownMismatchAllowed).unwrap();
        assert_eq!(json, "\"known_mismatch_allowed\"");
    }

    #[test]
    fn exit_label_variants() {
        let mut inv = Invocation {
            command: vec!["legacy".to_string(), "-t".to_string(), "cpp_stl".to_string()],
            exit_code: Some(3),
            stdout: String::new(),
            stderr: String::new(),
            artifact_dir: PathBuf::from("out"),
            elapsed: Duration::ZERO,
            peak_rss_kb: None,
            timed_out: false,
        };
        assert_eq!(inv.exit_label(), "3");
        assert_eq!(inv.command_line(), "legacy -t cpp_stl");
        inv.exit_code = None;
        assert_eq!(inv.exit_label(), "signal");
        inv.timed_out = true;
        assert_eq!(inv.exit_label(), "timeout");
    }
}
