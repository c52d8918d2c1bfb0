//! Error types and handling for `migration_parity`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration through `Other`
//! - Separates run-fatal configuration errors (exit code 2) from
//!   per-fixture invocation failures, which the runner records as
//!   `error` outcomes instead of aborting
//! - Provides structured JSON output for CI consumers

mod context;
mod structured;

pub use context::ResultExt;
pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `migration_parity` operations.
#[derive(Error, Debug)]
pub enum ParityError {
    // === Configuration Errors ===
    /// Generic configuration problem (bad value, bad path, empty catalog).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A fixture table row has the wrong shape.
    #[error("Invalid fixtures row in {}: {line}", path.display())]
    InvalidFixtureRow { path: PathBuf, line: String },

    /// A fixture field is outside its allowed set.
    #[error("Invalid fixture {field} '{value}' for fixture {fixture} in {}: {line}", path.display())]
    InvalidFixtureField {
        path: PathBuf,
        fixture: String,
        field: &'static str,
        value: String,
        line: String,
    },

    /// The same fixture id appears twice in one catalog.
    #[error("Duplicate fixture id '{id}' in {}: {line}", path.display())]
    DuplicateFixture {
        path: PathBuf,
        id: String,
        line: String,
    },

    /// A required external tool is absent.
    #[error("{tool} missing at '{}'; {hint}", path.display())]
    ToolMissing {
        tool: String,
        path: PathBuf,
        hint: String,
    },

    // === Invocation Errors ===
    /// An engine behaved contrary to the fixture's expectation.
    #[error("{0}")]
    Invocation(String),

    // === Report Errors ===
    /// A report failed schema validation.
    #[error("Report schema invalid: {}", errors.join("; "))]
    Schema { errors: Vec<String> },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Wrapped errors ===
    /// Error with additional context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ParityError {
    /// Does this error abort the whole run before any fixture executes?
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::InvalidFixtureRow { .. }
                | Self::InvalidFixtureField { .. }
                | Self::DuplicateFixture { .. }
                | Self::ToolMissing { .. }
                | Self::Yaml(_)
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidFixtureRow { .. } => {
                Some("Rows need 7 or 8 tab-separated fields (6 for benchmark tables)")
            }
            Self::InvalidFixtureField { .. } => Some(
                "Valid modes: success, error; gates: required, visibility; criteria: match, known_mismatch_allowed, scala_oracle_only",
            ),
            Self::DuplicateFixture { .. } => Some("Give every fixture row a unique id"),
            Self::ToolMissing { .. } => Some("Build the engines or point legacy.bin/migrated.bin at them"),
            Self::Schema { .. } => Some("Regenerate the report with `mparity bench`"),
            _ => None,
        }
    }

    /// Get the process exit code for this error.
    ///
    /// Configuration problems exit with 2, everything else with 1.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.is_configuration() { 2 } else { 1 }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invocation failure.
    #[must_use]
    pub fn invocation(message: impl Into<String>) -> Self {
        Self::Invocation(message.into())
    }
}

/// Result type using `ParityError`.
pub type Result<T> = std::result::Result<T, ParityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParityError::InvalidFixtureRow {
            path: PathBuf::from("fixtures.tsv"),
            line: "a\tb".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid fixtures row in fixtures.tsv: a\tb");
    }

    #[test]
    fn test_configuration_exit_code() {
        assert_eq!(ParityError::config("bad").exit_code(), 2);
        let missing = ParityError::ToolMissing {
            tool: "legacy engine".to_string(),
            path: PathBuf::from("/nope"),
            hint: "build it".to_string(),
        };
        assert!(missing.is_configuration());
        assert_eq!(missing.exit_code(), 2);
    }

    #[test]
    fn test_invocation_is_not_configuration() {
        let err = ParityError::invocation("Command failed (3): legacy");
        assert!(!err.is_configuration());
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "Command failed (3): legacy");
    }

    #[test]
    fn test_suggestion() {
        let err = ParityError::DuplicateFixture {
            path: PathBuf::from("f.tsv"),
            id: "a".to_string(),
            line: "a".to_string(),
        };
        assert_eq!(err.suggestion(), Some("Give every fixture row a unique id"));
        assert_eq!(ParityError::invocation("x").suggestion(), None);
    }
}
