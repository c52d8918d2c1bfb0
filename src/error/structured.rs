//! Structured error output for CI consumers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Context for debugging

use crate::error::ParityError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Configuration Errors (exit code 2) ===
    /// Invalid configuration value or missing input
    ConfigError,
    /// Malformed fixture table row
    InvalidFixtureRow,
    /// Fixture field outside its enum
    InvalidFixtureField,
    /// Fixture id used twice
    DuplicateFixture,
    /// Required engine or instrumentation tool absent
    ToolMissing,
    /// YAML parsing error
    YamlError,

    // === Run Errors (exit code 1) ===
    /// Engine exit status contradicted the fixture
    InvocationFailed,
    /// Report did not satisfy its schema
    SchemaInvalid,
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::InvalidFixtureRow => "INVALID_FIXTURE_ROW",
            Self::InvalidFixtureField => "INVALID_FIXTURE_FIELD",
            Self::DuplicateFixture => "DUPLICATE_FIXTURE",
            Self::ToolMissing => "TOOL_MISSING",
            Self::YamlError => "YAML_ERROR",
            Self::InvocationFailed => "INVOCATION_FAILED",
            Self::SchemaInvalid => "SCHEMA_INVALID",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Get the exit code for this error category.
    ///
    /// - 2: configuration/usage errors (nothing ran)
    /// - 1: everything else
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigError
            | Self::InvalidFixtureRow
            | Self::InvalidFixtureField
            | Self::DuplicateFixture
            | Self::ToolMissing
            | Self::YamlError => 2,
            Self::InvocationFailed
            | Self::SchemaInvalid
            | Self::IoError
            | Self::JsonError
            | Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `ParityError`.
    #[must_use]
    pub fn from_error(err: &ParityError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        Self {
            code,
            message: err.to_string(),
            hint: err.suggestion().map(ToString::to_string),
            context,
        }
    }

    /// Serialize to the JSON envelope written on stderr.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }
        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &ParityError) -> (ErrorCode, Option<Value>) {
        match err {
            ParityError::Config(_) => (ErrorCode::ConfigError, None),
            ParityError::InvalidFixtureRow { path, line } => (
                ErrorCode::InvalidFixtureRow,
                Some(json!({"path": path.display().to_string(), "line": line})),
            ),
            ParityError::InvalidFixtureField {
                path,
                fixture,
                field,
                value,
                line,
            } => (
                ErrorCode::InvalidFixtureField,
                Some(json!({
                    "path": path.display().to_string(),
                    "fixture": fixture,
                    "field": field,
                    "value": value,
                    "line": line,
                })),
            ),
            ParityError::DuplicateFixture { path, id, .. } => (
                ErrorCode::DuplicateFixture,
                Some(json!({"path": path.display().to_string(), "id": id})),
            ),
            ParityError::ToolMissing { tool, path, .. } => (
                ErrorCode::ToolMissing,
                Some(json!({"tool": tool, "path": path.display().to_string()})),
            ),
            ParityError::Yaml(_) => (ErrorCode::YamlError, None),
            ParityError::Invocation(_) => (ErrorCode::InvocationFailed, None),
            ParityError::Schema { errors } => {
                (ErrorCode::SchemaInvalid, Some(json!({"errors": errors})))
            }
            ParityError::Io(_) => (ErrorCode::IoError, None),
            ParityError::Json(_) => (ErrorCode::JsonError, None),
            ParityError::WithContext { context, .. } => {
                (ErrorCode::InternalError, Some(json!({"context": context})))
            }
            ParityError::Other(_) => (ErrorCode::InternalError, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn exit_codes_agree_with_error_enum() {
        let errors = [
            ParityError::config("x"),
            ParityError::invocation("y"),
            ParityError::Schema {
                errors: vec!["schema_version must be 1".to_string()],
            },
            ParityError::InvalidFixtureRow {
                path: PathBuf::from("f.tsv"),
                line: "x".to_string(),
            },
        ];
        for err in &errors {
            let structured = StructuredError::from_error(err);
            assert_eq!(structured.code.exit_code(), err.exit_code(), "{err}");
        }
    }

    #[test]
    fn json_envelope_carries_code_and_context() {
        let err = ParityError::InvalidFixtureField {
            path: PathBuf::from("f.tsv"),
            fixture: "hello".to_string(),
            field: "gate",
            value: "blocking".to_string(),
            line: "hello\t...".to_string(),
        };
        let json = StructuredError::from_error(&err).to_json();
        assert_eq!(json["error"]["code"], "INVALID_FIXTURE_FIELD");
        assert_eq!(json["error"]["context"]["value"], "blocking");
        assert!(json["error"]["hint"].is_string());
    }

    #[test]
    fn human_output_without_color() {
        let structured = StructuredError::from_error(&ParityError::config("no fixtures found"));
        assert_eq!(
            structured.to_human(false),
            "Error: Configuration error: no fixtures found"
        );
    }
}
