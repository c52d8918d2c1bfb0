//! Parity classification.
//!
//! Maps `(mode, parity_criteria, comparison)` to a [`Status`] plus the
//! [`DiffPayload`] that explains it. Everything here is pure: the runner
//! decides which engines ran, this module decides what their outputs mean.

pub mod diff;

use crate::model::{ParityCriteria, Status};
use crate::normalize;
use serde::{Deserialize, Serialize};

/// Non-blank stderr lines kept in a diagnostic signature.
pub const DIAGNOSTIC_LINE_LIMIT: usize = 12;

pub const LEGACY_NORM_NAME: &str = "legacy.norm";
pub const MIGRATED_NORM_NAME: &str = "migrated.norm";

const UNCLASSIFIED: &str = "<unclassified>";
const EMPTY: &str = "<empty>";

const NOTE_ORACLE_ONLY_GAP: &str =
    "Legacy-only oracle check; migrated engine coverage not available for this target.";
const NOTE_KNOWN_OUTPUT_MISMATCH: &str =
    "Known migration mismatch accepted for this fixture (see known_deviation).";
const NOTE_KNOWN_DIAGNOSTIC_MISMATCH: &str =
    "Known diagnostic mismatch accepted for this fixture (see known_deviation).";
const NOTE_ORACLE_ONLY_ERROR: &str = "Error fixture validated against the legacy oracle only.";

/// The comparable part of a compiler failure.
///
/// Grammar: the first non-blank stderr line, split on its first `:` into
/// `class` and `message` (both trimmed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticSignature {
    pub class: String,
    pub message: String,
    #[serde(rename = "lines")]
    pub raw_lines: Vec<String>,
}

impl DiagnosticSignature {
    #[must_use]
    pub fn from_stderr(stderr: &str) -> Self {
        let lines: Vec<String> = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect();

        let Some(first) = lines.first() else {
            return Self {
                class: EMPTY.to_string(),
                message: String::new(),
                raw_lines: Vec::new(),
            };
        };

        let (class, message) = match first.split_once(':') {
            Some((class, rest)) if !rest.is_empty() => {
                (class.trim().to_string(), rest.trim().to_string())
            }
            _ => (UNCLASSIFIED.to_string(), first.clone()),
        };

        Self {
            class,
            message,
            raw_lines: lines.into_iter().take(DIAGNOSTIC_LINE_LIMIT).collect(),
        }
    }
}

/// Which halves of the diagnostic contract agreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMatch {
    pub class_match: bool,
    pub message_match: bool,
}

impl ContractMatch {
    #[must_use]
    pub const fn holds(&self) -> bool {
        self.class_match && self.message_match
    }
}

/// Evidence attached to every classified fixture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffPayload {
    pub line_count: usize,
    pub snippet: Vec<String>,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy: Option<DiagnosticSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrated: Option<DiagnosticSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<ContractMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrated_sha256: Option<String>,
}

impl DiffPayload {
    /// The bounded diff as written to `diff.patch`.
    #[must_use]
    pub fn patch_text(&self) -> String {
        let mut text = self.snippet.join("\n");
        text.push('\n');
        text
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParityOutcome {
    pub status: Status,
    pub diff: DiffPayload,
}

impl ParityOutcome {
    const fn new(status: Status, diff: DiffPayload) -> Self {
        Self { status, diff }
    }
}

/// A success fixture whose migrated side is not expected to exist.
#[must_use]
pub fn oracle_only_gap() -> ParityOutcome {
    ParityOutcome::new(
        Status::Gap,
        DiffPayload {
            note: Some(NOTE_ORACLE_ONLY_GAP.to_string()),
            ..DiffPayload::default()
        },
    )
}

/// Compare two normalized output blobs.
///
/// Equality is plain string equality; all tolerated noise has been removed
/// by [`normalize`] already.
#[must_use]
pub fn compare_generated(
    criteria: ParityCriteria,
    legacy_norm: &str,
    migrated_norm: &str,
    max_diff_lines: usize,
) -> ParityOutcome {
    if criteria == ParityCriteria::ScalaOracleOnly {
        return oracle_only_gap();
    }

    let digests = DiffPayload {
        legacy_sha256: Some(normalize::digest(legacy_norm)),
        migrated_sha256: Some(normalize::digest(migrated_norm)),
        ..DiffPayload::default()
    };

    if legacy_norm == migrated_norm {
        return ParityOutcome::new(Status::Match, digests);
    }

    let lines = diff::unified_diff(
        legacy_norm,
        migrated_norm,
        LEGACY_NORM_NAME,
        MIGRATED_NORM_NAME,
    );
    let mut payload = DiffPayload {
        line_count: lines.len(),
        truncated: lines.len() > max_diff_lines,
        snippet: lines.into_iter().take(max_diff_lines).collect(),
        ..digests
    };

    if criteria == ParityCriteria::KnownMismatchAllowed {
        payload.note = Some(NOTE_KNOWN_OUTPUT_MISMATCH.to_string());
        ParityOutcome::new(Status::Gap, payload)
    } else {
        ParityOutcome::new(Status::Mismatch, payload)
    }
}

/// Classify an error fixture once both engines have failed as expected.
///
/// `migrated` is `None` only for `scala_oracle_only`; the caller turns a
/// missing migrated signature under any other criteria into an invocation
/// failure before getting here.
#[must_use]
pub fn compare_diagnostics(
    criteria: ParityCriteria,
    legacy: DiagnosticSignature,
    migrated: Option<DiagnosticSignature>,
) -> ParityOutcome {
    let Some(migrated) = migrated.filter(|_| criteria.compares_migrated()) else {
        return ParityOutcome::new(
            Status::Match,
            DiffPayload {
                note: Some(NOTE_ORACLE_ONLY_ERROR.to_string()),
                legacy: Some(legacy),
                ..DiffPayload::default()
            },
        );
    };

    let contract = ContractMatch {
        class_match: legacy.class == migrated.class,
        message_match: legacy.message == migrated.message,
    };
    let status = if contract.holds() {
        Status::Match
    } else if criteria == ParityCriteria::KnownMismatchAllowed {
        Status::Gap
    } else {
        Status::Mismatch
    };

    ParityOutcome::new(
        status,
        DiffPayload {
            note: (status == Status::Gap).then(|| NOTE_KNOWN_DIAGNOSTIC_MISMATCH.to_string()),
            legacy: Some(legacy),
            migrated: Some(migrated),
            contract: Some(contract),
            ..DiffPayload::default()
        },
    )
}
