//! Gate and report aggregation for differential runs.
//!
//! Rolls per-fixture results into `report.json` (schema version 1) and a
//! plain-text `summary.txt`, and turns the tallies into an exit decision
//! under the configured [`Enforcement`] mode.

use crate::error::{Result, ResultExt};
use crate::model::{Fixture, Gate, Mode, ParityCriteria, Status};
use crate::parity::{DiffPayload, ParityOutcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;
pub const REPORT_FILE: &str = "report.json";
pub const SUMMARY_FILE: &str = "summary.txt";

/// Diff lines shown per mismatch in the text summary.
const SUMMARY_SNIPPET_LINES: usize = 12;
const DEFAULT_GAP_RATIONALE: &str = "coverage gap";

/// Which failures turn into a non-zero exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enforcement {
    /// Never fail on parity results.
    None,
    /// Fail only on required-gated mismatches and errors.
    Required,
    /// Fail on any mismatch or error.
    #[default]
    All,
}

impl Enforcement {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Required => "required",
            Self::All => "all",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "required" => Some(Self::Required),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl fmt::Display for Enforcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fixture's row in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureResult {
    pub id: String,
    pub category: String,
    pub mode: Mode,
    pub target: String,
    pub parity_criteria: ParityCriteria,
    pub known_deviation: String,
    pub gate: Gate,
    pub spec_path: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub artifact_dir: String,
}

impl FixtureResult {
    fn base(fixture: &Fixture, status: Status, artifact_dir: &str) -> Self {
        Self {
            id: fixture.id.clone(),
            category: fixture.category.clone(),
            mode: fixture.mode,
            target: fixture.target.clone(),
            parity_criteria: fixture.parity_criteria,
            known_deviation: fixture.known_deviation.clone(),
            gate: fixture.gate,
            spec_path: fixture.spec_path.to_string_lossy().replace('\\', "/"),
            status,
            diff: None,
            error: None,
            artifact_dir: artifact_dir.to_string(),
        }
    }

    #[must_use]
    pub fn classified(fixture: &Fixture, outcome: ParityOutcome, artifact_dir: &str) -> Self {
        Self {
            diff: Some(outcome.diff),
            ..Self::base(fixture, outcome.status, artifact_dir)
        }
    }

    /// A fixture aborted by an invocation failure.
    #[must_use]
    pub fn failed(fixture: &Fixture, error: impl Into<String>, artifact_dir: &str) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::base(fixture, Status::Error, artifact_dir)
        }
    }
}

/// Per-target status tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetTally {
    pub pass: usize,
    pub fail: usize,
    pub gap: usize,
    pub error: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub fixtures_total: usize,
    pub fixtures_required: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub gaps: usize,
    pub errors: usize,
    pub required_mismatches: usize,
    pub required_errors: usize,
    pub by_target: BTreeMap<String, TargetTally>,
}

impl Summary {
    #[must_use]
    pub fn tally(results: &[FixtureResult]) -> Self {
        let mut summary = Self {
            fixtures_total: results.len(),
            ..Self::default()
        };

        for result in results {
            let required = result.gate == Gate::Required;
            let target = summary.by_target.entry(result.target.clone()).or_default();
            if required {
                summary.fixtures_required += 1;
            }
            match result.status {
                Status::Match => {
                    summary.matches += 1;
                    target.pass += 1;
                }
                Status::Mismatch => {
                    summary.mismatches += 1;
                    target.fail += 1;
                    if required {
                        summary.required_mismatches += 1;
                    }
                }
                Status::Gap => {
                    summary.gaps += 1;
                    target.gap += 1;
                }
                Status::Error => {
                    summary.errors += 1;
                    target.error += 1;
                    if required {
                        summary.required_errors += 1;
                    }
                }
            }
        }
        summary
    }

    /// Failures that count under `enforcement`.
    #[must_use]
    pub const fn enforced_failures(&self, enforcement: Enforcement) -> usize {
        match enforcement {
            Enforcement::None => 0,
            Enforcement::Required => self.required_mismatches + self.required_errors,
            Enforcement::All => self.mismatches + self.errors,
        }
    }
}

/// The differential report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub schema_version: u32,
    pub tool: String,
    pub fixtures: Vec<FixtureResult>,
    pub summary: Summary,
}

impl Report {
    #[must_use]
    pub fn new(tool: impl Into<String>, fixtures: Vec<FixtureResult>) -> Self {
        let summary = Summary::tally(&fixtures);
        Self {
            schema_version: SCHEMA_VERSION,
            tool: tool.into(),
            fixtures,
            summary,
        }
    }

    /// Process exit code for this report.
    #[must_use]
    pub const fn exit_code(&self, enforcement: Enforcement, informational: bool) -> i32 {
        if informational || self.summary.enforced_failures(enforcement) == 0 {
            0
        } else {
            1
        }
    }

    /// Human-readable summary, one block per fixture.
    #[must_use]
    pub fn render_summary(&self) -> String {
        let s = &self.summary;
        let mut out = String::new();
        let _ = writeln!(out, "# Migration differential report");
        out.push('\n');
        let _ = writeln!(out, "fixtures: {}", s.fixtures_total);
        let _ = writeln!(out, "required fixtures: {}", s.fixtures_required);
        let _ = writeln!(out, "matches: {}", s.matches);
        let _ = writeln!(out, "mismatches: {}", s.mismatches);
        let _ = writeln!(out, "gaps: {}", s.gaps);
        let _ = writeln!(out, "errors: {}", s.errors);
        let _ = writeln!(out, "required mismatches: {}", s.required_mismatches);
        let _ = writeln!(out, "required errors: {}", s.required_errors);
        out.push('\n');
        out.push_str("per-target:\n");
        for (target, t) in &s.by_target {
            let _ = writeln!(
                out,
                "- {target}: pass={} fail={} gap={} error={}",
                t.pass, t.fail, t.gap, t.error
            );
        }
        out.push('\n');

        for fixture in &self.fixtures {
            let _ = writeln!(
                out,
                "- {} [{}/{}] gate={}: {} ({})",
                fixture.id,
                fixture.target,
                fixture.parity_criteria,
                fixture.gate,
                fixture.status,
                fixture.artifact_dir
            );
            if !fixture.known_deviation.is_empty() {
                let _ = writeln!(out, "  known deviation: {}", fixture.known_deviation);
            }
            match fixture.status {
                Status::Mismatch => {
                    let diff = fixture.diff.clone().unwrap_or_default();
                    let _ = writeln!(out, "  diff lines: {}", diff.line_count);
                    for line in diff.snippet.iter().take(SUMMARY_SNIPPET_LINES) {
                        let _ = writeln!(out, "    {line}");
                    }
                    if diff.truncated {
                        out.push_str("    ... (truncated)\n");
                    }
                }
                Status::Gap => {
                    let rationale = fixture
                        .diff
                        .as_ref()
                        .and_then(|d| d.note.as_deref())
                        .unwrap_or(DEFAULT_GAP_RATIONALE);
                    let _ = writeln!(out, "  gap rationale: {rationale}");
                }
                Status::Error => {
                    let _ = writeln!(
                        out,
                        "  error: {}",
                        fixture.error.as_deref().unwrap_or_default()
                    );
                }
                Status::Match => {}
            }
        }
        out
    }

    /// Write `report.json` and `summary.txt` into `out_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be written.
    pub fn write(&self, out_dir: &Path) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(out_dir)?;
        let report_path = out_dir.join(REPORT_FILE);
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(&report_path, json)
            .context_with(|| format!("writing {}", report_path.display()))?;

        let summary_path = out_dir.join(SUMMARY_FILE);
        fs::write(&summary_path, self.render_summary())
            .context_with(|| format!("writing {}", summary_path.display()))?;
        Ok((report_path, summary_path))
    }
}
