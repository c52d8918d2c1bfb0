//! Fixture catalog loading.
//!
//! Catalogs are tab-separated tables. Blank lines and lines starting with `#`
//! are skipped. Differential catalogs have 7 columns (gate defaults to
//! `visibility`) or 8 columns (explicit gate):
//!
//! ```text
//! id  category  mode  spec_path  target  parity_criteria  known_deviation  [gate]
//! ```
//!
//! Benchmark catalogs have 6 columns:
//!
//! ```text
//! id  category  mode  spec_path  target  notes
//! ```
//!
//! A benchmark `spec_path` of `inline:<name>` selects a built-in template
//! from [`crate::bench::templates`].
//!
//! Every problem is a configuration error carrying the offending raw line, so
//! a bad catalog aborts the run before any engine is invoked.

use crate::bench::templates::{self, INLINE_PREFIX};
use crate::error::{ParityError, Result};
use crate::model::{BenchFixture, Fixture, Gate, Mode, ParityCriteria};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const COMMENT_MARKER: char = '#';
const BENCH_COLUMNS: usize = 6;

/// Read and parse a differential fixture catalog.
///
/// # Errors
///
/// Returns a configuration error if the file is unreadable, any row is
/// malformed, or the catalog contains no fixtures.
pub fn load_fixtures(path: &Path) -> Result<Vec<Fixture>> {
    let contents = read_catalog(path)?;
    let fixtures = parse_fixtures(&contents, path)?;
    if fixtures.is_empty() {
        return Err(ParityError::config(format!(
            "No fixtures found in {}",
            path.display()
        )));
    }
    debug!(path = %path.display(), count = fixtures.len(), "loaded fixture catalog");
    Ok(fixtures)
}

/// A catalog that cannot be read is a configuration problem, like a bad row.
fn read_catalog(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| {
        ParityError::config(format!("cannot read fixture catalog {}: {err}", path.display()))
    })
}

/// Parse differential catalog text. `source` is only used in error messages.
///
/// # Errors
///
/// Returns a configuration error on the first malformed row.
pub fn parse_fixtures(contents: &str, source: &Path) -> Result<Vec<Fixture>> {
    let mut fixtures = Vec::new();
    let mut seen = HashSet::new();

    for (line, row) in data_rows(contents) {
        let (id, category, mode, spec, target, criteria, known_deviation, gate) = match row[..] {
            [id, category, mode, spec, target, criteria, known_deviation] => (
                id,
                category,
                mode,
                spec,
                target,
                criteria,
                known_deviation,
                Gate::Visibility.as_str(),
            ),
            [id, category, mode, spec, target, criteria, known_deviation, gate] => {
                (id, category, mode, spec, target, criteria, known_deviation, gate)
            }
            _ => {
                return Err(ParityError::InvalidFixtureRow {
                    path: source.to_path_buf(),
                    line: line.to_string(),
                });
            }
        };

        let field_error = |field: &'static str, value: &str| ParityError::InvalidFixtureField {
            path: source.to_path_buf(),
            fixture: id.to_string(),
            field,
            value: value.to_string(),
            line: line.to_string(),
        };

        let gate = Gate::parse(gate).ok_or_else(|| field_error("gate", gate))?;
        let mode = Mode::parse(mode).ok_or_else(|| field_error("mode", mode))?;
        let parity_criteria =
            ParityCriteria::parse(criteria).ok_or_else(|| field_error("parity_criteria", criteria))?;
        validate_id(id, source, line)?;

        if !seen.insert(id.to_string()) {
            return Err(ParityError::DuplicateFixture {
                path: source.to_path_buf(),
                id: id.to_string(),
                line: line.to_string(),
            });
        }

        fixtures.push(Fixture {
            id: id.to_string(),
            category: category.to_string(),
            mode,
            spec_path: PathBuf::from(spec),
            target: target.to_string(),
            parity_criteria,
            known_deviation: known_deviation.to_string(),
            gate,
        });
    }

    Ok(fixtures)
}

/// Read and parse a benchmark catalog, keeping only success rows.
///
/// # Errors
///
/// Returns a configuration error if the file is unreadable, any row is
/// malformed, or no success fixtures remain.
pub fn load_bench_fixtures(path: &Path) -> Result<Vec<BenchFixture>> {
    let contents = read_catalog(path)?;
    let fixtures = parse_bench_fixtures(&contents, path)?;
    if fixtures.is_empty() {
        return Err(ParityError::config(format!(
            "No fixtures found in {}",
            path.display()
        )));
    }
    Ok(fixtures)
}

/// Parse benchmark catalog text. Error-mode rows are skipped.
///
/// # Errors
///
/// Returns a configuration error on the first malformed row.
pub fn parse_bench_fixtures(contents: &str, source: &Path) -> Result<Vec<BenchFixture>> {
    let mut fixtures = Vec::new();
    let mut seen = HashSet::new();

    for (line, row) in data_rows(contents) {
        if row.len() != BENCH_COLUMNS {
            return Err(ParityError::InvalidFixtureRow {
                path: source.to_path_buf(),
                line: line.to_string(),
            });
        }
        let (id, category, mode, spec, target, notes) =
            (row[0], row[1], row[2], row[3], row[4], row[5]);

        let mode = Mode::parse(mode).ok_or_else(|| ParityError::InvalidFixtureField {
            path: source.to_path_buf(),
            fixture: id.to_string(),
            field: "mode",
            value: mode.to_string(),
            line: line.to_string(),
        })?;
        validate_id(id, source, line)?;
        if !seen.insert(id.to_string()) {
            return Err(ParityError::DuplicateFixture {
                path: source.to_path_buf(),
                id: id.to_string(),
                line: line.to_string(),
            });
        }
        if mode != Mode::Success {
            debug!(fixture = id, "skipping error-mode benchmark row");
            continue;
        }

        let inline_template = match spec.strip_prefix(INLINE_PREFIX) {
            Some(name) if templates::inline_template(name).is_some() => Some(name.to_string()),
            Some(name) => {
                return Err(ParityError::InvalidFixtureField {
                    path: source.to_path_buf(),
                    fixture: id.to_string(),
                    field: "inline template",
                    value: name.to_string(),
                    line: line.to_string(),
                });
            }
            None => None,
        };

        fixtures.push(BenchFixture {
            id: id.to_string(),
            category: category.to_string(),
            spec_path: PathBuf::from(spec),
            target: target.to_string(),
            notes: notes.to_string(),
            inline_template,
        });
    }

    Ok(fixtures)
}

/// Yield `(raw_line, fields)` for every non-blank, non-comment line.
///
/// Only spaces and carriage returns are stripped from the ends so that a
/// trailing empty column (an empty `known_deviation`) keeps its tab.
fn data_rows(contents: &str) -> impl Iterator<Item = (&str, Vec<&str>)> {
    contents.lines().filter_map(|line| {
        let stripped = line.trim_matches(|c: char| c == ' ' || c == '\r');
        if stripped.trim().is_empty() || stripped.starts_with(COMMENT_MARKER) {
            return None;
        }
        Some((line, stripped.split('\t').collect()))
    })
}

/// Fixture ids name artifact directories, so they must be one path component.
fn validate_id(id: &str, source: &Path, line: &str) -> Result<()> {
    let bad = id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']);
    if bad {
        return Err(ParityError::InvalidFixtureField {
            path: source.to_path_buf(),
            fixture: id.to_string(),
            field: "id",
            value: id.to_string(),
            line: line.to_string(),
        });
    }
    Ok(())
}
