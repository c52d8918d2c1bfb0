//! Differential runner.
//!
//! Drives both engines over a fixture catalog, one fixture at a time. Each
//! fixture owns `<output_dir>/<id>/`:
//!
//! ```text
//! legacy_out/  migrated_out/  <id>.<ir-ext>
//! legacy.{stdout,stderr}.log  migrated.{stdout,stderr}.log
//! legacy.raw  migrated.raw  legacy.norm  migrated.norm  diff.patch
//! ```
//!
//! An invocation failure ends only the fixture it happened in; it becomes an
//! `error` row and the run moves on. Configuration errors abort the run.

use crate::engine::imports::{self, ImportResolver, ImportWalk};
use crate::engine::{CompilerEngine, IrCompile, LogFiles, SpecCompile, require_success};
use crate::error::{ParityError, Result, ResultExt};
use crate::model::{Fixture, Mode};
use crate::normalize::{self, Normalizer};
use crate::parity::{self, DiagnosticSignature, LEGACY_NORM_NAME, MIGRATED_NORM_NAME, ParityOutcome};
use crate::report::{FixtureResult, Report};
use crate::util;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DIFF_PATCH_FILE: &str = "diff.patch";

/// Everything a differential run needs besides the fixtures.
pub struct DifferentialRunner<'a> {
    pub legacy: &'a dyn CompilerEngine,
    pub migrated: &'a dyn CompilerEngine,
    pub resolver: &'a ImportResolver,
    pub repo_root: &'a Path,
    pub output_dir: &'a Path,
    pub ir_extension: &'a str,
    pub max_diff_lines: usize,
    /// Targets the migrated engine covers.
    pub migrated_targets: &'a BTreeSet<String>,
}

/// Paths inside one fixture's artifact directory.
struct FixtureLayout {
    dir: PathBuf,
    legacy_out: PathBuf,
    migrated_out: PathBuf,
    ir: PathBuf,
    legacy_logs: LogFiles,
    migrated_logs: LogFiles,
}

impl FixtureLayout {
    fn new(output_dir: &Path, fixture: &Fixture, ir_extension: &str) -> Self {
        let dir = output_dir.join(&fixture.id);
        Self {
            legacy_out: dir.join("legacy_out"),
            migrated_out: dir.join("migrated_out"),
            ir: dir.join(format!("{}.{ir_extension}", fixture.id)),
            legacy_logs: LogFiles::new(&dir, "legacy"),
            migrated_logs: LogFiles::new(&dir, "migrated"),
            dir,
        }
    }
}

impl DifferentialRunner<'_> {
    /// Run every fixture and assemble the report.
    ///
    /// The output directory is reset first. `on_result` is called after each
    /// fixture, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an engine is unavailable or the
    /// output directory cannot be reset. Fixture failures are recorded in
    /// the report instead.
    pub fn run<F>(&self, fixtures: &[Fixture], mut on_result: F) -> Result<Report>
    where
        F: FnMut(&FixtureResult),
    {
        self.legacy.ensure_available()?;
        self.migrated.ensure_available()?;
        util::reset_output_dir(self.output_dir, self.repo_root)?;

        let mut results = Vec::with_capacity(fixtures.len());
        for fixture in fixtures {
            let result = self.run_fixture(fixture)?;
            on_result(&result);
            results.push(result);
        }
        Ok(Report::new(format!("{} diff", env!("CARGO_PKG_NAME")), results))
    }

    /// Run one fixture, converting invocation and I/O failures into an
    /// `error` row.
    ///
    /// # Errors
    ///
    /// Only configuration errors propagate.
    pub fn run_fixture(&self, fixture: &Fixture) -> Result<FixtureResult> {
        let layout = FixtureLayout::new(self.output_dir, fixture, self.ir_extension);
        let artifact_dir = util::display_relative(&layout.dir, self.repo_root);
        info!(fixture = %fixture.id, mode = %fixture.mode, target = %fixture.target, "running fixture");

        let outcome = match fixture.mode {
            Mode::Success => self.run_success(fixture, &layout),
            Mode::Error => self.run_error(fixture, &layout),
        };

        match outcome {
            Ok(outcome) => {
                debug!(fixture = %fixture.id, status = %outcome.status, "classified");
                Ok(FixtureResult::classified(fixture, outcome, &artifact_dir))
            }
            Err(err) if err.is_configuration() => Err(err),
            Err(err) => {
                warn!(fixture = %fixture.id, error = %err, "fixture failed");
                Ok(FixtureResult::failed(fixture, err.to_string(), &artifact_dir))
            }
        }
    }

    fn spec_path(&self, fixture: &Fixture) -> PathBuf {
        util::absolutize(self.repo_root, &fixture.spec_path)
    }

    fn run_success(&self, fixture: &Fixture, layout: &FixtureLayout) -> Result<ParityOutcome> {
        fs::create_dir_all(&layout.dir)?;
        let spec = self.spec_path(fixture);

        let legacy = self.legacy.compile_from_spec(&SpecCompile {
            spec: &spec,
            target: &fixture.target,
            out_dir: &layout.legacy_out,
            emit_ir: Some(&layout.ir),
            logs: &layout.legacy_logs,
        })?;
        require_success(&legacy, &layout.legacy_logs)?;

        let emitted = imports::emit_import_tree(
            self.legacy,
            self.resolver,
            &ImportWalk {
                root_spec: &spec,
                root_ir: &layout.ir,
                target: &fixture.target,
                out_dir: &layout.legacy_out,
                log_dir: &layout.dir,
            },
        )?;
        if !emitted.is_empty() {
            debug!(fixture = %fixture.id, imports = emitted.len(), "emitted import IR");
        }

        if !fixture.parity_criteria.compares_migrated() {
            return Ok(parity::oracle_only_gap());
        }

        let migrated = self.migrated.compile_from_ir(&IrCompile {
            ir: &layout.ir,
            target: &fixture.target,
            out_dir: &layout.migrated_out,
            logs: &layout.migrated_logs,
        })?;
        require_success(&migrated, &layout.migrated_logs)?;

        let normalizer = Normalizer::new(self.repo_root);
        let legacy_norm = write_normalized(&normalizer, &layout.legacy_out, fixture, &layout.dir, "legacy")?;
        let migrated_norm =
            write_normalized(&normalizer, &layout.migrated_out, fixture, &layout.dir, "migrated")?;

        let outcome = parity::compare_generated(
            fixture.parity_criteria,
            &legacy_norm,
            &migrated_norm,
            self.max_diff_lines,
        );
        if outcome.diff.line_count > 0 {
            let patch = layout.dir.join(DIFF_PATCH_FILE);
            fs::write(&patch, outcome.diff.patch_text())
                .context_with(|| format!("writing {}", patch.display()))?;
        }
        Ok(outcome)
    }

    fn run_error(&self, fixture: &Fixture, layout: &FixtureLayout) -> Result<ParityOutcome> {
        fs::create_dir_all(&layout.dir)?;
        let spec = self.spec_path(fixture);

        let legacy = self.legacy.compile_from_spec(&SpecCompile {
            spec: &spec,
            target: &fixture.target,
            out_dir: &layout.legacy_out,
            emit_ir: None,
            logs: &layout.legacy_logs,
        })?;
        if legacy.succeeded() {
            return Err(ParityError::invocation(
                "Expected legacy engine failure for mode=error fixture, but command succeeded",
            ));
        }
        let legacy_sig = DiagnosticSignature::from_stderr(&legacy.stderr);

        if !fixture.parity_criteria.compares_migrated() {
            return Ok(parity::compare_diagnostics(fixture.parity_criteria, legacy_sig, None));
        }
        if !self.migrated_targets.contains(&fixture.target) {
            return Err(ParityError::invocation(format!(
                "Migrated diagnostic parity requested, but the migrated engine does not cover target '{}'",
                fixture.target
            )));
        }

        let migrated = self.migrated.compile_from_spec(&SpecCompile {
            spec: &spec,
            target: &fixture.target,
            out_dir: &layout.migrated_out,
            emit_ir: None,
            logs: &layout.migrated_logs,
        })?;
        if migrated.succeeded() {
            return Err(ParityError::invocation(
                "Expected migrated engine failure for mode=error fixture, but command succeeded",
            ));
        }
        let migrated_sig = DiagnosticSignature::from_stderr(&migrated.stderr);

        Ok(parity::compare_diagnostics(
            fixture.parity_criteria,
            legacy_sig,
            Some(migrated_sig),
        ))
    }
}

/// Aggregate an output tree into `<label>.raw`, normalize it into
/// `<label>.norm` and return the normalized text.
fn write_normalized(
    normalizer: &Normalizer,
    out_dir: &Path,
    fixture: &Fixture,
    fixture_dir: &Path,
    label: &str,
) -> Result<String> {
    let raw_path = fixture_dir.join(format!("{label}.raw"));
    let norm_path = fixture_dir.join(match label {
        "legacy" => LEGACY_NORM_NAME.to_string(),
        "migrated" => MIGRATED_NORM_NAME.to_string(),
        other => format!("{other}.norm"),
    });

    let raw = normalize::aggregate_tree(out_dir, &fixture.id)?;
    fs::write(&raw_path, &raw).context_with(|| format!("writing {}", raw_path.display()))?;
    let normalized = normalizer.normalize(&raw);
    fs::write(&norm_path, &normalized).context_with(|| format!("writing {}", norm_path.display()))?;
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gate, Invocation, ParityCriteria, Status};
    use std::cell::RefCell;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Writes a fixed file set and exits with a fixed code.
    struct StubEngine {
        name: &'static str,
        files: Vec<(&'static str, String)>,
        exit_code: i32,
        stderr: &'static str,
        calls: RefCell<Vec<String>>,
    }

    impl StubEngine {
        fn ok(name: &'static str, body: &str) -> Self {
            Self {
                name,
                files: vec![("out.cpp", body.to_string())],
                exit_code: 0,
                stderr: "",
                calls: RefCell::new(Vec::new()),
            }
        }

        fn failing(name: &'static str, stderr: &'static str) -> Self {
            Self {
                name,
                files: Vec::new(),
                exit_code: 1,
                stderr,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn finish(&self, kind: &str, out_dir: &Path, ir: Option<&Path>, logs: &LogFiles) -> Result<Invocation> {
            self.calls.borrow_mut().push(kind.to_string());
            fs::create_dir_all(out_dir)?;
            for (name, body) in &self.files {
                fs::write(out_dir.join(name), body)?;
            }
            if let Some(ir) = ir {
                fs::write(ir, "meta fx\n")?;
            }
            fs::write(&logs.stdout, "")?;
            fs::write(&logs.stderr, self.stderr)?;
            Ok(Invocation {
                command: vec![self.name.to_string(), kind.to_string()],
                exit_code: Some(self.exit_code),
                stdout: String::new(),
                stderr: self.stderr.to_string(),
                artifact_dir: out_dir.to_path_buf(),
                elapsed: Duration::from_millis(1),
                peak_rss_kb: None,
                timed_out: false,
            })
        }
    }

    impl CompilerEngine for StubEngine {
        fn name(&self) -> &str {
            self.name
        }

        fn compile_from_spec(&self, request: &SpecCompile<'_>) -> Result<Invocation> {
            self.finish("spec", request.out_dir, request.emit_ir, request.logs)
        }

        fn compile_from_ir(&self, request: &IrCompile<'_>) -> Result<Invocation> {
            self.finish("ir", request.out_dir, None, request.logs)
        }
    }

    fn fixture(mode: Mode, criteria: ParityCriteria, target: &str) -> Fixture {
        Fixture {
            id: "fx".to_string(),
            category: "smoke".to_string(),
            mode,
            spec_path: PathBuf::from("formats/fx.ksy"),
            target: target.to_string(),
            parity_criteria: criteria,
            known_deviation: String::new(),
            gate: Gate::Required,
        }
    }

    fn run_one(legacy: &StubEngine, migrated: &StubEngine, fixture: &Fixture) -> (TempDir, FixtureResult) {
        let temp = TempDir::new().unwrap();
        let root = fs::canonicalize(temp.path()).unwrap();
        let out = root.join("out");
        let targets = BTreeSet::from(["cpp_stl".to_string()]);
        let resolver = ImportResolver::new(Vec::new(), "ksy", "ksir");
        let runner = DifferentialRunner {
            legacy,
            migrated,
            resolver: &resolver,
            repo_root: &root,
            output_dir: &out,
            ir_extension: "ksir",
            max_diff_lines: 80,
            migrated_targets: &targets,
        };
        let report = runner.run(std::slice::from_ref(fixture), |_| {}).unwrap();
        let result = report.fixtures.into_iter().next().unwrap();
        (temp, result)
    }

    #[test]
    fn identical_outputs_match_and_leave_artifacts() {
        let legacy = StubEngine::ok("legacy", "int x;\n");
        let migrated = StubEngine::ok("migrated", "int x;\n");
        let fx = fixture(Mode::Success, ParityCriteria::Match, "cpp_stl");
        let (temp, result) = run_one(&legacy, &migrated, &fx);

        assert_eq!(result.status, Status::Match);
        assert_eq!(result.artifact_dir, "out/fx");
        let dir = temp.path().join("out/fx");
        for file in ["fx.ksir", "legacy.raw", "migrated.raw", "legacy.norm", "migrated.norm"] {
            assert!(dir.join(file).is_file(), "missing {file}");
        }
        assert!(!dir.join(DIFF_PATCH_FILE).exists());
        assert_eq!(*migrated.calls.borrow(), ["ir"]);
    }

    #[test]
    fn differing_outputs_write_patch() {
        let legacy = StubEngine::ok("legacy", "int x;\n");
        let migrated = StubEngine::ok("migrated", "long x;\n");
        let fx = fixture(Mode::Success, ParityCriteria::Match, "cpp_stl");
        let (temp, result) = run_one(&legacy, &migrated, &fx);

        assert_eq!(result.status, Status::Mismatch);
        let patch = fs::read_to_string(temp.path().join("out/fx").join(DIFF_PATCH_FILE)).unwrap();
        assert!(patch.starts_with("--- legacy.norm\n+++ migrated.norm\n"));
        assert!(patch.contains("+long x;"));
    }

    #[test]
    fn oracle_only_success_skips_migrated_engine() {
        let legacy = StubEngine::ok("legacy", "x = 1\n");
        let migrated = StubEngine::ok("migrated", "x = 1\n");
        let fx = fixture(Mode::Success, ParityCriteria::ScalaOracleOnly, "python");
        let (_temp, result) = run_one(&legacy, &migrated, &fx);

        assert_eq!(result.status, Status::Gap);
        assert!(migrated.calls.borrow().is_empty());
        assert_eq!(result.diff.unwrap().line_count, 0);
    }

    #[test]
    fn legacy_failure_on_success_fixture_is_an_error_row() {
        let legacy = StubEngine::failing("legacy", "boom: no\n");
        let migrated = StubEngine::ok("migrated", "");
        let fx = fixture(Mode::Success, ParityCriteria::Match, "cpp_stl");
        let (_temp, result) = run_one(&legacy, &migrated, &fx);

        assert_eq!(result.status, Status::Error);
        assert!(result.error.unwrap().starts_with("Command failed (1): legacy spec"));
    }

    #[test]
    fn error_fixture_with_unexpected_legacy_success() {
        let legacy = StubEngine::ok("legacy", "");
        let migrated = StubEngine::failing("migrated", "x: y");
        let fx = fixture(Mode::Error, ParityCriteria::Match, "cpp_stl");
        let (_temp, result) = run_one(&legacy, &migrated, &fx);

        assert_eq!(result.status, Status::Error);
        assert_eq!(
            result.error.as_deref(),
            Some("Expected legacy engine failure for mode=error fixture, but command succeeded")
        );
    }

    #[test]
    fn error_fixture_compares_diagnostics() {
        let legacy = StubEngine::failing("legacy", "/a.ksy: bad type\n");
        let migrated = StubEngine::failing("migrated", "/a.ksy: bad type\n");
        let fx = fixture(Mode::Error, ParityCriteria::Match, "cpp_stl");
        let (_temp, result) = run_one(&legacy, &migrated, &fx);

        assert_eq!(result.status, Status::Match);
        assert_eq!(*migrated.calls.borrow(), ["spec"]);
        assert!(result.diff.unwrap().contract.unwrap().holds());
    }

    #[test]
    fn error_fixture_for_uncovered_target_cannot_compare() {
        let legacy = StubEngine::failing("legacy", "/a.ksy: bad type\n");
        let migrated = StubEngine::failing("migrated", "/a.ksy: bad type\n");
        let fx = fixture(Mode::Error, ParityCriteria::Match, "python");
        let (_temp, result) = run_one(&legacy, &migrated, &fx);

        assert_eq!(result.status, Status::Error);
        assert!(migrated.calls.borrow().is_empty());
    }
}
