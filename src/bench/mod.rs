//! Benchmark engine.
//!
//! Times the legacy engine compiling from a specification against the
//! migrated engine compiling from pre-built IR. Each path gets warmup
//! iterations (discarded) and measured iterations, every one into its own
//! `iter_<n>` directory. Medians feed migrated ÷ legacy ratios, which are
//! checked against [`Thresholds`].
//!
//! The result is informational: breaches set the status to `warn` but only
//! fail the process when the caller asks for it.

pub mod templates;

use crate::engine::imports::{self, ImportResolver, ImportWalk};
use crate::engine::{CompilerEngine, IrCompile, LogFiles, SpecCompile, require_success};
use crate::error::{ParityError, Result, ResultExt};
use crate::model::BenchFixture;
use crate::util;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SCHEMA_VERSION: u32 = 1;
pub const REPORT_FILE: &str = "report.json";
pub const SUMMARY_FILE: &str = "summary.txt";

pub const LEGACY_PATH: &str = "legacy";
pub const MIGRATED_PATH: &str = "migrated";

/// Ceilings a fixture is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub latency_ratio_max: f64,
    pub memory_ratio_max: f64,
    pub stability_cv_max: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            latency_ratio_max: 2.0,
            memory_ratio_max: 2.0,
            stability_cv_max: 0.20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Warmup,
    Measured,
}

/// One timed iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub iteration: usize,
    pub phase: Phase,
    pub elapsed_sec: f64,
    #[serde(default)]
    pub max_rss_kb: Option<u64>,
}

/// Location and spread of one metric's samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    pub median: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation over mean.
    pub cv: f64,
}

impl SampleStats {
    /// Statistics of `samples`; all zero when empty.
    #[must_use]
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        Self {
            median,
            mean: mean(&sorted),
            min: sorted[0],
            max: sorted[n - 1],
            cv: coefficient_of_variation(&sorted),
        }
    }
}

fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population standard deviation divided by the mean.
///
/// Zero for fewer than two samples or a zero mean.
#[must_use]
pub fn coefficient_of_variation(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let mean = mean(samples);
    if mean == 0.0 {
        return 0.0;
    }
    let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / samples.len() as f64;
    variance.sqrt() / mean
}

/// `numerator / denominator`, or `None` when the denominator is zero.
#[must_use]
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator != 0.0).then(|| numerator / denominator)
}

/// Measured-phase statistics for one engine path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub iterations: usize,
    pub latency_sec: SampleStats,
    pub max_rss_kb: SampleStats,
}

impl BenchmarkSummary {
    #[must_use]
    pub fn from_runs(runs: &[BenchmarkRun]) -> Self {
        let measured: Vec<&BenchmarkRun> = runs.iter().filter(|r| r.phase == Phase::Measured).collect();
        let latencies: Vec<f64> = measured.iter().map(|r| r.elapsed_sec).collect();
        let rss: Vec<f64> = measured
            .iter()
            .filter_map(|r| r.max_rss_kb)
            .map(|kb| kb as f64)
            .collect();
        Self {
            iterations: measured.len(),
            latency_sec: SampleStats::from_samples(&latencies),
            max_rss_kb: SampleStats::from_samples(&rss),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathReport {
    pub runs: Vec<BenchmarkRun>,
    pub summary: BenchmarkSummary,
}

impl PathReport {
    #[must_use]
    pub fn from_runs(runs: Vec<BenchmarkRun>) -> Self {
        let summary = BenchmarkSummary::from_runs(&runs);
        Self { runs, summary }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnginePaths {
    pub legacy: PathReport,
    pub migrated: PathReport,
}

/// Migrated ÷ legacy medians. `None` serializes as `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratios {
    pub latency_median_ratio: Option<f64>,
    pub memory_median_ratio: Option<f64>,
}

impl Ratios {
    #[must_use]
    pub fn from_paths(paths: &EnginePaths) -> Self {
        let (legacy, migrated) = (&paths.legacy.summary, &paths.migrated.summary);
        Self {
            latency_median_ratio: ratio(migrated.latency_sec.median, legacy.latency_sec.median),
            memory_median_ratio: ratio(migrated.max_rss_kb.median, legacy.max_rss_kb.median),
        }
    }
}

/// Names of every threshold a fixture exceeds.
#[must_use]
pub fn threshold_breaches(paths: &EnginePaths, ratios: &Ratios, thresholds: &Thresholds) -> Vec<String> {
    let mut breaches = Vec::new();
    if ratios
        .latency_median_ratio
        .is_some_and(|r| r > thresholds.latency_ratio_max)
    {
        breaches.push("latency_ratio".to_string());
    }
    if ratios
        .memory_median_ratio
        .is_some_and(|r| r > thresholds.memory_ratio_max)
    {
        breaches.push("memory_ratio".to_string());
    }
    for (name, path) in [(LEGACY_PATH, &paths.legacy), (MIGRATED_PATH, &paths.migrated)] {
        if path.summary.latency_sec.cv > thresholds.stability_cv_max {
            breaches.push(format!("stability_cv:{name}"));
        }
    }
    breaches
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureBench {
    pub id: String,
    pub category: String,
    pub target: String,
    pub spec_path: String,
    pub notes: String,
    pub paths: EnginePaths,
    pub ratios: Ratios,
    pub threshold_breaches: Vec<String>,
    pub artifact_dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchStatus {
    Pass,
    Warn,
}

impl fmt::Display for BenchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "pass",
            Self::Warn => "warn",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchSummary {
    pub fixtures_total: usize,
    /// Fixtures with at least one breach.
    pub threshold_breaches: usize,
    pub status: BenchStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchReport {
    pub schema_version: u32,
    pub tool: String,
    pub generated_at: String,
    pub thresholds: Thresholds,
    pub fixtures: Vec<FixtureBench>,
    pub summary: BenchSummary,
}

impl BenchReport {
    #[must_use]
    pub fn new(tool: impl Into<String>, thresholds: Thresholds, fixtures: Vec<FixtureBench>) -> Self {
        let breached = fixtures
            .iter()
            .filter(|f| !f.threshold_breaches.is_empty())
            .count();
        let summary = BenchSummary {
            fixtures_total: fixtures.len(),
            threshold_breaches: breached,
            status: if breached == 0 {
                BenchStatus::Pass
            } else {
                BenchStatus::Warn
            },
        };
        Self {
            schema_version: SCHEMA_VERSION,
            tool: tool.into(),
            generated_at: Utc::now().to_rfc3339(),
            thresholds,
            fixtures,
            summary,
        }
    }

    #[must_use]
    pub fn exit_code(&self, fail_on_warn: bool) -> i32 {
        i32::from(fail_on_warn && self.summary.status == BenchStatus::Warn)
    }

    #[must_use]
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        out.push_str("# Migration benchmark report\n\n");
        let _ = writeln!(out, "fixtures: {}", self.summary.fixtures_total);
        let _ = writeln!(out, "threshold breaches: {}", self.summary.threshold_breaches);
        let _ = writeln!(out, "status: {}", self.summary.status);
        out.push('\n');
        for fixture in &self.fixtures {
            let _ = writeln!(out, "- {} ({}):", fixture.id, fixture.category);
            let _ = writeln!(
                out,
                "  latency ratio migrated/legacy median: {}",
                format_ratio(fixture.ratios.latency_median_ratio)
            );
            let _ = writeln!(
                out,
                "  memory ratio migrated/legacy median: {}",
                format_ratio(fixture.ratios.memory_median_ratio)
            );
            if !fixture.threshold_breaches.is_empty() {
                let _ = writeln!(out, "  breaches: {}", fixture.threshold_breaches.join(", "));
            }
            let _ = writeln!(out, "  artifact_dir: {}", fixture.artifact_dir);
        }
        out
    }

    /// Validate, then write `report.json` and `summary.txt`.
    ///
    /// # Errors
    ///
    /// Returns `ParityError::Schema` if the report fails validation, or an
    /// I/O error if a file cannot be written.
    pub fn write(&self, out_dir: &Path) -> Result<(PathBuf, PathBuf)> {
        let value = serde_json::to_value(self)?;
        let errors = validate_report(&value);
        if !errors.is_empty() {
            return Err(ParityError::Schema { errors });
        }

        fs::create_dir_all(out_dir)?;
        let report_path = out_dir.join(REPORT_FILE);
        let mut json = serde_json::to_string_pretty(&value)?;
        json.push('\n');
        fs::write(&report_path, json)
            .context_with(|| format!("writing {}", report_path.display()))?;
        let summary_path = out_dir.join(SUMMARY_FILE);
        fs::write(&summary_path, self.render_summary())
            .context_with(|| format!("writing {}", summary_path.display()))?;
        Ok((report_path, summary_path))
    }
}

fn format_ratio(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "n/a".to_string(), |r| format!("{r:.3}"))
}

/// Structural checks on a benchmark report. Empty means valid.
#[must_use]
pub fn validate_report(report: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    if report.get("schema_version").and_then(Value::as_u64) != Some(u64::from(SCHEMA_VERSION)) {
        errors.push(format!("schema_version must be {SCHEMA_VERSION}"));
    }
    for key in ["tool", "generated_at", "fixtures", "summary", "thresholds"] {
        if report.get(key).is_none() {
            errors.push(format!("missing top-level key: {key}"));
        }
    }

    let fixtures = match report.get("fixtures") {
        None => return errors,
        Some(Value::Array(fixtures)) => fixtures,
        Some(_) => {
            errors.push("fixtures must be a list".to_string());
            return errors;
        }
    };

    for fixture in fixtures {
        let id = fixture.get("id").and_then(Value::as_str).unwrap_or("<unknown>");
        let Some(paths) = fixture.get("paths") else {
            errors.push(format!("fixture missing paths: {id}"));
            continue;
        };
        for name in [LEGACY_PATH, MIGRATED_PATH] {
            match paths.get(name) {
                Some(path) if path.is_object() => {
                    if path.get("runs").is_none() || path.get("summary").is_none() {
                        errors.push(format!("fixture {id} path {name} missing runs/summary"));
                    }
                }
                _ => errors.push(format!("fixture {id} missing {name}")),
            }
        }
    }
    errors
}

/// Read and validate a report on disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not JSON.
pub fn check_report_file(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).context_with(|| format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)?;
    Ok(validate_report(&value))
}

/// Runs benchmark fixtures against a pair of engines.
pub struct BenchRunner<'a> {
    pub legacy: &'a dyn CompilerEngine,
    pub migrated: &'a dyn CompilerEngine,
    pub resolver: &'a ImportResolver,
    pub repo_root: &'a Path,
    pub ir_extension: &'a str,
    pub spec_extension: &'a str,
    pub iterations: usize,
    pub warmup: usize,
    pub thresholds: Thresholds,
}

impl BenchRunner<'_> {
    /// Benchmark one fixture into `<out_root>/<id>/`.
    ///
    /// # Errors
    ///
    /// Any failed invocation aborts the benchmark with an invocation error.
    pub fn run_fixture(&self, fixture: &BenchFixture, out_root: &Path) -> Result<FixtureBench> {
        let fixture_dir = out_root.join(&fixture.id);
        fs::create_dir_all(&fixture_dir)?;
        let spec = self.materialize_spec(fixture, &fixture_dir)?;

        let ir = self.build_ir(fixture, &spec, &fixture_dir)?;

        let legacy_runs = self.measure(LEGACY_PATH, &fixture_dir, |iter_dir, logs| {
            self.legacy.compile_from_spec(&SpecCompile {
                spec: &spec,
                target: &fixture.target,
                out_dir: iter_dir,
                emit_ir: None,
                logs,
            })
        })?;
        let migrated_runs = self.measure(MIGRATED_PATH, &fixture_dir, |iter_dir, logs| {
            self.migrated.compile_from_ir(&IrCompile {
                ir: &ir,
                target: &fixture.target,
                out_dir: iter_dir,
                logs,
            })
        })?;

        let paths = EnginePaths {
            legacy: PathReport::from_runs(legacy_runs),
            migrated: PathReport::from_runs(migrated_runs),
        };
        let ratios = Ratios::from_paths(&paths);
        let breaches = threshold_breaches(&paths, &ratios, &self.thresholds);
        info!(
            fixture = %fixture.id,
            latency_ratio = ?ratios.latency_median_ratio,
            memory_ratio = ?ratios.memory_median_ratio,
            breaches = breaches.len(),
            "benchmarked fixture"
        );

        Ok(FixtureBench {
            id: fixture.id.clone(),
            category: fixture.category.clone(),
            target: fixture.target.clone(),
            spec_path: util::display_relative(&spec, self.repo_root),
            notes: fixture.notes.clone(),
            paths,
            ratios,
            threshold_breaches: breaches,
            artifact_dir: util::display_relative(&fixture_dir, self.repo_root),
        })
    }

    /// Emit the fixture's IR (and its imports) once, untimed.
    /// Spec file for a fixture: the catalog path, or an inline template
    /// written to `<fixture_dir>/<id>.<spec_extension>`.
    fn materialize_spec(&self, fixture: &BenchFixture, fixture_dir: &Path) -> Result<PathBuf> {
        let Some(name) = &fixture.inline_template else {
            return Ok(util::absolutize(self.repo_root, &fixture.spec_path));
        };
        let text = templates::inline_template(name).ok_or_else(|| {
            ParityError::Config(format!("unknown inline template '{name}' for fixture {}", fixture.id))
        })?;
        let spec = fixture_dir.join(format!("{}.{}", fixture.id, self.spec_extension));
        fs::write(&spec, text).context_with(|| format!("writing {}", spec.display()))?;
        debug!(fixture = %fixture.id, template = %name, "materialized inline template");
        Ok(spec)
    }

    fn build_ir(&self, fixture: &BenchFixture, spec: &Path, fixture_dir: &Path) -> Result<PathBuf> {
        let ir = fixture_dir.join(format!("{}.{}", fixture.id, self.ir_extension));
        let ir_out = fixture_dir.join("ir_legacy_out");
        let logs = LogFiles::new(fixture_dir, "ir");
        let invocation = self.legacy.compile_from_spec(&SpecCompile {
            spec,
            target: &fixture.target,
            out_dir: &ir_out,
            emit_ir: Some(&ir),
            logs: &logs,
        })?;
        require_success(&invocation, &logs)?;
        imports::emit_import_tree(
            self.legacy,
            self.resolver,
            &ImportWalk {
                root_spec: spec,
                root_ir: &ir,
                target: &fixture.target,
                out_dir: &ir_out,
                log_dir: fixture_dir,
            },
        )?;
        Ok(ir)
    }

    fn measure<F>(&self, path_name: &str, fixture_dir: &Path, run: F) -> Result<Vec<BenchmarkRun>>
    where
        F: Fn(&Path, &LogFiles) -> Result<crate::model::Invocation>,
    {
        let total = self.warmup + self.iterations;
        let mut runs = Vec::with_capacity(total);
        for iteration in 0..total {
            let iter_dir = fixture_dir.join(path_name).join(format!("iter_{iteration}"));
            let logs = LogFiles::new(fixture_dir, &format!("{path_name}.iter_{iteration}"));
            let invocation = run(&iter_dir, &logs)?;
            require_success(&invocation, &logs)?;

            let phase = if iteration < self.warmup {
                Phase::Warmup
            } else {
                Phase::Measured
            };
            debug!(
                path = path_name,
                iteration,
                ?phase,
                elapsed_ms = invocation.elapsed.as_millis(),
                rss_kb = ?invocation.peak_rss_kb,
                "iteration complete"
            );
            runs.push(BenchmarkRun {
                iteration,
                phase,
                elapsed_sec: invocation.elapsed.as_secs_f64(),
                max_rss_kb: invocation.peak_rss_kb,
            });
        }
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(iteration: usize, phase: Phase, elapsed_sec: f64, rss: u64) -> BenchmarkRun {
        BenchmarkRun {
            iteration,
            phase,
            elapsed_sec,
            max_rss_kb: Some(rss),
        }
    }

    fn path(latencies: &[f64], rss: u64) -> PathReport {
        PathReport::from_runs(
            latencies
                .iter()
                .enumerate()
                .map(|(i, l)| run(i, Phase::Measured, *l, rss))
                .collect(),
        )
    }

    #[test]
    fn cv_is_zero_for_single_or_constant_samples() {
        assert!(coefficient_of_variation(&[]).abs() < f64::EPSILON);
        assert!(coefficient_of_variation(&[3.0]).abs() < f64::EPSILON);
        assert!(coefficient_of_variation(&[2.5, 2.5, 2.5]).abs() < f64::EPSILON);
        assert!(coefficient_of_variation(&[0.0, 0.0]).abs() < f64::EPSILON);
    }

    #[test]
    fn cv_uses_population_deviation() {
        // mean 2, population variance 1
        let cv = coefficient_of_variation(&[1.0, 3.0]);
        assert!((cv - 0.5).abs() < 1e-12);
    }

    #[test]
    fn sample_stats_median_handles_even_counts() {
        let stats = SampleStats::from_samples(&[4.0, 1.0, 3.0, 2.0]);
        assert!((stats.median - 2.5).abs() < f64::EPSILON);
        assert!((stats.mean - 2.5).abs() < f64::EPSILON);
        assert!((stats.min - 1.0).abs() < f64::EPSILON);
        assert!((stats.max - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_ignores_warmup() {
        let runs = vec![
            run(0, Phase::Warmup, 100.0, 999),
            run(1, Phase::Measured, 1.0, 10),
            run(2, Phase::Measured, 1.0, 10),
        ];
        let summary = BenchmarkSummary::from_runs(&runs);
        assert_eq!(summary.iterations, 2);
        assert!((summary.latency_sec.max - 1.0).abs() < f64::EPSILON);
        assert!((summary.max_rss_kb.median - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_denominator_ratio_is_null_and_never_breaches() {
        assert_eq!(ratio(1.0, 0.0), None);
        let paths = EnginePaths {
            legacy: path(&[1.0, 1.0], 0),
            migrated: path(&[5.0, 5.0], 100),
        };
        let ratios = Ratios::from_paths(&paths);
        assert_eq!(ratios.memory_median_ratio, None);
        let breaches = threshold_breaches(&paths, &ratios, &Thresholds::default());
        assert_eq!(breaches, ["latency_ratio"]);
        let json = serde_json::to_value(ratios).unwrap();
        assert!(json["memory_median_ratio"].is_null());
    }

    #[test]
    fn breaches_are_independent() {
        let paths = EnginePaths {
            legacy: path(&[1.0, 1.0, 1.0], 100),
            migrated: path(&[1.0, 5.0, 9.0], 300),
        };
        let ratios = Ratios::from_paths(&paths);
        let breaches = threshold_breaches(&paths, &ratios, &Thresholds::default());
        assert_eq!(
            breaches,
            ["latency_ratio", "memory_ratio", "stability_cv:migrated"]
        );
    }

    fn fixture_bench(breaches: Vec<String>) -> FixtureBench {
        let paths = EnginePaths {
            legacy: path(&[1.0], 100),
            migrated: path(&[1.5], 120),
        };
        FixtureBench {
            id: "hello".to_string(),
            category: "small".to_string(),
            target: "cpp_stl".to_string(),
            spec_path: "tests/formats/hello_world.ksy".to_string(),
            notes: String::new(),
            ratios: Ratios::from_paths(&paths),
            paths,
            threshold_breaches: breaches,
            artifact_dir: "tests/test_out/migration_benchmarks/hello".to_string(),
        }
    }

    #[test]
    fn status_warns_only_with_breaches() {
        let report = BenchReport::new("mparity bench", Thresholds::default(), vec![fixture_bench(vec![])]);
        assert_eq!(report.summary.status, BenchStatus::Pass);
        assert_eq!(report.exit_code(true), 0);

        let report = BenchReport::new(
            "mparity bench",
            Thresholds::default(),
            vec![fixture_bench(vec!["latency_ratio".to_string()]), fixture_bench(vec![])],
        );
        assert_eq!(report.summary.status, BenchStatus::Warn);
        assert_eq!(report.summary.threshold_breaches, 1);
        assert_eq!(report.exit_code(false), 0);
        assert_eq!(report.exit_code(true), 1);
        let text = report.render_summary();
        assert!(text.contains("status: warn\n"));
        assert!(text.contains("  latency ratio migrated/legacy median: 1.500\n"));
        assert!(text.contains("  breaches: latency_ratio\n"));
    }

    #[test]
    fn generated_report_passes_validation() {
        let report = BenchReport::new("mparity bench", Thresholds::default(), vec![fixture_bench(vec![])]);
        let value = serde_json::to_value(&report).unwrap();
        assert!(validate_report(&value).is_empty(), "{:?}", validate_report(&value));
    }

    #[test]
    fn validation_reports_each_problem() {
        let value = serde_json::json!({
            "schema_version": 2,
            "tool": "x",
            "fixtures": [
                {"id": "a"},
                {"id": "b", "paths": {"legacy": {"runs": []}}}
            ],
            "summary": {}
        });
        let errors = validate_report(&value);
        assert_eq!(
            errors,
            [
                "schema_version must be 1",
                "missing top-level key: generated_at",
                "missing top-level key: thresholds",
                "fixture missing paths: a",
                "fixture b path legacy missing runs/summary",
                "fixture b missing migrated",
            ]
        );
    }

    #[test]
    fn non_list_fixtures_stop_validation() {
        let value = serde_json::json!({
            "schema_version": 1, "tool": "x", "generated_at": "now",
            "fixtures": {}, "summary": {}, "thresholds": {}
        });
        assert_eq!(validate_report(&value), ["fixtures must be a list"]);
    }
}
