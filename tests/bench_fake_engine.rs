//! Benchmark runs against in-memory engines with scripted metrics.

mod common;

use common::{CallKind, FakeEngine, FakeOutput, Workspace};
use migration_parity::bench::{self, BenchReport, BenchRunner, BenchStatus, Phase, Thresholds};
use migration_parity::engine::imports::ImportResolver;
use migration_parity::model::BenchFixture;
use std::path::PathBuf;

fn bench_fixture(id: &str) -> BenchFixture {
    BenchFixture {
        id: id.to_string(),
        category: "medium".to_string(),
        spec_path: PathBuf::from(format!("formats/{id}.ksy")),
        target: "cpp_stl".to_string(),
        notes: "nested types".to_string(),
        inline_template: None,
    }
}

fn runner<'a>(
    workspace: &'a Workspace,
    legacy: &'a FakeEngine,
    migrated: &'a FakeEngine,
    resolver: &'a ImportResolver,
) -> BenchRunner<'a> {
    BenchRunner {
        legacy,
        migrated,
        resolver,
        repo_root: &workspace.root,
        ir_extension: "ksir",
        spec_extension: "ksy",
        iterations: 3,
        warmup: 1,
        thresholds: Thresholds::default(),
    }
}

#[test]
fn runs_warmup_and_measured_iterations_per_path() {
    let _log = common::test_log("runs_warmup_and_measured_iterations_per_path");
    let workspace = Workspace::new();
    let legacy = FakeEngine::new(
        "legacy",
        FakeOutput::generated(&[("a.cpp", "int a;\n")]).with_metrics(100, 50_000),
    );
    let migrated = FakeEngine::new(
        "migrated",
        FakeOutput::generated(&[("a.cpp", "int a;\n")]).with_metrics(50, 40_000),
    );
    let resolver = ImportResolver::new(Vec::new(), "ksy", "ksir");
    let out = workspace.path("out/bench");

    let result = runner(&workspace, &legacy, &migrated, &resolver)
        .run_fixture(&bench_fixture("a"), &out)
        .expect("bench fixture");

    // one untimed IR build plus 1 warmup + 3 measured
    assert_eq!(legacy.calls_of(CallKind::Spec), 5);
    assert_eq!(migrated.calls_of(CallKind::Ir), 4);
    assert!(out.join("a/a.ksir").is_file());
    assert!(out.join("a/legacy/iter_0").is_dir());
    assert!(out.join("a/migrated/iter_3").is_dir());
    assert!(out.join("a/migrated.iter_3.stdout.log").is_file());

    let legacy_path = &result.paths.legacy;
    assert_eq!(legacy_path.runs.len(), 4);
    assert_eq!(legacy_path.runs[0].phase, Phase::Warmup);
    assert_eq!(legacy_path.summary.iterations, 3);
    assert!(legacy_path.summary.latency_sec.cv.abs() < f64::EPSILON);

    let latency = result.ratios.latency_median_ratio.expect("latency ratio");
    assert!((latency - 0.5).abs() < 1e-9);
    let memory = result.ratios.memory_median_ratio.expect("memory ratio");
    assert!((memory - 0.8).abs() < 1e-9);
    assert!(result.threshold_breaches.is_empty());
    assert_eq!(result.artifact_dir, "out/bench/a");
}

#[test]
fn slow_migrated_engine_breaches_and_warns() {
    let _log = common::test_log("slow_migrated_engine_breaches_and_warns");
    let workspace = Workspace::new();
    let legacy = FakeEngine::new("legacy", FakeOutput::generated(&[]).with_metrics(10, 1_000));
    let migrated = FakeEngine::new("migrated", FakeOutput::generated(&[]).with_metrics(50, 1_000));
    let resolver = ImportResolver::new(Vec::new(), "ksy", "ksir");
    let out = workspace.path("out/bench");

    let result = runner(&workspace, &legacy, &migrated, &resolver)
        .run_fixture(&bench_fixture("slow"), &out)
        .expect("bench fixture");
    assert_eq!(result.threshold_breaches, ["latency_ratio"]);

    let report = BenchReport::new("mparity bench", Thresholds::default(), vec![result]);
    assert_eq!(report.summary.status, BenchStatus::Warn);
    assert_eq!(report.exit_code(false), 0);

    let (report_path, summary_path) = report.write(&out).expect("write report");
    assert!(bench::check_report_file(&report_path).unwrap().is_empty());
    let summary = std::fs::read_to_string(summary_path).unwrap();
    assert!(summary.contains("- slow (medium):\n"));
    assert!(summary.contains("breaches: latency_ratio"));
}

#[test]
fn failing_iteration_aborts_the_benchmark() {
    let _log = common::test_log("failing_iteration_aborts_the_benchmark");
    let workspace = Workspace::new();
    let legacy = FakeEngine::new("legacy", FakeOutput::generated(&[]).with_metrics(10, 1_000));
    let migrated = FakeEngine::new("migrated", FakeOutput::failure("crash\n"));
    let resolver = ImportResolver::new(Vec::new(), "ksy", "ksir");

    let err = runner(&workspace, &legacy, &migrated, &resolver)
        .run_fixture(&bench_fixture("boom"), &workspace.path("out/bench"))
        .unwrap_err();
    assert!(err.to_string().starts_with("Command failed (1): migrated ir"));
}

#[test]
fn inline_template_is_written_into_the_fixture_dir() {
    let _log = common::test_log("inline_template_is_written_into_the_fixture_dir");
    let workspace = Workspace::new();
    let legacy = FakeEngine::new("legacy", FakeOutput::generated(&[]).with_metrics(10, 1_000));
    let migrated = FakeEngine::new("migrated", FakeOutput::generated(&[]).with_metrics(10, 1_000));
    let resolver = ImportResolver::new(Vec::new(), "ksy", "ksir");
    let out = workspace.path("out/bench");
    let fixture = BenchFixture {
        spec_path: PathBuf::from("inline:type_subset"),
        inline_template: Some("type_subset".to_string()),
        ..bench_fixture("types")
    };

    let result = runner(&workspace, &legacy, &migrated, &resolver)
        .run_fixture(&fixture, &out)
        .expect("bench fixture");

    let spec = out.join("types/types.ksy");
    let text = std::fs::read_to_string(&spec).expect("materialized spec");
    assert_eq!(Some(text.as_str()), bench::templates::inline_template("type_subset"));
    assert_eq!(result.spec_path, "out/bench/types/types.ksy");
    assert!(legacy.calls().iter().all(|call| call.input == spec));
}
