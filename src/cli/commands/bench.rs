//! Bench command implementation.

use super::CommandContext;
use crate::bench::{BenchReport, BenchRunner};
use crate::catalog;
use crate::cli::BenchArgs;
use crate::config;
use crate::engine::CompilerEngine;
use crate::engine::imports::ImportResolver;
use crate::error::Result;
use crate::util::{self, progress};
use tracing::info;

/// Execute the bench command.
///
/// # Errors
///
/// Returns an error if configuration is invalid, a tool is missing, any
/// benchmark invocation fails, or the report fails schema validation.
pub fn execute(args: &BenchArgs, ctx: &CommandContext) -> Result<i32> {
    let mut overrides = ctx.overrides.clone();
    args.apply(&mut overrides);
    let config = config::load_config(ctx.config_path.as_deref(), &overrides)?;

    let fixtures = catalog::load_bench_fixtures(&config.bench.fixtures)?;
    let legacy = config.legacy_engine().with_time_wrapper(&config.time_bin);
    let migrated = config.migrated_engine().with_time_wrapper(&config.time_bin);
    legacy.ensure_available()?;
    migrated.ensure_available()?;
    util::reset_output_dir(&config.bench.output_dir, &config.repo_root)?;

    let resolver = ImportResolver::new(
        config.import_dirs.clone(),
        &config.spec_extension,
        &config.ir_extension,
    );
    let runner = BenchRunner {
        legacy: &legacy,
        migrated: &migrated,
        resolver: &resolver,
        repo_root: &config.repo_root,
        ir_extension: &config.ir_extension,
        spec_extension: &config.spec_extension,
        iterations: config.bench.iterations,
        warmup: config.bench.warmup,
        thresholds: config.bench.thresholds,
    };

    let pb = progress::create_progress_bar(fixtures.len() as u64, "benchmarks", ctx.show_progress());
    let mut results = Vec::with_capacity(fixtures.len());
    for fixture in &fixtures {
        pb.set_message(fixture.id.clone());
        results.push(runner.run_fixture(fixture, &config.bench.output_dir)?);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let report = BenchReport::new(
        format!("{} bench", env!("CARGO_PKG_NAME")),
        config.bench.thresholds,
        results,
    );
    let (report_path, _) = report.write(&config.bench.output_dir)?;
    info!(
        report = %util::display_relative(&report_path, &config.repo_root),
        status = %report.summary.status,
        "wrote benchmark report"
    );

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !ctx.quiet {
        print!("{}", report.render_summary());
    }

    Ok(report.exit_code(args.fail_on_warn))
}
