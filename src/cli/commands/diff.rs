//! Diff command implementation.

use super::CommandContext;
use crate::catalog;
use crate::cli::DiffArgs;
use crate::config;
use crate::engine::imports::ImportResolver;
use crate::error::Result;
use crate::runner::DifferentialRunner;
use crate::util::{self, progress};
use tracing::info;

/// Execute the diff command.
///
/// # Errors
///
/// Returns an error if configuration or the catalog is invalid, an engine
/// is missing, or the report cannot be written.
pub fn execute(args: &DiffArgs, ctx: &CommandContext) -> Result<i32> {
    let mut overrides = ctx.overrides.clone();
    args.apply(&mut overrides);
    let config = config::load_config(ctx.config_path.as_deref(), &overrides)?;

    let fixtures = catalog::load_fixtures(&config.diff.fixtures)?;
    let legacy = config.legacy_engine();
    let migrated = config.migrated_engine();
    let resolver = ImportResolver::new(
        config.import_dirs.clone(),
        &config.spec_extension,
        &config.ir_extension,
    );
    let runner = DifferentialRunner {
        legacy: &legacy,
        migrated: &migrated,
        resolver: &resolver,
        repo_root: &config.repo_root,
        output_dir: &config.diff.output_dir,
        ir_extension: &config.ir_extension,
        max_diff_lines: config.diff.max_diff_lines,
        migrated_targets: &config.migrated_targets,
    };

    let pb = progress::create_progress_bar(fixtures.len() as u64, "fixtures", ctx.show_progress());
    let report = runner.run(&fixtures, |result| {
        pb.set_message(format!("{} {}", result.id, result.status));
        pb.inc(1);
    })?;
    pb.finish_and_clear();

    let (report_path, summary_path) = report.write(&config.diff.output_dir)?;
    info!(
        report = %util::display_relative(&report_path, &config.repo_root),
        summary = %util::display_relative(&summary_path, &config.repo_root),
        "wrote differential report"
    );

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !ctx.quiet {
        print!("{}", report.render_summary());
    }

    Ok(report.exit_code(config.diff.enforcement, args.informational))
}
