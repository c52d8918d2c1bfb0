//! Fixtures command implementation.

use super::CommandContext;
use crate::catalog;
use crate::cli::FixturesArgs;
use crate::config;
use crate::error::Result;
use crate::util;

/// Execute the fixtures command: load a catalog and list it.
///
/// # Errors
///
/// Returns a configuration error for any malformed row.
pub fn execute(args: &FixturesArgs, ctx: &CommandContext) -> Result<i32> {
    let config = config::load_config(ctx.config_path.as_deref(), &ctx.overrides)?;
    let default_table = if args.bench {
        &config.bench.fixtures
    } else {
        &config.diff.fixtures
    };
    let table = args.fixtures.as_ref().map_or_else(
        || default_table.clone(),
        |path| util::absolutize(&config.repo_root, path),
    );

    if args.bench {
        let fixtures = catalog::load_bench_fixtures(&table)?;
        if ctx.json {
            println!("{}", serde_json::to_string_pretty(&fixtures)?);
        } else if !ctx.quiet {
            for fixture in &fixtures {
                println!(
                    "{}\t{}\t{}\t{}",
                    fixture.id,
                    fixture.category,
                    fixture.target,
                    fixture.spec_path.display()
                );
            }
            println!("{} benchmark fixtures", fixtures.len());
        }
        return Ok(0);
    }

    let fixtures = catalog::load_fixtures(&table)?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&fixtures)?);
    } else if !ctx.quiet {
        for fixture in &fixtures {
            println!(
                "{}\t{}\t{}\t{}\t{}",
                fixture.id, fixture.mode, fixture.target, fixture.parity_criteria, fixture.gate
            );
        }
        let required = fixtures
            .iter()
            .filter(|f| f.gate == crate::model::Gate::Required)
            .count();
        println!("{} fixtures ({required} required)", fixtures.len());
    }
    Ok(0)
}
