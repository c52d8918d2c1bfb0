//! Bench-check command implementation.

use super::CommandContext;
use crate::bench;
use crate::cli::BenchCheckArgs;
use crate::error::Result;
use serde::Serialize;

#[derive(Serialize)]
struct CheckOutput<'a> {
    report: String,
    valid: bool,
    errors: &'a [String],
}

/// Execute the bench-check command.
///
/// Prints one line per schema error and returns 1 when there are any.
///
/// # Errors
///
/// Returns an error if the report cannot be read or is not JSON.
pub fn execute(args: &BenchCheckArgs, ctx: &CommandContext) -> Result<i32> {
    let errors = bench::check_report_file(&args.report)?;

    if ctx.json {
        let output = CheckOutput {
            report: args.report.display().to_string(),
            valid: errors.is_empty(),
            errors: &errors,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if errors.is_empty() {
        if !ctx.quiet {
            println!("{}: valid", args.report.display());
        }
    } else {
        for error in &errors {
            println!("{error}");
        }
    }

    Ok(i32::from(!errors.is_empty()))
}
