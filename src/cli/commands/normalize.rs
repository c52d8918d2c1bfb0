//! Normalize command implementation.

use super::CommandContext;
use crate::cli::NormalizeArgs;
use crate::config;
use crate::error::Result;
use crate::normalize::Normalizer;
use tracing::debug;

/// Execute the normalize command.
///
/// # Errors
///
/// Returns an error if the repo root cannot be resolved, the input cannot
/// be read, or the output cannot be written.
pub fn execute(args: &NormalizeArgs, ctx: &CommandContext) -> Result<i32> {
    let config = config::load_config(ctx.config_path.as_deref(), &ctx.overrides)?;
    Normalizer::new(&config.repo_root).normalize_file(&args.input, &args.output)?;
    debug!(input = %args.input.display(), output = %args.output.display(), "normalized");
    Ok(0)
}
