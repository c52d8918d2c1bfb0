//! Version command implementation.

use super::CommandContext;
use crate::error::Result;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput<'a> {
    version: &'a str,
    build: &'a str,
}

/// Execute the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(ctx: &CommandContext) -> Result<i32> {
    let version = env!("CARGO_PKG_VERSION");
    let build = if cfg!(debug_assertions) {
        "dev"
    } else {
        "release"
    };

    if ctx.json {
        println!("{}", serde_json::to_string(&VersionOutput { version, build })?);
    } else {
        println!("mparity version {version} ({build})");
    }
    Ok(0)
}
