//! Subcommand implementations.
//!
//! Each command returns the process exit code it wants on success; errors
//! are turned into exit codes by `main`.

pub mod bench;
pub mod bench_check;
pub mod diff;
pub mod fixtures;
pub mod normalize;
pub mod version;

use crate::config::CliOverrides;
use std::path::PathBuf;

/// Global flags every command sees.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub overrides: CliOverrides,
    pub config_path: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

impl CommandContext {
    /// Progress bars are drawn only for interactive, non-quiet, non-JSON runs.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json && crate::util::progress::should_show_progress()
    }
}
