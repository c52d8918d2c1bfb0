//! Shared utilities for `migration_parity`.
//!
//! - Path handling relative to the repository root
//! - Output directory lifecycle
//! - Progress indicators (for long fixture runs)

pub mod progress;

use crate::error::{ParityError, Result, ResultExt};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// `path` if absolute, else `root/path`.
#[must_use]
pub fn absolutize(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Render `path` relative to `root` with `/` separators.
///
/// Paths outside `root` are rendered as given.
#[must_use]
pub fn display_relative(path: &Path, root: &Path) -> String {
    let shown = path.strip_prefix(root).unwrap_or(path);
    shown.to_string_lossy().replace('\\', "/")
}

/// Remove and recreate an output directory.
///
/// Refuses to touch the repository root or any of its ancestors.
///
/// # Errors
///
/// Returns a configuration error for an unsafe target, or an I/O error if
/// the directory cannot be removed or created.
pub fn reset_output_dir(dir: &Path, repo_root: &Path) -> Result<()> {
    let resolved = lexical_normalize(&absolutize(repo_root, dir));
    let resolved = fs::canonicalize(&resolved).unwrap_or(resolved);
    if repo_root.starts_with(&resolved) {
        return Err(ParityError::config(format!(
            "refusing to reset output directory {}: it contains the repository root",
            resolved.display()
        )));
    }

    if resolved.exists() {
        fs::remove_dir_all(&resolved)
            .context_with(|| format!("removing {}", resolved.display()))?;
    }
    fs::create_dir_all(&resolved).context_with(|| format!("creating {}", resolved.display()))?;
    Ok(())
}

/// Resolve `.` and `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
