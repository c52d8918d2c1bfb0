//! Output normalization.
//!
//! Turns an engine's generated source tree into one canonical text blob so
//! that parity is plain string equality. All environment-dependent noise
//! (line endings, checkout location, timestamps, generator banners, the
//! legacy-only runtime include, blank-line runs) is absorbed here and
//! nowhere else.
//!
//! `normalize(normalize(x)) == normalize(x)` holds for every input.

use crate::error::{Result, ResultExt};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use walkdir::WalkDir;

/// Extensions of generated files that take part in comparison.
pub const GENERATED_EXTENSIONS: &[&str] = &["py", "rb", "lua", "h", "cpp"];

pub const REPO_ROOT_PLACEHOLDER: &str = "<REPO_ROOT>";
pub const TIMESTAMP_PLACEHOLDER: &str = "<TIMESTAMP>";

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?(?:Z|[+-][0-9]{2}:?[0-9]{2})?\b",
    )
    .expect("timestamp regex")
});

/// Generator banners in each comment syntax, with their replacement line.
static BANNER_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?m)^[ \t]*#[ \t]*This is a generated file!.*$", "# <GENERATED_BANNER>"),
        (r"(?m)^[ \t]*//[ \t]*This is a generated file!.*$", "// <GENERATED_BANNER>"),
        (r"(?m)^[ \t]*/\*[ \t]*This is a generated file!.*$", "/* <GENERATED_BANNER>"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("banner regex"), replacement))
    .collect()
});

/// The migrated engine never emits this include; the legacy engine always does.
static LEGACY_INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*#include[ \t]+<kaitai/exceptions\.h>[ \t]*(?:\n|$)")
        .expect("include regex")
});

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank run regex"));

/// Canonicalizes generated text relative to one repository root.
#[derive(Debug, Clone)]
pub struct Normalizer {
    repo_root: String,
}

impl Normalizer {
    #[must_use]
    pub fn new(repo_root: &Path) -> Self {
        Self {
            repo_root: repo_root.to_string_lossy().into_owned(),
        }
    }

    /// Apply every canonicalization step, in order.
    #[must_use]
    pub fn normalize(&self, text: &str) -> String {
        let mut text = text.replace("\r\n", "\n").replace('\r', "\n");

        if !self.repo_root.is_empty() {
            text = text.replace(&self.repo_root, REPO_ROOT_PLACEHOLDER);
        }

        text = TIMESTAMP_RE
            .replace_all(&text, TIMESTAMP_PLACEHOLDER)
            .into_owned();

        for (re, replacement) in BANNER_RES.iter() {
            text = re.replace_all(&text, *replacement).into_owned();
        }

        text = LEGACY_INCLUDE_RE.replace_all(&text, "").into_owned();
        text = BLANK_RUN_RE.replace_all(&text, "\n\n").into_owned();

        let mut out = text.trim_end().to_string();
        out.push('\n');
        out
    }

    /// Normalize one file into another, creating the output's parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or the output cannot be written.
    pub fn normalize_file(&self, input: &Path, output: &Path) -> Result<()> {
        let raw = fs::read_to_string(input).context_with(|| format!("reading {}", input.display()))?;
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, self.normalize(&raw))
            .context_with(|| format!("writing {}", output.display()))?;
        Ok(())
    }
}

/// Concatenate every generated file under `out_dir` into one ordered blob.
///
/// Files are sorted by their `/`-separated relative path. Each file is
/// preceded by a `--- FILE:<fixture>:<path>` marker line.
///
/// # Errors
///
/// Returns an error if the directory cannot be walked or a file cannot be read.
pub fn aggregate_tree(out_dir: &Path, fixture_id: &str) -> Result<String> {
    let mut files = Vec::new();
    if out_dir.exists() {
        for entry in WalkDir::new(out_dir) {
            let entry = entry.context_with(|| format!("walking {}", out_dir.display()))?;
            if !entry.file_type().is_file() || !is_generated_source(entry.path()) {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(out_dir)
                .unwrap_or_else(|_| entry.path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            files.push((rel, entry.path().to_path_buf()));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut blob = format!("id={fixture_id}\nmode=success\n");
    for (rel, path) in files {
        let bytes = fs::read(&path).context_with(|| format!("reading {}", path.display()))?;
        let _ = writeln!(blob, "--- FILE:{fixture_id}:{rel}");
        blob.push_str(&String::from_utf8_lossy(&bytes));
        blob.push('\n');
    }
    Ok(blob)
}

/// Hex SHA-256 of a normalized blob.
#[must_use]
pub fn digest(text: &str) -> String {
    let hash = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in hash {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn is_generated_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| GENERATED_EXTENSIONS.contains(&ext))
}
