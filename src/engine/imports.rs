//! Transitive IR import resolution.
//!
//! An IR artifact may contain `import "<name>"` lines. Each name is resolved
//! to a specification file and compiled by the legacy engine so that its IR
//! sits next to the root IR, where the migrated engine expects it. Traversal
//! is breadth-first over an explicit worklist; a seen-set keyed by IR path
//! makes cyclic import graphs terminate.

use super::{CompilerEngine, LogFiles, SpecCompile, require_success};
use crate::error::{Result, ResultExt};
use regex::Regex;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^import\s+"(.*)"$"#).expect("import regex"));

/// Import names listed in an IR document, in order of appearance.
#[must_use]
pub fn parse_ir_imports(ir_text: &str) -> Vec<String> {
    ir_text
        .lines()
        .filter_map(|line| IMPORT_RE.captures(line.trim()))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Maps import names to specification files.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    /// Shared search directories, tried after the importing spec's own directory.
    search_dirs: Vec<PathBuf>,
    spec_extension: String,
    ir_extension: String,
}

impl ImportResolver {
    #[must_use]
    pub fn new(search_dirs: Vec<PathBuf>, spec_extension: &str, ir_extension: &str) -> Self {
        Self {
            search_dirs,
            spec_extension: spec_extension.to_string(),
            ir_extension: ir_extension.to_string(),
        }
    }

    /// First existing candidate for `name`, searching `importing_dir` first.
    #[must_use]
    pub fn resolve(&self, name: &str, importing_dir: &Path) -> Option<PathBuf> {
        let mut relative = PathBuf::from(name);
        if relative.extension().and_then(|ext| ext.to_str()) != Some(self.spec_extension.as_str()) {
            relative.set_extension(&self.spec_extension);
        }

        std::iter::once(importing_dir)
            .chain(self.search_dirs.iter().map(PathBuf::as_path))
            .map(|dir| dir.join(&relative))
            .find(|candidate| candidate.is_file())
            .map(|found| fs::canonicalize(&found).unwrap_or(found))
    }

    /// IR artifact path for an imported spec, beside the root IR.
    fn ir_path_for(&self, spec: &Path, ir_dir: &Path) -> PathBuf {
        let stem = spec.file_stem().map_or_else(
            || "import".to_string(),
            |stem| stem.to_string_lossy().into_owned(),
        );
        ir_dir.join(format!("{stem}.{}", self.ir_extension))
    }
}

/// One import compiled while walking the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedImport {
    pub name: String,
    pub spec: PathBuf,
    pub ir: PathBuf,
}

/// Everything the import walk needs besides the engine.
#[derive(Debug, Clone, Copy)]
pub struct ImportWalk<'a> {
    pub root_spec: &'a Path,
    pub root_ir: &'a Path,
    pub target: &'a str,
    /// Output directory for the imports' generated sources.
    pub out_dir: &'a Path,
    /// Directory receiving `legacy.import.<stem>.*.log`.
    pub log_dir: &'a Path,
}

/// Emit IR for every transitive import of `walk.root_ir`.
///
/// # Errors
///
/// Returns an error if an IR file cannot be read, or if the engine fails on
/// an import. Imports that resolve to no file are skipped with a warning.
pub fn emit_import_tree(
    engine: &dyn CompilerEngine,
    resolver: &ImportResolver,
    walk: &ImportWalk<'_>,
) -> Result<Vec<EmittedImport>> {
    let ir_dir = walk.root_ir.parent().unwrap_or_else(|| Path::new("."));
    let mut queue = VecDeque::from([(walk.root_spec.to_path_buf(), walk.root_ir.to_path_buf())]);
    let mut seen: HashSet<PathBuf> = HashSet::from([walk.root_ir.to_path_buf()]);
    let mut emitted = Vec::new();

    while let Some((spec, ir)) = queue.pop_front() {
        let ir_text =
            fs::read_to_string(&ir).context_with(|| format!("reading IR {}", ir.display()))?;
        let spec_dir = spec.parent().unwrap_or_else(|| Path::new("."));

        for name in parse_ir_imports(&ir_text) {
            let Some(import_spec) = resolver.resolve(&name, spec_dir) else {
                warn!(import = %name, from = %spec.display(), "unresolved import; skipping");
                continue;
            };
            let import_ir = resolver.ir_path_for(&import_spec, ir_dir);
            if !seen.insert(import_ir.clone()) {
                continue;
            }

            let stem = import_ir
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let logs = LogFiles::new(walk.log_dir, &format!("{}.import.{stem}", engine.name()));
            debug!(import = %name, spec = %import_spec.display(), "emitting import IR");

            let invocation = engine.compile_from_spec(&SpecCompile {
                spec: &import_spec,
                target: walk.target,
                out_dir: walk.out_dir,
                emit_ir: Some(&import_ir),
                logs: &logs,
            })?;
            require_success(&invocation, &logs)?;

            emitted.push(EmittedImport {
                name,
                spec: import_spec.clone(),
                ir: import_ir.clone(),
            });
            queue.push_back((import_spec, import_ir));
        }
    }

    Ok(emitted)
}
