//! In-memory `CompilerEngine` for integration tests.
//!
//! Behavior is chosen by the stem of the input file (the spec for spec
//! compiles, the IR for IR compiles), falling back to a default.

use super::file_stem;
use migration_parity::Result;
use migration_parity::engine::{CompilerEngine, IrCompile, LogFiles, SpecCompile};
use migration_parity::model::Invocation;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct FakeOutput {
    pub files: Vec<(String, String)>,
    pub exit_code: i32,
    pub stderr: String,
    /// Import names written into an emitted IR.
    pub imports: Vec<String>,
    pub elapsed: Duration,
    pub peak_rss_kb: Option<u64>,
}

impl FakeOutput {
    pub fn generated(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(name, body)| ((*name).to_string(), (*body).to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failure(stderr: &str) -> Self {
        Self {
            exit_code: 1,
            stderr: stderr.to_string(),
            ..Self::default()
        }
    }

    pub fn with_imports(mut self, imports: &[&str]) -> Self {
        self.imports = imports.iter().map(ToString::to_string).collect();
        self
    }

    pub fn with_metrics(mut self, elapsed_ms: u64, rss_kb: u64) -> Self {
        self.elapsed = Duration::from_millis(elapsed_ms);
        self.peak_rss_kb = Some(rss_kb);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Spec,
    Ir,
}

#[derive(Debug, Clone)]
pub struct FakeCall {
    pub kind: CallKind,
    pub input: PathBuf,
    pub target: String,
    pub out_dir: PathBuf,
    pub emit_ir: Option<PathBuf>,
}

pub struct FakeEngine {
    name: String,
    default: FakeOutput,
    by_stem: HashMap<String, FakeOutput>,
    calls: RefCell<Vec<FakeCall>>,
}

impl FakeEngine {
    pub fn new(name: &str, default: FakeOutput) -> Self {
        Self {
            name: name.to_string(),
            default,
            by_stem: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn on(mut self, stem: &str, output: FakeOutput) -> Self {
        self.by_stem.insert(stem.to_string(), output);
        self
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.borrow().clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> usize {
        self.calls.borrow().iter().filter(|c| c.kind == kind).count()
    }

    fn respond(&self, call: FakeCall, logs: &LogFiles) -> Result<Invocation> {
        let output = self
            .by_stem
            .get(&file_stem(&call.input))
            .unwrap_or(&self.default)
            .clone();

        fs::create_dir_all(&call.out_dir)?;
        for (name, body) in &output.files {
            let path = call.out_dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, body)?;
        }
        if let Some(ir) = call.emit_ir.as_ref().filter(|_| output.exit_code == 0) {
            let mut text = format!("meta {}\n", file_stem(&call.input));
            for import in &output.imports {
                text.push_str(&format!("import \"{import}\"\n"));
            }
            fs::write(ir, text)?;
        }
        write_log(&logs.stdout, "")?;
        write_log(&logs.stderr, &output.stderr)?;

        let invocation = Invocation {
            command: vec![
                self.name.clone(),
                format!("{:?}", call.kind).to_lowercase(),
                call.input.display().to_string(),
            ],
            exit_code: Some(output.exit_code),
            stdout: String::new(),
            stderr: output.stderr.clone(),
            artifact_dir: call.out_dir.clone(),
            elapsed: output.elapsed,
            peak_rss_kb: output.peak_rss_kb,
            timed_out: false,
        };
        self.calls.borrow_mut().push(call);
        Ok(invocation)
    }
}

fn write_log(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}

impl CompilerEngine for FakeEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn compile_from_spec(&self, request: &SpecCompile<'_>) -> Result<Invocation> {
        self.respond(
            FakeCall {
                kind: CallKind::Spec,
                input: request.spec.to_path_buf(),
                target: request.target.to_string(),
                out_dir: request.out_dir.to_path_buf(),
                emit_ir: request.emit_ir.map(Path::to_path_buf),
            },
            request.logs,
        )
    }

    fn compile_from_ir(&self, request: &IrCompile<'_>) -> Result<Invocation> {
        self.respond(
            FakeCall {
                kind: CallKind::Ir,
                input: request.ir.to_path_buf(),
                target: request.target.to_string(),
                out_dir: request.out_dir.to_path_buf(),
                emit_ir: None,
            },
            request.logs,
        )
    }
}
