#![allow(dead_code)]

pub mod cli;
pub mod fake_engine;

pub use fake_engine::{CallKind, FakeEngine, FakeOutput};

use migration_parity::model::{Fixture, Gate, Mode, ParityCriteria};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Instant;
use tempfile::TempDir;
use tracing::info;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        migration_parity::logging::init_test_logging();
    });
}

pub struct TestLogGuard {
    name: String,
    start: Instant,
}

impl TestLogGuard {
    fn new(name: &str) -> Self {
        init_test_logging();
        info!("{name}: starting");
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for TestLogGuard {
    fn drop(&mut self) {
        info!(
            "{}: assertions passed (elapsed {:?})",
            self.name,
            self.start.elapsed()
        );
    }
}

pub fn test_log(name: &str) -> TestLogGuard {
    TestLogGuard::new(name)
}

/// A throwaway repository root.
pub struct Workspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = fs::canonicalize(temp_dir.path()).expect("canonical root");
        Self { temp_dir, root }
    }

    /// Write a file below the root, creating parents.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root.join(rel)).expect("read file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.root.join(rel).exists()
    }
}

pub fn fixture(id: &str, mode: Mode, criteria: ParityCriteria, target: &str, gate: Gate) -> Fixture {
    Fixture {
        id: id.to_string(),
        category: "integration".to_string(),
        mode,
        spec_path: PathBuf::from(format!("formats/{id}.ksy")),
        target: target.to_string(),
        parity_criteria: criteria,
        known_deviation: String::new(),
        gate,
    }
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
