//! CLI definitions and entry point.

use crate::config::CliOverrides;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Differential parity and benchmark harness for compiler engine migrations
#[derive(Parser, Debug)]
#[command(name = "mparity", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: <repo-root>/parity.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Repository root that fixture paths are relative to (default: cwd)
    #[arg(long, global = true, env = "MPARITY_REPO_ROOT")]
    pub repo_root: Option<PathBuf>,

    /// Output as JSON (listings, errors and logs)
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the differential harness over the fixture catalog
    Diff(DiffArgs),

    /// Benchmark legacy vs migrated latency and memory
    Bench(BenchArgs),

    /// Validate an existing benchmark report
    BenchCheck(BenchCheckArgs),

    /// Normalize one aggregated compiler output file
    Normalize(NormalizeArgs),

    /// Load and list a fixture catalog
    Fixtures(FixturesArgs),

    /// Show version information
    Version,
}

/// Engine selection shared by `diff` and `bench`.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Legacy engine executable
    #[arg(long)]
    pub legacy_bin: Option<PathBuf>,

    /// Migrated engine executable
    #[arg(long)]
    pub migrated_bin: Option<PathBuf>,

    /// Kill an engine invocation after this many seconds (0 = no limit)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl EngineArgs {
    pub fn apply(&self, overrides: &mut CliOverrides) {
        overrides.set_path("legacy.bin", self.legacy_bin.as_deref());
        overrides.set_path("migrated.bin", self.migrated_bin.as_deref());
        overrides.set_opt("invocation-timeout-secs", self.timeout_secs);
    }
}

/// Which failures fail the process.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforceGate {
    /// Never fail on parity outcomes
    None,
    /// Fail on mismatches/errors of required fixtures
    Required,
    /// Fail on any mismatch/error
    All,
}

impl EnforceGate {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Required => "required",
            Self::All => "all",
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct DiffArgs {
    /// Differential fixture table (TSV)
    #[arg(long)]
    pub fixtures: Option<PathBuf>,

    /// Output directory (deleted and recreated)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum unified diff lines kept per fixture
    #[arg(long)]
    pub max_diff_lines: Option<usize>,

    /// Failure enforcement policy
    #[arg(long, value_enum)]
    pub enforce_gate: Option<EnforceGate>,

    /// Always exit 0 once the report is written
    #[arg(long)]
    pub informational: bool,

    #[command(flatten)]
    pub engines: EngineArgs,
}

impl DiffArgs {
    pub fn apply(&self, overrides: &mut CliOverrides) {
        overrides.set_path("diff.fixtures", self.fixtures.as_deref());
        overrides.set_path("diff.output-dir", self.output_dir.as_deref());
        overrides.set_opt("diff.max-diff-lines", self.max_diff_lines);
        overrides.set_opt("diff.enforce-gate", self.enforce_gate.map(EnforceGate::as_str));
        self.engines.apply(overrides);
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct BenchArgs {
    /// Benchmark fixture table (TSV)
    #[arg(long)]
    pub fixtures: Option<PathBuf>,

    /// Output directory (deleted and recreated)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Measured iterations per engine path
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Discarded warmup iterations per engine path
    #[arg(long)]
    pub warmup: Option<usize>,

    /// Latency ratio ceiling (migrated / legacy median)
    #[arg(long)]
    pub latency_ratio_max: Option<f64>,

    /// Memory ratio ceiling (migrated / legacy median)
    #[arg(long)]
    pub memory_ratio_max: Option<f64>,

    /// Per-engine latency coefficient of variation ceiling
    #[arg(long)]
    pub stability_cv_max: Option<f64>,

    /// Exit 1 when any threshold is breached
    #[arg(long)]
    pub fail_on_warn: bool,

    /// GNU time executable used for peak RSS
    #[arg(long)]
    pub time_bin: Option<PathBuf>,

    #[command(flatten)]
    pub engines: EngineArgs,
}

impl BenchArgs {
    pub fn apply(&self, overrides: &mut CliOverrides) {
        overrides.set_path("bench.fixtures", self.fixtures.as_deref());
        overrides.set_path("bench.output-dir", self.output_dir.as_deref());
        overrides.set_opt("bench.iterations", self.iterations);
        overrides.set_opt("bench.warmup", self.warmup);
        overrides.set_opt("bench.latency-ratio-max", self.latency_ratio_max);
        overrides.set_opt("bench.memory-ratio-max", self.memory_ratio_max);
        overrides.set_opt("bench.stability-cv-max", self.stability_cv_max);
        overrides.set_path("time-bin", self.time_bin.as_deref());
        self.engines.apply(overrides);
    }
}

#[derive(Args, Debug, Clone)]
pub struct BenchCheckArgs {
    /// Benchmark report to validate
    pub report: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    /// Aggregated raw output
    pub input: PathBuf,

    /// Where to write the normalized text
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FixturesArgs {
    /// Fixture table to load (default: the configured catalog)
    #[arg(long)]
    pub fixtures: Option<PathBuf>,

    /// Treat the table as a benchmark catalog
    #[arg(long)]
    pub bench: bool,
}
