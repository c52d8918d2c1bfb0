//! Compiler engine invocation.
//!
//! Both engines are black-box processes behind the [`CompilerEngine`] trait.
//! [`ProcessEngine`] speaks the command-line contract:
//!
//! ```text
//! <bin> <prefix…> -t <target> [modifier…] [--emit-ir <ir>] -d <out> <spec>
//! <bin> <prefix…> --from-ir <ir> -t <target> [modifier…] -d <out>
//! ```
//!
//! stdout and stderr go straight to per-invocation log files, so every run
//! leaves evidence on disk whatever its outcome.

pub mod imports;

use crate::error::{ParityError, Result, ResultExt};
use crate::model::Invocation;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const MAX_RSS_PREFIX: &str = "Maximum resident set size (kbytes):";

/// Where one invocation's captured output lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFiles {
    pub stdout: PathBuf,
    pub stderr: PathBuf,
    /// `time -v` report, written only for instrumented runs.
    pub metrics: PathBuf,
}

impl LogFiles {
    /// `<dir>/<label>.stdout.log`, `<dir>/<label>.stderr.log`, `<dir>/<label>.time.log`.
    #[must_use]
    pub fn new(dir: &Path, label: &str) -> Self {
        Self {
            stdout: dir.join(format!("{label}.stdout.log")),
            stderr: dir.join(format!("{label}.stderr.log")),
            metrics: dir.join(format!("{label}.time.log")),
        }
    }
}

/// Compile a format specification directly.
#[derive(Debug, Clone, Copy)]
pub struct SpecCompile<'a> {
    pub spec: &'a Path,
    pub target: &'a str,
    pub out_dir: &'a Path,
    /// Also write the intermediate representation here.
    pub emit_ir: Option<&'a Path>,
    pub logs: &'a LogFiles,
}

/// Compile from a previously emitted IR artifact.
#[derive(Debug, Clone, Copy)]
pub struct IrCompile<'a> {
    pub ir: &'a Path,
    pub target: &'a str,
    pub out_dir: &'a Path,
    pub logs: &'a LogFiles,
}

/// A compiler implementation under test.
///
/// `Err` is reserved for failures to run at all (spawn errors, unwritable
/// log files). A process that ran and exited non-zero is an `Ok` invocation;
/// whether that exit was expected is the caller's call.
pub trait CompilerEngine {
    /// Short name used in logs and artifact labels.
    fn name(&self) -> &str;

    /// Verify the engine can be run at all. Checked once before a run starts.
    ///
    /// # Errors
    ///
    /// Returns `ParityError::ToolMissing` when a required binary is absent.
    fn ensure_available(&self) -> Result<()> {
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the engine could not be started.
    fn compile_from_spec(&self, request: &SpecCompile<'_>) -> Result<Invocation>;

    /// # Errors
    ///
    /// Returns an error if the engine could not be started.
    fn compile_from_ir(&self, request: &IrCompile<'_>) -> Result<Invocation>;
}

/// Extra flags appended for a target family, e.g. `cpp_stl` → `--cpp-standard 17`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetModifiers(BTreeMap<String, Vec<String>>);

impl TargetModifiers {
    #[must_use]
    pub const fn new(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }

    #[must_use]
    pub fn for_target(&self, target: &str) -> &[String] {
        self.0.get(target).map_or(&[], Vec::as_slice)
    }

    pub fn set(&mut self, target: impl Into<String>, flags: Vec<String>) {
        self.0.insert(target.into(), flags);
    }
}

impl Default for TargetModifiers {
    fn default() -> Self {
        let mut map = BTreeMap::new();
        map.insert(
            "cpp_stl".to_string(),
            vec!["--cpp-standard".to_string(), "17".to_string()],
        );
        Self(map)
    }
}

/// Subprocess-backed engine.
#[derive(Debug)]
pub struct ProcessEngine {
    name: String,
    bin: PathBuf,
    prefix_args: Vec<String>,
    modifiers: TargetModifiers,
    working_dir: PathBuf,
    timeout: Option<Duration>,
    time_bin: Option<PathBuf>,
    install_hint: String,
    verified: OnceLock<()>,
}

impl ProcessEngine {
    #[must_use]
    pub fn new(name: impl Into<String>, bin: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            bin: resolve_executable(bin.into()),
            prefix_args: Vec::new(),
            modifiers: TargetModifiers::default(),
            working_dir: working_dir.into(),
            timeout: None,
            time_bin: None,
            install_hint: String::new(),
            verified: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn with_prefix_args(mut self, args: Vec<String>) -> Self {
        self.prefix_args = args;
        self
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: TargetModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wrap every run in `<time_bin> -v -o <metrics>` to record peak RSS.
    #[must_use]
    pub fn with_time_wrapper(mut self, time_bin: impl Into<PathBuf>) -> Self {
        self.time_bin = Some(time_bin.into());
        self
    }

    #[must_use]
    pub fn with_install_hint(mut self, hint: impl Into<String>) -> Self {
        self.install_hint = hint.into();
        self
    }

    fn spec_args(&self, request: &SpecCompile<'_>) -> Vec<String> {
        let mut args = self.prefix_args.clone();
        args.extend(["-t".to_string(), request.target.to_string()]);
        args.extend(self.modifiers.for_target(request.target).iter().cloned());
        if let Some(ir) = request.emit_ir {
            args.extend(["--emit-ir".to_string(), path_arg(ir)]);
        }
        args.extend([
            "-d".to_string(),
            path_arg(request.out_dir),
            path_arg(request.spec),
        ]);
        args
    }

    fn ir_args(&self, request: &IrCompile<'_>) -> Vec<String> {
        let mut args = self.prefix_args.clone();
        args.extend([
            "--from-ir".to_string(),
            path_arg(request.ir),
            "-t".to_string(),
            request.target.to_string(),
        ]);
        args.extend(self.modifiers.for_target(request.target).iter().cloned());
        args.extend(["-d".to_string(), path_arg(request.out_dir)]);
        args
    }

    fn run(&self, args: Vec<String>, out_dir: &Path, logs: &LogFiles) -> Result<Invocation> {
        fs::create_dir_all(out_dir).context_with(|| format!("creating {}", out_dir.display()))?;
        for log in [&logs.stdout, &logs.stderr] {
            if let Some(parent) = log.parent() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut command_line = Vec::with_capacity(args.len() + 5);
        let mut cmd = if let Some(time_bin) = &self.time_bin {
            command_line.extend([
                path_arg(time_bin),
                "-v".to_string(),
                "-o".to_string(),
                path_arg(&logs.metrics),
            ]);
            let mut cmd = Command::new(time_bin);
            cmd.arg("-v").arg("-o").arg(&logs.metrics).arg(&self.bin);
            cmd
        } else {
            Command::new(&self.bin)
        };
        command_line.push(path_arg(&self.bin));
        command_line.extend(args.iter().cloned());

        let stdout = File::create(&logs.stdout)
            .context_with(|| format!("creating {}", logs.stdout.display()))?;
        let stderr = File::create(&logs.stderr)
            .context_with(|| format!("creating {}", logs.stderr.display()))?;
        cmd.args(&args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // own group, so a timeout also reaches the compiler under `time`
            if self.timeout.is_some() {
                cmd.process_group(0);
            }
        }

        debug!(engine = %self.name, command = %command_line.join(" "), "invoking engine");
        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|err| {
            ParityError::invocation(format!(
                "Failed to start {} engine ({}): {err}",
                self.name,
                self.bin.display()
            ))
        })?;
        let (status, timed_out) = self.wait(&mut child)?;
        let elapsed = started.elapsed();

        let peak_rss_kb = if self.time_bin.is_some() {
            fs::read_to_string(&logs.metrics)
                .ok()
                .and_then(|report| parse_max_rss_kb(&report))
        } else {
            None
        };

        let invocation = Invocation {
            command: command_line,
            exit_code: if timed_out { None } else { status.code() },
            stdout: read_log(&logs.stdout)?,
            stderr: read_log(&logs.stderr)?,
            artifact_dir: out_dir.to_path_buf(),
            elapsed,
            peak_rss_kb,
            timed_out,
        };
        trace!(
            engine = %self.name,
            exit = %invocation.exit_label(),
            elapsed_ms = elapsed.as_millis(),
            "engine finished"
        );
        Ok(invocation)
    }

    fn wait(&self, child: &mut Child) -> Result<(ExitStatus, bool)> {
        let Some(timeout) = self.timeout else {
            return Ok((child.wait()?, false));
        };

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok((status, false));
            }
            if started.elapsed() >= timeout {
                warn!(engine = %self.name, timeout_secs = timeout.as_secs(), "engine timed out; killing");
                kill_process_group(child);
                return Ok((child.wait()?, true));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl CompilerEngine for ProcessEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn ensure_available(&self) -> Result<()> {
        if self.verified.get().is_some() {
            return Ok(());
        }
        if !self.bin.exists() {
            return Err(ParityError::ToolMissing {
                tool: format!("{} engine", self.name),
                path: self.bin.clone(),
                hint: self.install_hint.clone(),
            });
        }
        // bare names are left to PATH lookup at spawn time
        let unreachable = |bin: &&PathBuf| bin.components().count() > 1 && !bin.exists();
        if let Some(time_bin) = self.time_bin.as_ref().filter(unreachable) {
            return Err(ParityError::ToolMissing {
                tool: "time".to_string(),
                path: time_bin.clone(),
                hint: "GNU time is required for memory metrics; set time-bin".to_string(),
            });
        }
        let _ = self.verified.set(());
        Ok(())
    }

    fn compile_from_spec(&self, request: &SpecCompile<'_>) -> Result<Invocation> {
        self.run(self.spec_args(request), request.out_dir, request.logs)
    }

    fn compile_from_ir(&self, request: &IrCompile<'_>) -> Result<Invocation> {
        self.run(self.ir_args(request), request.out_dir, request.logs)
    }
}

/// Fail unless the invocation exited zero.
///
/// # Errors
///
/// Returns an invocation error naming the command and its log files.
pub fn require_success(invocation: &Invocation, logs: &LogFiles) -> Result<()> {
    if invocation.succeeded() {
        return Ok(());
    }
    Err(ParityError::invocation(format!(
        "Command failed ({}): {}\nSee logs: {} and {}",
        invocation.exit_label(),
        invocation.command_line(),
        logs.stdout.display(),
        logs.stderr.display()
    )))
}

/// Peak RSS from a GNU `time -v` report.
#[must_use]
pub fn parse_max_rss_kb(report: &str) -> Option<u64> {
    report
        .lines()
        .find_map(|line| line.trim().strip_prefix(MAX_RSS_PREFIX))
        .and_then(|rest| rest.trim().parse::<u64>().ok())
}

/// Kill the child and everything it spawned. Timed-out children lead their
/// own process group on unix; elsewhere only the child itself is killed.
fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        let killed = Command::new("kill")
            .args(["-KILL", "--", &group])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success());
        if killed {
            return;
        }
        debug!(pid = child.id(), "process group kill failed; killing child only");
    }
    let _ = child.kill();
}

fn read_log(path: &Path) -> Result<String> {
    let bytes = fs::read(path).context_with(|| format!("reading {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// On Windows the engine launchers are `.exe` or `.bat` wrappers.
fn resolve_executable(path: PathBuf) -> PathBuf {
    if cfg!(windows) && !path.exists() {
        for ext in ["exe", "bat"] {
            let candidate = path.with_extension(ext);
            if candidate.exists() {
                return candidate;
            }
        }
    }
    path
}
