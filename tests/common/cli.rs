use super::Workspace;
use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct MparityRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl MparityRun {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// Run the binary with `--repo-root` pointing at the workspace and keep a
/// log of the run under `<root>/logs/<label>.log`.
pub fn run_mparity<I, S>(workspace: &Workspace, args: I, label: &str) -> MparityRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mparity"));
    cmd.current_dir(&workspace.root);
    cmd.arg("--repo-root").arg(&workspace.root);
    cmd.args(args);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "migration_parity=debug");
    cmd.env("RUST_BACKTRACE", "1");
    for (key, _) in std::env::vars() {
        if key.starts_with("MPARITY_") {
            cmd.env_remove(key);
        }
    }

    let start = Instant::now();
    let output = cmd.output().expect("run mparity");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_dir = workspace.root.join("logs");
    fs::create_dir_all(&log_dir).expect("log dir");
    let log_path = log_dir.join(format!("{label}.log"));
    let log_body = format!(
        "label: {label}\nstatus: {}\nduration: {duration:?}\n\nstdout:\n{stdout}\n\nstderr:\n{stderr}\n",
        output.status
    );
    fs::write(&log_path, log_body).expect("write log");

    MparityRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}

/// Install an executable shell script under the workspace.
#[cfg(unix)]
pub fn write_script(workspace: &Workspace, rel: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = workspace.write(rel, body);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}
