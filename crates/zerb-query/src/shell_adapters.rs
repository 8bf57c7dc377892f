//! Thin, concrete `Installer`/`Chezmoi` implementations that actually spawn
//! a subprocess (spec §9: "these are the only places shell processes are
//! spawned"). Deliberately minimal: the orchestration logic these adapters
//! plug into (C7/C9/C10/C12) is the tested surface; these wrappers just
//! shell out with a minimized environment and translate the exit status.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use zerb_core::{Chezmoi, ConfigFileOptions, Installer, MinimalEnv, Tool, ZerbError, error::translate_boundary_message, validate_tool_name, validate_version};

use crate::DEFAULT_INSTALLER_TIMEOUT_SECS;

fn installer_timeout() -> Duration {
    std::env::var("ZERB_MISE_TIMEOUT")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_INSTALLER_TIMEOUT_SECS))
}

fn command_with_env(binary: &str, env: &MinimalEnv) -> Command {
    let mut cmd = Command::new(binary);
    cmd.env_clear();
    cmd.env("PATH", &env.path);
    cmd.env("HOME", &env.home);
    cmd.env("USER", &env.user);
    cmd.env("TMPDIR", &env.tmpdir);
    cmd.env("TERM", &env.term);
    for (k, v) in &env.extra {
        cmd.env(k, v);
    }
    cmd
}

fn run(cmd: Command) -> Result<std::process::Output, ZerbError> {
    run_with_deadline(cmd, installer_timeout())
}

/// Runs `cmd` to completion, killing it if it outlives `timeout` (spec
/// §4.7's 2-minute default deadline). `Installer`/`Chezmoi` stay synchronous
/// ports, so the deadline is enforced with a watcher thread that signals the
/// child's pid directly rather than an async runtime -- the same
/// spawn-then-bound shape as the teacher's `kill_on_drop` safety net, just
/// driven by a wall-clock deadline instead of drop.
fn run_with_deadline(mut cmd: Command, timeout: Duration) -> Result<std::process::Output, ZerbError> {
    let start = Instant::now();
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ZerbError::SubprocessError {
            message: "failed to spawn external tool".to_string(),
            detail: translate_boundary_message(&e.to_string()),
        })?;

    let pid = child.id() as libc::pid_t;
    let deadline = start + timeout;
    let watchdog = std::thread::spawn(move || {
        while Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }
        // Best-effort: if the child already exited, this races a reused
        // pid and is a harmless ESRCH in the overwhelmingly common case.
        unsafe {
            libc::kill(pid, libc::SIGKILL);
        }
    });

    let output = child.wait_with_output().map_err(|e| ZerbError::SubprocessError {
        message: "failed to wait for external tool".to_string(),
        detail: translate_boundary_message(&e.to_string()),
    })?;
    let timed_out = start.elapsed() >= timeout;
    drop(watchdog);

    if timed_out {
        return Err(ZerbError::Timeout("external tool exceeded its deadline (timeout)".to_string()));
    }
    Ok(output)
}

fn require_success(output: std::process::Output, action: &str) -> Result<std::process::Output, ZerbError> {
    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(ZerbError::SubprocessError {
            message: format!("{action} failed"),
            detail: translate_boundary_message(&stderr),
        })
    }
}

/// `Installer` adapter backed by a shell-exec tool invoked by name. The
/// binary name itself never comes from user input, only from configuration
/// at startup, so it is not subject to the injection-boundary checks.
pub struct ShellInstaller {
    binary: String,
}

impl ShellInstaller {
    pub fn new(binary: impl Into<String>) -> Self {
        ShellInstaller { binary: binary.into() }
    }
}

impl Installer for ShellInstaller {
    fn list(&self, root: &Path, env: &MinimalEnv) -> Result<Vec<Tool>, ZerbError> {
        let mut cmd = command_with_env(&self.binary, env);
        cmd.current_dir(root).args(["list", "--json"]);
        let output = require_success(run(cmd)?, "list installed tools")?;
        parse_json_tool_list(&output.stdout)
    }

    fn list_current(&self, root: &Path, env: &MinimalEnv) -> Result<Vec<Tool>, ZerbError> {
        let mut cmd = command_with_env(&self.binary, env);
        cmd.current_dir(root).args(["current"]);
        let output = require_success(run(cmd)?, "list active tools")?;
        parse_whitespace_tool_list(&output.stdout)
    }

    fn install(&self, root: &Path, name: &str, version: &str, env: &MinimalEnv) -> Result<(), ZerbError> {
        validate_tool_name(name)?;
        validate_version(version)?;
        let mut cmd = command_with_env(&self.binary, env);
        cmd.current_dir(root)
            .arg("install")
            .arg(format!("{name}@{version}"));
        require_success(run(cmd)?, "install tool")?;
        Ok(())
    }

    fn uninstall(&self, root: &Path, name: &str, env: &MinimalEnv) -> Result<(), ZerbError> {
        validate_tool_name(name)?;
        let mut cmd = command_with_env(&self.binary, env);
        cmd.current_dir(root).arg("uninstall").arg(name);
        require_success(run(cmd)?, "uninstall tool")?;
        Ok(())
    }
}

fn parse_json_tool_list(raw: &[u8]) -> Result<Vec<Tool>, ZerbError> {
    #[derive(serde::Deserialize)]
    struct RawTool {
        name: String,
        version: String,
        path: std::path::PathBuf,
    }
    let text = String::from_utf8_lossy(raw);
    let parsed: Vec<RawTool> = serde_json::from_str(&text).map_err(|_| ZerbError::SubprocessError {
        message: "malformed installer output".to_string(),
        detail: text.into_owned(),
    })?;
    Ok(parsed
        .into_iter()
        .map(|t| Tool {
            name: t.name,
            version: t.version,
            path: t.path,
        })
        .collect())
}

fn parse_whitespace_tool_list(raw: &[u8]) -> Result<Vec<Tool>, ZerbError> {
    let text = String::from_utf8_lossy(raw);
    let mut tools = Vec::new();
    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let (Some(name), Some(version)) = (parts.next(), parts.next()) else {
            continue;
        };
        tools.push(Tool {
            name: name.to_string(),
            version: version.to_string(),
            path: std::path::PathBuf::new(),
        });
    }
    Ok(tools)
}

/// `Chezmoi` adapter backed by a shell-exec dotfile manager.
pub struct ShellChezmoi {
    binary: String,
}

impl ShellChezmoi {
    pub fn new(binary: impl Into<String>) -> Self {
        ShellChezmoi { binary: binary.into() }
    }
}

impl Chezmoi for ShellChezmoi {
    fn add(&self, path: &Path, opts: ConfigFileOptions) -> Result<Vec<std::path::PathBuf>, ZerbError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("add");
        if opts.recursive {
            cmd.arg("--recursive");
        }
        if opts.template {
            cmd.arg("--template");
        }
        let _ = opts.secrets;
        let _ = opts.private;
        cmd.arg(path);
        let output = require_success(run(cmd)?, "add config file")?;
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text.lines().map(std::path::PathBuf::from).collect())
    }

    fn remove(&self, path: &Path) -> Result<(), ZerbError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("forget").arg(path);
        require_success(run(cmd)?, "remove config file")?;
        Ok(())
    }

    fn has_file(&self, path: &Path) -> Result<bool, ZerbError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("managed");
        let output = run(cmd)?;
        if !output.status.success() {
            return Ok(false);
        }
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text.lines().any(|l| Path::new(l) == path))
    }

    fn source_dir(&self) -> Result<std::path::PathBuf, ZerbError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("source-path");
        let output = require_success(run(cmd)?, "resolve config source directory")?;
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(std::path::PathBuf::from(text.trim()))
    }
}
