//! Git operations on the managed root (C12, spec §4.12 steps 9-10).
//!
//! The managed root is tracked as a single git repository. [`ensure_git_init`]
//! must be called before any other git operation.

use std::path::{Path, PathBuf};
use std::process::Command;

use zerb_core::{error::translate_boundary_message, ZerbError};

fn run(mut cmd: Command, action: &'static str) -> Result<std::process::Output, ZerbError> {
    cmd.output().map_err(|e| ZerbError::SubprocessError {
        message: format!("failed to run git {action}"),
        detail: translate_boundary_message(&e.to_string()),
    })
}

fn require_success(output: std::process::Output, action: &'static str) -> Result<std::process::Output, ZerbError> {
    if output.status.success() {
        Ok(output)
    } else {
        Err(ZerbError::SubprocessError {
            message: format!("git {action} failed"),
            detail: translate_boundary_message(&String::from_utf8_lossy(&output.stderr)),
        })
    }
}

/// Ensure `root` is a git repository. Initializes and configures a local
/// identity if needed, so commits never fail on "please tell me who you are".
pub fn ensure_git_init(root: &Path) -> Result<(), ZerbError> {
    if root.join(".git").exists() {
        return Ok(());
    }

    std::fs::create_dir_all(root).map_err(|e| ZerbError::SubprocessError {
        message: "failed to create managed root".to_string(),
        detail: translate_boundary_message(&e.to_string()),
    })?;

    require_success(run(git(root).arg("init"), "init")?, "init")?;

    let _ = run(git(root).args(["config", "user.email", "zerb@localhost"]), "config");
    let _ = run(git(root).args(["config", "user.name", "zerb"]), "config");

    Ok(())
}

fn git(root: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(root);
    cmd
}

/// Stage `paths` (relative to `root`) and commit with `subject`/`body`
/// (spec §4.12 step 9: "subject 'Add/Remove N configs …' and a body listing
/// the paths"). Returns the new HEAD commit hash.
pub fn commit_paths(root: &Path, paths: &[PathBuf], subject: &str, body: &str) -> Result<String, ZerbError> {
    ensure_git_init(root)?;

    let mut add = git(root);
    add.arg("add").arg("--");
    for path in paths {
        add.arg(path);
    }
    require_success(run(add, "add")?, "add")?;

    let status = run(git(root).args(["diff", "--cached", "--quiet"]), "diff")?;
    match status.status.code() {
        Some(0) => {
            return Err(ZerbError::SubprocessError {
                message: "no changes to commit".to_string(),
                detail: String::new(),
            })
        }
        Some(1) => {}
        _ => return Err(ZerbError::SubprocessError {
            message: "git diff --cached failed".to_string(),
            detail: translate_boundary_message(&String::from_utf8_lossy(&status.stderr)),
        }),
    }

    let message = format!("{subject}\n\n{body}");
    require_success(run(git(root).args(["commit", "-m", &message]), "commit")?, "commit")?;

    let hash_output = require_success(run(git(root).args(["rev-parse", "HEAD"]), "rev-parse")?, "rev-parse")?;
    Ok(String::from_utf8_lossy(&hash_output.stdout).trim().to_string())
}
