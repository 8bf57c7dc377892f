//! Exclusive config lock (C11, spec §4.11): `O_CREATE|O_EXCL` with a
//! 10-minute staleness window, rather than `flock(2)` — there is no
//! process-scoped release here, so a crashed holder must be reclaimable by
//! mtime instead.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use zerb_core::ZerbError;

const STALE_AFTER: Duration = Duration::from_secs(10 * 60);

/// Diagnostic payload written into the lock file (spec §4.11: `pid=…\ntimestamp=…\n`).
#[derive(Debug, Serialize, Deserialize)]
struct LockDiagnostic {
    pid: u32,
    timestamp: DateTime<Utc>,
}

impl LockDiagnostic {
    fn render(&self) -> String {
        format!("pid={}\ntimestamp={}\n", self.pid, self.timestamp.to_rfc3339())
    }

    fn parse(text: &str) -> Option<LockDiagnostic> {
        let mut pid = None;
        let mut timestamp = None;
        for line in text.lines() {
            if let Some(v) = line.strip_prefix("pid=") {
                pid = v.parse().ok();
            } else if let Some(v) = line.strip_prefix("timestamp=") {
                timestamp = DateTime::parse_from_rfc3339(v).ok().map(|t| t.with_timezone(&Utc));
            }
        }
        Some(LockDiagnostic {
            pid: pid?,
            timestamp: timestamp?,
        })
    }
}

/// Guard holding the acquired config lock. Removes the lock file on drop;
/// release is idempotent (a missing file is not an error).
pub struct LockGuard {
    lock_path: PathBuf,
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard").field("lock_path", &self.lock_path).finish()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.lock_path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.lock_path.display(), error = %err, "failed to release config lock");
            }
        }
    }
}

fn is_stale(lock_path: &Path) -> std::io::Result<bool> {
    let metadata = fs::metadata(lock_path)?;
    let modified = metadata.modified()?;
    let age = SystemTime::now().duration_since(modified).unwrap_or(Duration::ZERO);
    Ok(age > STALE_AFTER)
}

fn diagnostic_for_existing(lock_path: &Path) -> (u32, String) {
    match fs::read_to_string(lock_path).ok().and_then(|s| LockDiagnostic::parse(&s)) {
        Some(d) => (d.pid, d.timestamp.to_rfc3339()),
        None => (0, "unknown".to_string()),
    }
}

fn create_and_write(lock_path: &Path) -> std::io::Result<File> {
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .read(true)
        .mode(0o600)
        .open(lock_path)?;
    let diagnostic = LockDiagnostic {
        pid: std::process::id(),
        timestamp: Utc::now(),
    };
    file.write_all(diagnostic.render().as_bytes())?;
    file.sync_all()?;
    Ok(file)
}

/// `AcquireLock` (spec §4.11): create `<dir>/config.lock` exclusively. On
/// `EEXIST`, reclaim once if the existing file is older than ten minutes;
/// otherwise return `LockExists` with the holder's pid and timestamp.
pub fn acquire_lock(lock_path: &Path) -> Result<LockGuard, ZerbError> {
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent).map_err(|e| ZerbError::SubprocessError {
            message: "failed to create lock directory".to_string(),
            detail: zerb_core::error::translate_boundary_message(&e.to_string()),
        })?;
    }

    match create_and_write(lock_path) {
        Ok(_file) => Ok(LockGuard { lock_path: lock_path.to_path_buf() }),
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            let stale = is_stale(lock_path).unwrap_or(false);
            if stale {
                tracing::info!(path = %lock_path.display(), "reclaiming stale config lock");
                let _ = fs::remove_file(lock_path);
                match create_and_write(lock_path) {
                    Ok(_file) => Ok(LockGuard { lock_path: lock_path.to_path_buf() }),
                    Err(_) => {
                        let (pid, since) = diagnostic_for_existing(lock_path);
                        Err(ZerbError::LockExists { pid, since })
                    }
                }
            } else {
                let (pid, since) = diagnostic_for_existing(lock_path);
                Err(ZerbError::LockExists { pid, since })
            }
        }
        Err(err) => Err(ZerbError::SubprocessError {
            message: "failed to acquire config lock".to_string(),
            detail: zerb_core::error::translate_boundary_message(&err.to_string()),
        }),
    }
}
