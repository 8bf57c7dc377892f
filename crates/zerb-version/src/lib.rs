//! Version extraction and caching (C6, spec §4.6).

mod cache;

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::process::Command;
use tracing::{debug, warn};

use zerb_core::ZerbError;

pub use cache::VersionCache;

/// Default per-`--version` subprocess deadline; overridable by
/// `ZERB_VERSION_TIMEOUT` (seconds).
pub const DEFAULT_VERSION_TIMEOUT_SECS: u64 = 3;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\.\d+\.\d+(?:-[A-Za-z0-9.]+)?(?:\+[A-Za-z0-9.]+)?").expect("valid regex")
});

/// `ExtractVersion`: the first semver-shaped match in `text`.
pub fn extract_version(text: &str) -> Result<String, ZerbError> {
    VERSION_RE
        .find(text)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ZerbError::parse("no version string found in output"))
}

fn version_timeout() -> Duration {
    std::env::var("ZERB_VERSION_TIMEOUT")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_VERSION_TIMEOUT_SECS))
}

async fn run_flag(binary: &Path, flag: &str, deadline: Duration) -> Option<String> {
    let mut cmd = Command::new(binary);
    cmd.arg(flag);
    let output = tokio::time::timeout(deadline, cmd.output()).await.ok()?.ok()?;
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    if combined.trim().is_empty() {
        None
    } else {
        Some(combined)
    }
}

/// `DetectVersion`: run `binary --version`, falling back to `-v` on empty
/// output or no match. Never returns an error for "no version" -- callers
/// that want the `"unknown"` sentinel call this and substitute it.
pub async fn detect_version(binary: &Path) -> Result<String, ZerbError> {
    let deadline = version_timeout();

    if let Some(output) = run_flag(binary, "--version", deadline).await {
        if let Ok(version) = extract_version(&output) {
            return Ok(version);
        }
    }
    if let Some(output) = run_flag(binary, "-v", deadline).await {
        if let Ok(version) = extract_version(&output) {
            return Ok(version);
        }
    }
    warn!(binary = %binary.display(), "version extraction failed for both --version and -v");
    Err(ZerbError::parse(format!(
        "could not determine version for {}",
        binary.display()
    )))
}

/// `DetectVersion`, substituting `"unknown"` on failure rather than
/// propagating an error (this is what C7/C8 consume).
pub async fn detect_version_or_unknown(binary: &Path) -> String {
    match detect_version(binary).await {
        Ok(version) => version,
        Err(err) => {
            debug!(binary = %binary.display(), error = %err, "version unknown");
            "unknown".to_string()
        }
    }
}
