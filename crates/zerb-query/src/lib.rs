//! Source queries (C7, spec §4.7): three independent tool inventories —
//! Baseline (declared), Managed (installer-owned), Active (on PATH).

pub mod env;
pub mod shell_adapters;

use std::path::PathBuf;

use tracing::debug;

pub use env::minimal_env;
pub use shell_adapters::{ShellChezmoi, ShellInstaller};

use zerb_core::{Installer, MinimalEnv, Tool, ToolSpec, ZerbError};
use zerb_version::VersionCache;

/// Default deadline for installer invocations; overridable by
/// `ZERB_MISE_TIMEOUT` (seconds).
pub const DEFAULT_INSTALLER_TIMEOUT_SECS: u64 = 120;

/// `QueryBaseline`: project the `Tools` strings already extracted by C3 out
/// of the active snapshot into `ToolSpec` values, preserving order. The
/// snapshot read + Lua parse happens in the calling service (C12/CLI),
/// which already owns a `Config`; this module stays free of a sandbox
/// dependency.
pub fn project_tool_specs(tools: &[String]) -> Result<Vec<ToolSpec>, ZerbError> {
    tools
        .iter()
        .map(|raw| ToolSpec::parse(raw))
        .collect::<Result<Vec<_>, String>>()
        .map_err(ZerbError::parse)
}

/// `QueryManaged`: merge the installer's full inventory with its
/// currently-selected-version report. Only tools whose active version
/// appears in the full inventory are returned; their path comes from that
/// inventory entry.
pub fn query_managed(
    root: &std::path::Path,
    installer: &dyn Installer,
    env: &MinimalEnv,
) -> Result<Vec<Tool>, ZerbError> {
    let full = installer.list(root, env)?;
    let current = installer.list_current(root, env)?;

    let mut merged = Vec::with_capacity(current.len());
    for selected in &current {
        let matched = full
            .iter()
            .find(|t| t.name == selected.name && t.version == selected.version);
        match matched {
            Some(entry) => merged.push(entry.clone()),
            None => debug!(
                tool = %selected.name,
                version = %selected.version,
                "selected version not present in installer's full inventory"
            ),
        }
    }
    Ok(merged)
}

/// `QueryActive`: resolve each name on PATH, canonicalize the symlink once,
/// then call C6. Names that don't resolve are dropped silently (they will
/// show up as `Missing` after drift classification).
pub async fn query_active(
    names: &[String],
    cache: &VersionCache,
    force_refresh: bool,
) -> Vec<Tool> {
    let mut results = Vec::with_capacity(names.len());
    for name in names {
        let Ok(resolved) = which::which(name) else {
            continue;
        };
        let canonical = std::fs::canonicalize(&resolved).unwrap_or(resolved);

        let version = match cache.get(&canonical, force_refresh) {
            Some(cached) => cached,
            None => {
                let detected = zerb_version::detect_version_or_unknown(&canonical).await;
                cache.put(canonical.clone(), detected.clone());
                detected
            }
        };

        results.push(Tool {
            name: name.clone(),
            version,
            path: canonical,
        });
    }
    results
}

/// Best-effort resolution of a name to an absolute path without running it,
/// used by callers that only need `Active.Path` for drift classification.
pub fn resolve_on_path(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
