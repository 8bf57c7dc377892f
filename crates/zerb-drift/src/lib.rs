//! Drift classifier (C8, spec §4.8): a pure function comparing Baseline,
//! Managed, and Active tool inventories.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use zerb_core::{DriftKind, DriftResult, Tool, ToolSpec};

/// `IsUnderToolRoot`: a clean prefix check against `root/installs`. Must not
/// match suffix-extending impostor roots (e.g. `.../zerb-backup/installs/...`).
pub fn is_under_tool_root(path: &Path, root: &Path) -> bool {
    let tool_root = root.join("installs");
    let tool_root_len = tool_root.components().count();
    path.components().count() >= tool_root_len
        && path.components().zip(tool_root.components()).all(|(a, b)| a == b)
}

fn build_map(tools: Vec<Tool>) -> HashMap<String, Tool> {
    tools.into_iter().map(|t| (t.name.clone(), t)).collect()
}

fn classify(
    spec_version: &str,
    managed: Option<&Tool>,
    active: Option<&Tool>,
    tool_root: &Path,
) -> DriftKind {
    match (managed, active) {
        (None, None) => DriftKind::Missing,
        (Some(_), None) => DriftKind::ManagedButNotActive,
        (_, Some(active)) if !is_under_tool_root(&active.path, tool_root) => {
            DriftKind::ExternalOverride
        }
        (_, Some(active)) if active.version == "unknown" => DriftKind::VersionUnknown,
        (Some(managed), _) if managed.version != spec_version => DriftKind::VersionMismatch,
        (Some(managed), Some(active))
            if managed.version == spec_version
                && active.version == spec_version
                && is_under_tool_root(&active.path, tool_root) =>
        {
            DriftKind::Ok
        }
        _ => DriftKind::VersionMismatch,
    }
}

/// `DetectDrift`: compare `baseline` against `managed` and `active`,
/// producing one result per baseline entry (in baseline order) followed by
/// an `Extra` result for every managed entry baseline didn't declare.
pub fn detect_drift(
    baseline: &[ToolSpec],
    managed: Vec<Tool>,
    active: Vec<Tool>,
    tool_root: &Path,
) -> Vec<DriftResult> {
    let mut managed_map = build_map(managed);
    let mut active_map = build_map(active);
    let mut results = Vec::with_capacity(baseline.len());

    for spec in baseline {
        let identity = spec.identity().to_string();
        let managed_entry = managed_map.remove(&identity);
        let active_entry = active_map.remove(&identity);

        let drift_kind = classify(
            spec.version.as_deref().unwrap_or(""),
            managed_entry.as_ref(),
            active_entry.as_ref(),
            tool_root,
        );

        results.push(DriftResult {
            tool: identity,
            drift_kind,
            baseline_version: spec.version.clone(),
            managed_version: managed_entry.as_ref().map(|t| t.version.clone()),
            active_version: active_entry.as_ref().map(|t| t.version.clone()),
            active_path: active_entry.map(|t| t.path),
        });
    }

    // Deterministic order for extras: by name, rather than HashMap iteration
    // order, to give the CLI stable output across runs (spec §5: "stable
    // order for a given input").
    let mut extra_names: Vec<String> = managed_map.keys().cloned().collect();
    extra_names.sort();
    for name in extra_names {
        let managed_entry = managed_map.remove(&name).expect("key just listed");
        let active_entry = active_map.remove(&name);
        results.push(DriftResult {
            tool: name,
            drift_kind: DriftKind::Extra,
            baseline_version: None,
            managed_version: Some(managed_entry.version.clone()),
            active_version: active_entry.as_ref().map(|t| t.version.clone()),
            active_path: active_entry.map(|t| t.path),
        });
    }

    results
}

#[cfg(test)]
fn test_tool_root() -> PathBuf {
    PathBuf::from("/home/u/.local/share/zerb")
}
