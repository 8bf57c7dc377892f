//! Drift classification types (spec §3, §4.8). Pure data: the classifier
//! itself lives in `zerb-drift`, which keys everything here off `Tool`
//! identity (spec §4.8's priority-ordered `DriftKind` decision table).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single tool as observed from one of the three sources (Baseline,
/// Managed, Active) during drift classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
}

/// The outcome of comparing a tool's presence/version across Baseline,
/// Managed, and Active, in spec §4.8's priority order (top variant wins
/// when more than one condition applies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftKind {
    /// Managed and Active agree, both present.
    Ok,
    /// Managed and Active both have the tool, but the versions differ.
    VersionMismatch,
    /// Managed declares the tool but nothing is active.
    Missing,
    /// Active has the tool but Managed does not declare it.
    Extra,
    /// Active's binary did not come from the managed install tree at all.
    ExternalOverride,
    /// Managed declares the tool, Active has *something* installed, but it
    /// isn't the currently-selected/active version for that tool.
    ManagedButNotActive,
    /// A version string could not be extracted from the resolved binary.
    VersionUnknown,
}

/// The per-tool classification result returned by `zerb-drift` and surfaced
/// by `zerb status`/`zerb sync`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftResult {
    pub tool: String,
    pub drift_kind: DriftKind,
    pub baseline_version: Option<String>,
    pub managed_version: Option<String>,
    pub active_version: Option<String>,
    pub active_path: Option<PathBuf>,
}

impl DriftResult {
    /// True for the only kind that represents a fully converged tool.
    pub fn is_ok(&self) -> bool {
        matches!(self.drift_kind, DriftKind::Ok)
    }
}
