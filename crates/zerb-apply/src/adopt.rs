//! Apply-Adopt pipeline (C9, spec §4.9): rewrite the declared baseline so it
//! matches the detected environment.

use std::collections::HashMap;

use zerb_core::{Config, DriftKind, DriftResult, ToolSpec, ZerbError};

/// Mutate `Tools` per `DriftKind` (spec §4.9 step 2):
/// - `VersionMismatch` → replace the spec's version with `active.Version`.
/// - `Extra` → append `<name>@<managed.Version>`.
/// - `ExternalOverride`/`Missing`/`ManagedButNotActive`/`VersionUnknown` → drop.
/// - `Ok`, or any identity drift didn't cover → carried through unchanged.
pub fn adopt_tools(tools: &[String], drift_results: &[DriftResult]) -> Result<Vec<String>, ZerbError> {
    let by_identity: HashMap<&str, &DriftResult> =
        drift_results.iter().map(|d| (d.tool.as_str(), d)).collect();

    let mut adopted = Vec::with_capacity(tools.len());
    for raw in tools {
        let spec = ToolSpec::parse(raw).map_err(ZerbError::parse)?;
        match by_identity.get(spec.identity()) {
            Some(d) => match d.drift_kind {
                DriftKind::VersionMismatch => {
                    if let Some(active_version) = &d.active_version {
                        adopted.push(spec.with_version(active_version).to_string());
                    } else {
                        adopted.push(raw.clone());
                    }
                }
                DriftKind::ExternalOverride
                | DriftKind::Missing
                | DriftKind::ManagedButNotActive
                | DriftKind::VersionUnknown => {}
                DriftKind::Ok | DriftKind::Extra => adopted.push(raw.clone()),
            },
            None => adopted.push(raw.clone()),
        }
    }

    for d in drift_results {
        if d.drift_kind == DriftKind::Extra {
            if let Some(version) = &d.managed_version {
                adopted.push(format!("{}@{version}", d.tool));
            }
        }
    }

    Ok(adopted)
}

/// Apply `adopt_tools` to a parsed `Config`, returning the rewritten value.
pub fn adopt_config(config: &Config, drift_results: &[DriftResult]) -> Result<Config, ZerbError> {
    let mut adopted = config.clone();
    adopted.tools = adopt_tools(&config.tools, drift_results)?;
    Ok(adopted)
}
