//! Shared implementation behind `status` and `sync`: run the three C7
//! queries, classify drift, print one line per result (spec §6: `sync`'s
//! interactive loop is an external collaborator, so it prints the same
//! report `status` does instead).

use std::fs;
use std::path::Path;

use zerb_core::ZerbError;
use zerb_drift::detect_drift;
use zerb_platform::PlatformInfo;
use zerb_version::VersionCache;

use crate::context;

/// Runs the drift report; returns `true` iff every tool classified `Ok`.
pub async fn run(root: &Path, platform: &PlatformInfo, home: &Path) -> Result<bool, ZerbError> {
    let active_path = zerb_script::active_symlink_path(root);
    let source = fs::read_to_string(&active_path).map_err(|_| ZerbError::NotInitialized)?;
    let config = zerb_script::parse(&source, platform, None, home)?;

    let baseline = zerb_query::project_tool_specs(&config.tools)?;

    let installer = context::installer(root);
    let env = context::minimal_env(root);
    let root_owned = root.to_path_buf();
    let names: Vec<String> = baseline.iter().map(|spec| spec.identity().to_string()).collect();
    let cache = VersionCache::new();

    // `query_managed` shells out synchronously; run it on the blocking pool
    // so it overlaps with the already-async `query_active` instead of
    // serializing the two C7 calls behind each other.
    let (managed, active) = tokio::join!(
        tokio::task::spawn_blocking(move || zerb_query::query_managed(&root_owned, &installer, &env)),
        zerb_query::query_active(&names, &cache, false)
    );
    let managed = managed.map_err(|e| ZerbError::SubprocessError {
        message: "installer query task panicked".to_string(),
        detail: e.to_string(),
    })??;

    let results = detect_drift(&baseline, managed, active, root);

    let mut all_ok = true;
    for result in &results {
        if result.drift_kind != zerb_core::DriftKind::Ok {
            all_ok = false;
        }
        println!("{:?} {}", result.drift_kind, result.tool);
    }

    Ok(all_ok)
}
