//! End-to-end Adopt orchestration: acquire the C11 lock, read and parse the
//! active snapshot, mutate it per drift, and persist a new snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use zerb_core::{DriftResult, ZerbError};
use zerb_platform::PlatformInfo;

use crate::adopt::adopt_config;
use crate::snapshot::write_snapshot;

fn io_err(message: &'static str) -> impl Fn(std::io::Error) -> ZerbError {
    move |e| ZerbError::SubprocessError {
        message: message.to_string(),
        detail: zerb_core::error::translate_boundary_message(&e.to_string()),
    }
}

/// Run the full Adopt pipeline (spec §4.9, all seven steps under the C11
/// lock). Returns the newly written snapshot's path.
pub fn run_adopt(
    root: &Path,
    platform: &PlatformInfo,
    home: &Path,
    drift_results: &[DriftResult],
) -> Result<PathBuf, ZerbError> {
    let lock_path = zerb_script::lock_path(root);
    let _guard = zerb_txn::acquire_lock(&lock_path)?;

    let active_path = zerb_script::active_symlink_path(root);
    let source = fs::read_to_string(&active_path).map_err(io_err("failed to read active snapshot"))?;
    let config = zerb_script::parse(&source, platform, None, home)?;

    let adopted = adopt_config(&config, drift_results)?;
    write_snapshot(root, &adopted)
}
