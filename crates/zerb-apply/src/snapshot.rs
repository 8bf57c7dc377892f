//! Snapshot persistence shared by Adopt (C9) and the config-add/remove
//! pipeline (C12, spec §4.9 step 7 / §4.12 step 7): write a new timestamped
//! script file, update the active marker, and atomically swap the
//! `zerb.active.lua` symlink.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use chrono::Utc;

use zerb_core::{Config, ZerbError};

/// `YYYYMMDDThhmmss.mmmZ`, UTC, millisecond precision (spec §4.9 step 4).
pub fn compose_timestamp() -> String {
    let now = Utc::now();
    format!("{}.{:03}Z", now.format("%Y%m%dT%H%M%S"), now.timestamp_subsec_millis())
}

fn io_err(message: &'static str) -> impl Fn(std::io::Error) -> ZerbError {
    move |e| ZerbError::SubprocessError {
        message: message.to_string(),
        detail: zerb_core::error::translate_boundary_message(&e.to_string()),
    }
}

fn write_mode_0600(path: &Path, contents: &[u8]) -> Result<(), ZerbError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(io_err("failed to open snapshot file"))?;
    file.write_all(contents).map_err(io_err("failed to write snapshot file"))?;
    file.sync_all().map_err(io_err("failed to fsync snapshot file"))
}

/// Write `configs/zerb.lua.<ts>`, `.zerb-active`, and atomically swap the
/// `zerb.active.lua` symlink to point at it. Returns the snapshot's absolute
/// path. Caller is responsible for holding the C11 lock.
pub fn write_snapshot(root: &Path, config: &Config) -> Result<PathBuf, ZerbError> {
    let ts = compose_timestamp();
    let filename = format!("zerb.lua.{ts}");

    let configs_dir = zerb_script::configs_dir(root);
    fs::create_dir_all(&configs_dir).map_err(io_err("failed to create configs directory"))?;

    let script = zerb_script::generate(config);
    let snapshot_path = configs_dir.join(&filename);
    write_mode_0600(&snapshot_path, script.as_bytes())?;

    let marker_path = zerb_script::active_marker_path(root);
    write_mode_0600(&marker_path, format!("{filename}\n").as_bytes())?;

    swap_active_symlink(root, &filename)?;

    Ok(snapshot_path)
}

/// Atomically swap `zerb.active.lua` to point at `configs/<filename>`: write
/// a relative symlink at `<target>.tmp`, then rename over the final path.
/// On platforms without symlink support (`ENOTSUP`/`ENOSYS` at symlink-create
/// time), fall back to writing the snapshot's contents directly as a
/// regular file (spec §4.9 step 7, §9 "symlink portability").
fn swap_active_symlink(root: &Path, filename: &str) -> Result<(), ZerbError> {
    let symlink_path = zerb_script::active_symlink_path(root);
    let tmp_path = PathBuf::from(format!("{}.tmp", symlink_path.display()));
    let relative_target = Path::new("configs").join(filename);
    let _ = fs::remove_file(&tmp_path);

    match std::os::unix::fs::symlink(&relative_target, &tmp_path) {
        Ok(()) => fs::rename(&tmp_path, &symlink_path).map_err(io_err("failed to install active symlink")),
        Err(e) if matches!(e.raw_os_error(), Some(libc::ENOTSUP) | Some(libc::ENOSYS)) => {
            tracing::debug!("symlinks unsupported on this filesystem, falling back to a regular file");
            let snapshot_path = zerb_script::configs_dir(root).join(filename);
            let contents = fs::read(&snapshot_path).map_err(io_err("failed to read snapshot for fallback copy"))?;
            write_mode_0600(&tmp_path, &contents)?;
            fs::rename(&tmp_path, &symlink_path).map_err(io_err("failed to install active snapshot copy"))
        }
        Err(e) => Err(io_err("failed to create active symlink")(e)),
    }
}
