//! Path normalization and on-disk layout helpers (C5, spec §4.5, §6).

use std::path::{Path, PathBuf};

use zerb_core::ZerbError;

/// Canonical XDG app name used to resolve the managed root when the caller
/// doesn't pass one explicitly.
pub const APP_NAME: &str = "zerb";

/// Resolve the default managed root: `<data dir>/zerb`.
pub fn default_root() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn configs_dir(root: &Path) -> PathBuf {
    root.join("configs")
}

pub fn txn_dir(root: &Path) -> PathBuf {
    root.join(".txn")
}

pub fn lock_path(root: &Path) -> PathBuf {
    txn_dir(root).join("config.lock")
}

pub fn active_marker_path(root: &Path) -> PathBuf {
    root.join(".zerb-active")
}

pub fn active_symlink_path(root: &Path) -> PathBuf {
    root.join("zerb.active.lua")
}

pub fn installs_dir(root: &Path) -> PathBuf {
    root.join("installs")
}

pub fn bin_dir(root: &Path) -> PathBuf {
    root.join("bin")
}

/// `NormalizeConfigPath` (spec §4.5): expand a leading `~`, reject empty and
/// non-absolute-non-tilde inputs, clean `.`/`..` components, strip trailing
/// separators except the root, and return the canonical absolute form. This
/// is the sole equality used for all path comparisons (P6).
pub fn normalize_config_path(raw: &str, home: &Path) -> Result<PathBuf, ZerbError> {
    if raw.is_empty() {
        return Err(ZerbError::validation("path", "path must not be empty"));
    }

    let expanded = if let Some(rest) = raw.strip_prefix("~/") {
        home.join(rest)
    } else if raw == "~" {
        home.to_path_buf()
    } else if raw.starts_with('/') {
        PathBuf::from(raw)
    } else {
        return Err(ZerbError::validation(
            "path",
            "path must be absolute or start with '~'",
        ));
    };

    Ok(clean(&expanded))
}

/// Lexically clean a path: resolve `.`/`..` components without touching the
/// filesystem, dropping any leading `..` that would escape the root.
fn clean(path: &Path) -> PathBuf {
    let mut stack: Vec<std::path::Component> = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                if matches!(
                    stack.last(),
                    Some(std::path::Component::Normal(_))
                ) {
                    stack.pop();
                }
            }
            other => stack.push(other),
        }
    }
    stack.into_iter().collect()
}
