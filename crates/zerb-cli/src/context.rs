//! Shared setup every subcommand needs: the managed root, `$HOME`, the
//! host platform, and the two shell adapters (spec §9, §6 "bin/ resolves
//! first").

use std::path::{Path, PathBuf};

use zerb_core::ZerbError;
use zerb_platform::PlatformInfo;
use zerb_query::{ShellChezmoi, ShellInstaller};

/// Installer backend name; also the `*_CONFIG_FILE`/`*_DATA_DIR`/
/// `*_CACHE_DIR` env prefix (`ZERB_MISE_TIMEOUT` names the same backend).
const INSTALLER_BIN: &str = "mise";
const INSTALLER_ENV_PREFIX: &str = "MISE";
const CHEZMOI_BIN: &str = "chezmoi";

pub fn resolve_root(explicit: Option<PathBuf>) -> Result<PathBuf, ZerbError> {
    explicit
        .or_else(zerb_script::default_root)
        .ok_or_else(|| ZerbError::validation("root", "could not determine a managed root; pass --root"))
}

pub fn resolve_home() -> Result<PathBuf, ZerbError> {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or_else(|| ZerbError::validation("home", "could not determine $HOME"))
}

/// `bin/<name>` under the managed root if present, else fall back to
/// resolving `name` on `PATH` (spec §6: "adapters resolve here first").
fn resolve_adapter_binary(root: &Path, name: &str) -> String {
    let local = zerb_script::bin_dir(root).join(name);
    if local.is_file() {
        local.to_string_lossy().into_owned()
    } else {
        name.to_string()
    }
}

pub fn installer(root: &Path) -> ShellInstaller {
    ShellInstaller::new(resolve_adapter_binary(root, INSTALLER_BIN))
}

pub fn chezmoi(root: &Path) -> ShellChezmoi {
    ShellChezmoi::new(resolve_adapter_binary(root, CHEZMOI_BIN))
}

pub fn minimal_env(root: &Path) -> zerb_core::MinimalEnv {
    zerb_query::minimal_env(root, INSTALLER_ENV_PREFIX)
}

pub fn platform() -> PlatformInfo {
    PlatformInfo::detect()
}
