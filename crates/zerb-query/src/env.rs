//! Construction of the minimized subprocess environment (spec §4.7) used
//! for every installer / dotfile-manager invocation.

use std::path::Path;

use zerb_core::MinimalEnv;

/// Build the minimized environment for an installer invocation under
/// `root`: only `PATH`, `HOME`, `USER`, `TMPDIR`, `TERM` from the calling
/// process, plus the installer's `*_CONFIG_FILE` / `*_DATA_DIR` /
/// `*_CACHE_DIR`, all rooted under `root`.
pub fn minimal_env(root: &Path, installer_env_prefix: &str) -> MinimalEnv {
    let extra = vec![
        (
            format!("{installer_env_prefix}_CONFIG_FILE"),
            root.join("installs").join("config.toml").to_string_lossy().into_owned(),
        ),
        (
            format!("{installer_env_prefix}_DATA_DIR"),
            root.join("installs").to_string_lossy().into_owned(),
        ),
        (
            format!("{installer_env_prefix}_CACHE_DIR"),
            root.join("installs").join(".cache").to_string_lossy().into_owned(),
        ),
    ];

    MinimalEnv {
        path: std::env::var("PATH").unwrap_or_default(),
        home: std::env::var("HOME").unwrap_or_default(),
        user: std::env::var("USER").unwrap_or_default(),
        tmpdir: std::env::var("TMPDIR").unwrap_or_else(|_| "/tmp".to_string()),
        term: std::env::var("TERM").unwrap_or_default(),
        extra,
    }
}
