//! `zerb config add/remove/list` (C12) wiring: parse CLI flags into the
//! `zerb-service` pipeline, or print a dry-run preview without touching
//! any on-disk state.

use std::fs;
use std::path::Path;

use zerb_core::{ConfigFileOptions, ZerbError};
use zerb_platform::PlatformInfo;

use crate::context;

fn read_active_config(root: &Path, platform: &PlatformInfo, home: &Path) -> Result<zerb_core::Config, ZerbError> {
    let active_path = zerb_script::active_symlink_path(root);
    let source = fs::read_to_string(&active_path).map_err(|_| ZerbError::NotInitialized)?;
    zerb_script::parse(&source, platform, None, home)
}

#[allow(clippy::too_many_arguments)]
pub fn add(
    root: &Path,
    platform: &PlatformInfo,
    home: &Path,
    paths: Vec<String>,
    recursive: bool,
    template: bool,
    secrets: bool,
    private: bool,
    dry_run: bool,
) -> Result<(), ZerbError> {
    let opts = ConfigFileOptions { recursive, template, secrets, private };

    if dry_run {
        for path in &paths {
            println!("would add: {path}");
        }
        return Ok(());
    }

    let chezmoi = context::chezmoi(root);
    let txn = zerb_service::config_add(root, platform, home, &paths, opts, &chezmoi)?;
    println!("added {} path(s); commit {}", paths.len(), txn.head_commit.as_deref().unwrap_or("(none)"));
    Ok(())
}

pub fn remove(
    root: &Path,
    platform: &PlatformInfo,
    home: &Path,
    paths: Vec<String>,
    purge: bool,
    dry_run: bool,
) -> Result<(), ZerbError> {
    if dry_run {
        for path in &paths {
            println!("would remove: {path}{}", if purge { " (and delete the file)" } else { "" });
        }
        return Ok(());
    }

    let chezmoi = context::chezmoi(root);
    let txn = zerb_service::config_remove(root, platform, home, &paths, purge, &chezmoi)?;
    println!("removed {} path(s); commit {}", paths.len(), txn.head_commit.as_deref().unwrap_or("(none)"));
    Ok(())
}

pub fn list(root: &Path, platform: &PlatformInfo, home: &Path) -> Result<(), ZerbError> {
    let config = read_active_config(root, platform, home)?;
    for entry in &config.configs {
        let mut flags = Vec::new();
        if entry.recursive {
            flags.push("recursive");
        }
        if entry.template {
            flags.push("template");
        }
        if entry.secrets {
            flags.push("secrets");
        }
        if entry.private {
            flags.push("private");
        }
        if flags.is_empty() {
            println!("{}", entry.path);
        } else {
            println!("{} [{}]", entry.path, flags.join(", "));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn list_reports_not_initialized_without_a_snapshot() {
        let dir = tempdir().unwrap();
        let platform = PlatformInfo::detect();
        let err = list(dir.path(), &platform, dir.path()).unwrap_err();
        assert!(matches!(err, ZerbError::NotInitialized));
    }

    #[test]
    fn add_dry_run_does_not_create_a_lock_file() {
        let dir = tempdir().unwrap();
        let platform = PlatformInfo::detect();
        add(
            dir.path(),
            &platform,
            dir.path(),
            vec!["~/.bashrc".to_string()],
            false,
            false,
            false,
            false,
            true,
        )
        .unwrap();
        assert!(!zerb_script::lock_path(dir.path()).exists());
    }
}
