//! Config-add / config-remove services (C12, spec §4.12): the shared
//! ten-step pipeline behind `zerb config add` and `zerb config remove`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use zerb_core::{Chezmoi, Config, ConfigFile, ConfigFileOptions, ZerbError, MAX_CONFIGS};
use zerb_platform::PlatformInfo;
use zerb_txn::{journal, Operation, PathOptions, PathState, PathTxn, Transaction};

use crate::git;

fn io_err(message: &'static str) -> impl Fn(std::io::Error) -> ZerbError {
    move |e| ZerbError::SubprocessError {
        message: message.to_string(),
        detail: zerb_core::error::translate_boundary_message(&e.to_string()),
    }
}

fn read_active_config(root: &Path, platform: &PlatformInfo, home: &Path) -> Result<Config, ZerbError> {
    let active_path = zerb_script::active_symlink_path(root);
    if !active_path.exists() {
        return Err(ZerbError::NotInitialized);
    }
    let source = fs::read_to_string(&active_path).map_err(io_err("failed to read active snapshot"))?;
    zerb_script::parse(&source, platform, None, home)
}

fn reject_self_duplicates(raw_paths: &[String], home: &Path) -> Result<Vec<PathBuf>, ZerbError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(raw_paths.len());
    for raw in raw_paths {
        let n = zerb_script::normalize_config_path(raw, home)?;
        if !seen.insert(n.clone()) {
            return Err(ZerbError::validation("path", format!("duplicate path in input: {raw}")));
        }
        normalized.push(n);
    }
    Ok(normalized)
}

fn abort_with_journal_reference(txn: &Transaction, txn_dir: &Path, err: ZerbError) -> ZerbError {
    let journal_path = txn.journal_path(txn_dir);
    tracing::warn!(txn_id = %txn.id, journal = %journal_path.display(), error = %err, "config operation aborted");
    ZerbError::SubprocessError {
        message: format!("config operation failed; see transaction journal {}", journal_path.display()),
        detail: err.to_string(),
    }
}

/// Paths under `root` that step 9 stages: the new snapshot, the active
/// marker, the active symlink, and -- when it actually sits inside `root` --
/// the dotfile manager's source directory (spec.md §4.12 step 9). Most
/// `chezmoi` installs keep their source tree under `$HOME`'s own XDG data
/// dir, entirely outside `root`'s git working tree; `git add` refuses a path
/// outside the repository, so a source directory found there is left to the
/// dotfile manager's own history instead (see DESIGN.md).
fn paths_to_stage(root: &Path, snapshot_path: &Path, dotfile_source_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![
        snapshot_path.to_path_buf(),
        zerb_script::active_marker_path(root),
        zerb_script::active_symlink_path(root),
    ];
    if let Some(source_dir) = dotfile_source_dir {
        if source_dir.starts_with(root) {
            paths.push(source_dir.to_path_buf());
        }
    }
    paths
}

/// `zerb config add`: track new dotfiles. `opts` applies uniformly to every
/// path in this call (spec §4.12 doesn't model per-path option overrides for
/// a single invocation).
pub fn config_add(
    root: &Path,
    platform: &PlatformInfo,
    home: &Path,
    raw_paths: &[String],
    opts: ConfigFileOptions,
    chezmoi: &dyn Chezmoi,
) -> Result<Transaction, ZerbError> {
    let lock_path = zerb_script::lock_path(root);
    let _guard = zerb_txn::acquire_lock(&lock_path)?;
    let txn_dir = zerb_script::txn_dir(root);

    let mut config = read_active_config(root, platform, home)?;
    let normalized = reject_self_duplicates(raw_paths, home)?;

    let mut path_txns = Vec::with_capacity(raw_paths.len());
    for (raw, normalized_path) in raw_paths.iter().zip(&normalized) {
        if config.find_config(raw, home).is_some() {
            return Err(ZerbError::validation("path", format!("path already tracked: {raw}")));
        }
        if fs::metadata(normalized_path).map(|m| m.is_dir()).unwrap_or(false) && !opts.recursive {
            return Err(ZerbError::validation(
                "path",
                format!("{raw} is a directory; pass --recursive to track it"),
            ));
        }
        path_txns.push(PathTxn::new(
            raw.clone(),
            PathOptions {
                recursive: opts.recursive,
                template: opts.template,
                secrets: opts.secrets,
                private: opts.private,
            },
        ));
    }

    let mut txn = Transaction::new(Operation::Add, path_txns);
    journal::save(&txn, &txn_dir)?;

    for (raw, normalized_path) in raw_paths.iter().zip(&normalized) {
        txn.update_path_state(raw, PathState::InProgress, None, None);
        journal::save(&txn, &txn_dir)?;

        match chezmoi.add(normalized_path, opts) {
            Ok(created) => {
                let created: Vec<String> = created.iter().map(|p| p.display().to_string()).collect();
                txn.update_path_state(raw, PathState::Completed, Some(created), None);
                journal::save(&txn, &txn_dir)?;
            }
            Err(err) => {
                txn.update_path_state(raw, PathState::Failed, None, Some(err.to_string()));
                journal::save(&txn, &txn_dir)?;
                return Err(abort_with_journal_reference(&txn, &txn_dir, err));
            }
        }

        config.configs.push(ConfigFile {
            path: raw.clone(),
            recursive: opts.recursive,
            template: opts.template,
            secrets: opts.secrets,
            private: opts.private,
        });
    }

    if config.configs.len() > MAX_CONFIGS {
        return Err(ZerbError::validation(
            "configs",
            format!("config cannot track more than {MAX_CONFIGS} paths"),
        ));
    }

    finish_transaction(root, &mut txn, &txn_dir, &config, "Add", raw_paths, chezmoi)
}

/// `zerb config remove`: stop tracking dotfiles. `purge` additionally
/// deletes the live file from disk once it's confirmed to sit under `$HOME`.
pub fn config_remove(
    root: &Path,
    platform: &PlatformInfo,
    home: &Path,
    raw_paths: &[String],
    purge: bool,
    chezmoi: &dyn Chezmoi,
) -> Result<Transaction, ZerbError> {
    let lock_path = zerb_script::lock_path(root);
    let _guard = zerb_txn::acquire_lock(&lock_path)?;
    let txn_dir = zerb_script::txn_dir(root);

    let mut config = read_active_config(root, platform, home)?;
    let normalized = reject_self_duplicates(raw_paths, home)?;

    let mut path_txns = Vec::with_capacity(raw_paths.len());
    for raw in raw_paths {
        if config.find_config(raw, home).is_none() {
            return Err(ZerbError::validation("path", format!("path is not tracked: {raw}")));
        }
        path_txns.push(PathTxn::new(raw.clone(), PathOptions::default()));
    }

    let mut txn = Transaction::new(Operation::Remove, path_txns);
    journal::save(&txn, &txn_dir)?;

    for (raw, normalized_path) in raw_paths.iter().zip(&normalized) {
        txn.update_path_state(raw, PathState::InProgress, None, None);
        journal::save(&txn, &txn_dir)?;

        match chezmoi.remove(normalized_path) {
            Ok(()) => {
                txn.update_path_state(raw, PathState::Completed, Some(vec![]), None);
                journal::save(&txn, &txn_dir)?;
            }
            Err(err) => {
                txn.update_path_state(raw, PathState::Failed, None, Some(err.to_string()));
                journal::save(&txn, &txn_dir)?;
                return Err(abort_with_journal_reference(&txn, &txn_dir, err));
            }
        }

        let (remaining, _removed) = config.remove_config(raw, home);
        config.configs = remaining;

        if purge {
            if !Config::is_within_home(raw, home) {
                return Err(ZerbError::OutsideHome(raw.clone()));
            }
            let _ = fs::remove_file(normalized_path);
        }
    }

    finish_transaction(root, &mut txn, &txn_dir, &config, "Remove", raw_paths, chezmoi)
}

fn finish_transaction(
    root: &Path,
    txn: &mut Transaction,
    txn_dir: &Path,
    config: &Config,
    verb: &str,
    raw_paths: &[String],
    chezmoi: &dyn Chezmoi,
) -> Result<Transaction, ZerbError> {
    let snapshot_path = zerb_apply::write_snapshot(root, config)?;
    txn.config_updated = true;
    journal::save(txn, txn_dir)?;

    let subject = format!("{verb} {} config{}", raw_paths.len(), if raw_paths.len() == 1 { "" } else { "s" });
    let body = raw_paths.join("\n");
    let dotfile_source_dir = chezmoi.source_dir().ok();
    let stage_paths = paths_to_stage(root, &snapshot_path, dotfile_source_dir.as_deref());
    let stage_paths: Vec<PathBuf> = stage_paths
        .into_iter()
        .map(|p| p.strip_prefix(root).map(Path::to_path_buf).unwrap_or(p))
        .collect();

    let head = git::commit_paths(root, &stage_paths, &subject, &body)?;
    tracing::info!(txn_id = %txn.id, commit = %head, "config change committed");
    txn.git_committed = true;
    txn.head_commit = Some(head);
    journal::save(txn, txn_dir)?;

    Ok(txn.clone())
}
