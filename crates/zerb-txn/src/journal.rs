//! Transaction journal (C11, spec §3, §4.11): a crash-recoverable JSON
//! record of a multi-step `config add`/`config remove` operation.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use zerb_core::ZerbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathState {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Per-path options captured at transaction creation time, enough to retry
/// or roll back (spec §4.11 recovery contract).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathOptions {
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub template: bool,
    #[serde(default)]
    pub secrets: bool,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathTxn {
    pub path: String,
    pub state: PathState,
    #[serde(default)]
    pub options: PathOptions,
    #[serde(default)]
    pub created_source_files: Vec<String>,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl PathTxn {
    pub fn new(path: impl Into<String>, options: PathOptions) -> Self {
        PathTxn {
            path: path.into(),
            state: PathState::Pending,
            options,
            created_source_files: Vec::new(),
            last_error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub id: Uuid,
    pub operation: Operation,
    pub timestamp: DateTime<Utc>,
    pub paths: Vec<PathTxn>,
    pub config_updated: bool,
    pub git_committed: bool,
    pub head_commit: Option<String>,
}

impl Transaction {
    pub fn new(operation: Operation, paths: Vec<PathTxn>) -> Self {
        Transaction {
            version: 1,
            id: Uuid::new_v4(),
            operation,
            timestamp: Utc::now(),
            paths,
            config_updated: false,
            git_committed: false,
            head_commit: None,
        }
    }

    /// `UpdatePathState`: the sole mutator for a path's lifecycle state.
    pub fn update_path_state(
        &mut self,
        path: &str,
        new_state: PathState,
        created_files: Option<Vec<String>>,
        err: Option<String>,
    ) {
        if let Some(entry) = self.paths.iter_mut().find(|p| p.path == path) {
            entry.state = new_state;
            if let Some(files) = created_files {
                entry.created_source_files = files;
            }
            entry.last_error = err;
        }
    }

    pub fn has_pending_paths(&self) -> bool {
        self.paths.iter().any(|p| matches!(p.state, PathState::Pending))
    }

    pub fn all_paths_completed(&self) -> bool {
        self.paths.iter().all(|p| matches!(p.state, PathState::Completed))
    }

    /// `GetCreatedFiles`: flat-map of every path's created source files, for
    /// eventual compensation.
    pub fn get_created_files(&self) -> Vec<String> {
        self.paths.iter().flat_map(|p| p.created_source_files.iter().cloned()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.all_paths_completed() && self.config_updated && self.git_committed
    }

    pub fn journal_path(&self, txn_dir: &Path) -> PathBuf {
        let op = match self.operation {
            Operation::Add => "add",
            Operation::Remove => "remove",
        };
        txn_dir.join(format!("txn-config-{op}-{}.json", self.id))
    }
}

/// Atomic persistence (spec §4.11): serialize to `<final>.tmp`, rename into
/// place, then fsync the parent directory so the rename itself is durable.
pub fn save(txn: &Transaction, txn_dir: &Path) -> Result<(), ZerbError> {
    fs::create_dir_all(txn_dir).map_err(io_err("failed to create transaction directory"))?;

    let final_path = txn.journal_path(txn_dir);
    let tmp_path = final_path.with_extension("json.tmp");

    let body = serde_json::to_vec_pretty(txn)
        .map_err(|e| ZerbError::parse_with_detail("failed to serialize transaction", e.to_string()))?;

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&tmp_path)
            .map_err(io_err("failed to open transaction temp file"))?;
        file.write_all(&body).map_err(io_err("failed to write transaction temp file"))?;
        file.sync_all().map_err(io_err("failed to fsync transaction temp file"))?;
    }

    fs::rename(&tmp_path, &final_path).map_err(io_err("failed to install transaction journal"))?;

    let dir = File::open(txn_dir).map_err(io_err("failed to open transaction directory"))?;
    dir.sync_all().map_err(io_err("failed to fsync transaction directory"))?;

    Ok(())
}

pub fn load(path: &Path) -> Result<Transaction, ZerbError> {
    let text = fs::read_to_string(path).map_err(io_err("failed to read transaction journal"))?;
    serde_json::from_str(&text)
        .map_err(|e| ZerbError::parse_with_detail("failed to parse transaction journal", e.to_string()))
}

fn io_err(message: &'static str) -> impl Fn(std::io::Error) -> ZerbError {
    move |e| ZerbError::SubprocessError {
        message: message.to_string(),
        detail: zerb_core::error::translate_boundary_message(&e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_transaction() -> Transaction {
        Transaction::new(
            Operation::Add,
            vec![PathTxn::new("/home/u/.bashrc", PathOptions::default())],
        )
    }

    #[test]
    fn new_transaction_starts_pending() {
        let txn = sample_transaction();
        assert_eq!(txn.version, 1);
        assert!(txn.has_pending_paths());
        assert!(!txn.all_paths_completed());
    }

    #[test]
    fn update_path_state_transitions_single_path() {
        let mut txn = sample_transaction();
        txn.update_path_state("/home/u/.bashrc", PathState::InProgress, None, None);
        assert!(!txn.has_pending_paths());
        txn.update_path_state(
            "/home/u/.bashrc",
            PathState::Completed,
            Some(vec!["/home/u/.local/share/chezmoi/dot_bashrc".to_string()]),
            None,
        );
        assert!(txn.all_paths_completed());
        assert_eq!(txn.get_created_files().len(), 1);
    }

    #[test]
    fn update_path_state_records_failure() {
        let mut txn = sample_transaction();
        txn.update_path_state("/home/u/.bashrc", PathState::Failed, None, Some("disk full".to_string()));
        assert!(!txn.all_paths_completed());
        assert_eq!(txn.paths[0].last_error.as_deref(), Some("disk full"));
    }

    #[test]
    fn is_complete_requires_config_and_git_flags() {
        let mut txn = sample_transaction();
        txn.update_path_state("/home/u/.bashrc", PathState::Completed, Some(vec![]), None);
        assert!(!txn.is_complete());
        txn.config_updated = true;
        txn.git_committed = true;
        assert!(txn.is_complete());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let txn = sample_transaction();
        save(&txn, dir.path()).unwrap();
        let path = txn.journal_path(dir.path());
        assert!(path.exists());
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.id, txn.id);
        assert_eq!(loaded.paths.len(), 1);
    }

    // P8: after `save`, no `.tmp` file remains and the final file is valid JSON.
    #[test]
    fn property_journal_atomicity_leaves_no_tmp_artifact() {
        let dir = tempdir().unwrap();
        let mut txn = sample_transaction();
        for _ in 0..5 {
            txn.update_path_state("/home/u/.bashrc", PathState::InProgress, None, None);
            save(&txn, dir.path()).unwrap();
            txn.update_path_state("/home/u/.bashrc", PathState::Completed, Some(vec![]), None);
            save(&txn, dir.path()).unwrap();
        }
        let tmp_path = txn.journal_path(dir.path()).with_extension("json.tmp");
        assert!(!tmp_path.exists());
        let loaded = load(&txn.journal_path(dir.path())).unwrap();
        assert!(loaded.all_paths_completed());
    }

    #[test]
    fn journal_path_names_include_operation_and_id() {
        let txn = Transaction::new(Operation::Remove, vec![]);
        let dir = PathBuf::from("/tmp/zerb/.txn");
        let path = txn.journal_path(&dir);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("txn-config-remove-"));
        assert!(name.ends_with(".json"));
    }
}
