//! Narrow adapter ports to the two external tools the engine drives: the
//! installer (owns `<root>/installs`) and the dotfile manager (tracks
//! `ConfigFile` entries). These are the only places shell processes are
//! spawned (spec §9); everything else in the workspace talks to `dyn
//! Installer` / `dyn Chezmoi`, never to a concrete shell command.

use std::path::{Path, PathBuf};

use crate::drift::Tool;
use crate::error::ZerbError;

/// The deliberately minimized subprocess environment used for every
/// installer/dotfile-manager invocation (spec §4.7): only the handful of
/// variables the underlying tool actually needs, rooted under the managed
/// directory, never the caller's full environment.
#[derive(Debug, Clone, Default)]
pub struct MinimalEnv {
    pub path: String,
    pub home: String,
    pub user: String,
    pub tmpdir: String,
    pub term: String,
    pub extra: Vec<(String, String)>,
}

/// Options accepted by `Chezmoi::add` (mirrors the `config add` CLI flags).
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigFileOptions {
    pub recursive: bool,
    pub template: bool,
    pub secrets: bool,
    pub private: bool,
}

/// Port to the package/version installer that owns `<root>/installs`.
pub trait Installer {
    /// Full inventory the installer owns, machine-readable.
    fn list(&self, root: &Path, env: &MinimalEnv) -> Result<Vec<Tool>, ZerbError>;
    /// Currently-selected version per tool.
    fn list_current(&self, root: &Path, env: &MinimalEnv) -> Result<Vec<Tool>, ZerbError>;
    fn install(&self, root: &Path, name: &str, version: &str, env: &MinimalEnv) -> Result<(), ZerbError>;
    fn uninstall(&self, root: &Path, name: &str, env: &MinimalEnv) -> Result<(), ZerbError>;
}

/// Port to the dotfile manager that tracks `ConfigFile` entries.
pub trait Chezmoi {
    fn add(&self, path: &Path, opts: ConfigFileOptions) -> Result<Vec<PathBuf>, ZerbError>;
    fn remove(&self, path: &Path) -> Result<(), ZerbError>;
    fn has_file(&self, path: &Path) -> Result<bool, ZerbError>;
    /// The directory the manager keeps its own tracked copies under (its
    /// `source-path`). Used by C12 step 9 to fold that tree into the same
    /// commit when it happens to live inside the managed root; callers must
    /// not assume it does.
    fn source_dir(&self) -> Result<PathBuf, ZerbError>;
}
