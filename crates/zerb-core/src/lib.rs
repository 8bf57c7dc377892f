//! Pure data model and error taxonomy shared by every `zerb` crate.
//!
//! `zerb-core` has no filesystem or subprocess side effects: it is the
//! vocabulary the rest of the workspace talks in (spec §3, §4.2, §7).

pub mod config;
pub mod drift;
pub mod error;
pub mod injection;
pub mod ports;
pub mod toolspec;

pub use config::{Config, ConfigFile, GitConfig, Meta, Options, MAX_CONFIGS, MAX_TOOLS};
pub use drift::{DriftKind, DriftResult, Tool};
pub use error::ZerbError;
pub use injection::{validate_tool_name, validate_version};
pub use ports::{Chezmoi, ConfigFileOptions, Installer, MinimalEnv};
pub use toolspec::ToolSpec;
