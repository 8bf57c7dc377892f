//! Config-add/config-remove orchestration (C12) and the git plumbing it
//! drives at the end of every mutation.

pub mod config_service;
pub mod git;

pub use config_service::{config_add, config_remove};
