//! Transaction journal and exclusive config lock (C11, spec §4.11).

pub mod journal;
pub mod lock;

pub use journal::{Operation, PathOptions, PathState, PathTxn, Transaction};
pub use lock::{acquire_lock, LockGuard};
