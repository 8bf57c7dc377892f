//! Apply pipelines: Adopt (C9) rewrites the baseline to match the
//! environment; Revert (C10) drives the installer to match the baseline.

pub mod adopt;
pub mod pipeline;
pub mod revert;
pub mod snapshot;

pub use adopt::{adopt_config, adopt_tools};
pub use pipeline::run_adopt;
pub use revert::{revert_all, revert_one, RevertAction};
pub use snapshot::{compose_timestamp, write_snapshot};
