//! Platform identity injected into the sandbox VM's `platform` table.

pub mod platform;

pub use platform::PlatformInfo;
