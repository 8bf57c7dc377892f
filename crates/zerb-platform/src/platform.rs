//! Platform identity exposed to the sandbox VM's `platform` table (spec
//! §4.1, §9 supplement). Deliberately shallow: deep platform probing is out
//! of scope, this only answers "what OS/arch is this process running on".

use tracing::debug;

/// Static facts about the host the engine is running on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    /// Normalized OS family name: `"linux"`, `"macos"`, `"windows"`, or the
    /// raw `std::env::consts::OS` value for anything else.
    pub os: String,
    /// Normalized architecture: `"x86_64"`, `"aarch64"`, or the raw
    /// `std::env::consts::ARCH` value.
    pub arch: String,
    /// Unmodified `std::env::consts::ARCH`.
    pub arch_raw: String,
    /// `"{os}-{arch}"`, the canonical tool-install platform tag.
    pub platform: String,
    /// Broad OS family grouping: `"unix"` or `"windows"`.
    pub family: String,
    /// Best-effort distribution/version string (e.g. Linux `/etc/os-release`
    /// `PRETTY_NAME`). `None` if it can't be determined; probe failure is
    /// swallowed rather than propagated (spec §7 recovery policy).
    pub version: Option<String>,
    pub is_linux: bool,
    pub is_macos: bool,
    pub is_windows: bool,
}

impl PlatformInfo {
    /// Detect the current platform. Never fails: a distro-probe failure just
    /// leaves `version` as `None`.
    pub fn detect() -> Self {
        let os = std::env::consts::OS.to_string();
        let arch_raw = std::env::consts::ARCH.to_string();
        let arch = normalize_arch(&arch_raw);
        let family = std::env::consts::FAMILY.to_string();
        let version = probe_version(&os);

        PlatformInfo {
            platform: format!("{os}-{arch}"),
            is_linux: os == "linux",
            is_macos: os == "macos",
            is_windows: os == "windows",
            os,
            arch,
            arch_raw,
            family,
            version,
        }
    }
}

fn normalize_arch(raw: &str) -> String {
    match raw {
        "x86_64" | "aarch64" => raw.to_string(),
        "arm" => "arm".to_string(),
        other => other.to_string(),
    }
}

fn probe_version(os: &str) -> Option<String> {
    if os != "linux" {
        return None;
    }
    let contents = std::fs::read_to_string("/etc/os-release").ok()?;
    for line in contents.lines() {
        if let Some(value) = line.strip_prefix("PRETTY_NAME=") {
            let trimmed = value.trim_matches('"');
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    debug!("no PRETTY_NAME found in /etc/os-release");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_sets_exactly_one_os_flag() {
        let info = PlatformInfo::detect();
        let flags = [info.is_linux, info.is_macos, info.is_windows];
        assert_eq!(flags.iter().filter(|f| **f).count(), 1);
    }

    #[test]
    fn platform_tag_combines_os_and_arch() {
        let info = PlatformInfo::detect();
        assert_eq!(info.platform, format!("{}-{}", info.os, info.arch));
    }

    #[test]
    fn normalize_arch_passes_through_known_values() {
        assert_eq!(normalize_arch("x86_64"), "x86_64");
        assert_eq!(normalize_arch("aarch64"), "aarch64");
    }

    #[test]
    fn probe_version_returns_none_for_non_linux() {
        assert_eq!(probe_version("macos"), None);
        assert_eq!(probe_version("windows"), None);
    }
}
