//! Injection-boundary validation (spec §4.10, §9): every tool-name /
//! version string crossing into a subprocess argument list must pass
//! through these checks first. Shared by the Revert pipeline (C10) and any
//! concrete `Installer` adapter, since the adapter is the actual subprocess
//! boundary.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ZerbError;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_/-]+$").expect("valid regex"));
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._+-]+$").expect("valid regex"));

/// Characters that are never acceptable in a value crossing the subprocess
/// boundary, checked ahead of the regexes for a clearer rejection message.
const META_CHARACTERS: &[char] = &[';', '|', '&', '`', '$', '(', ')', ' ', '\t', '\n', '\r'];

fn reject_meta_characters(value: &str) -> Result<(), ZerbError> {
    if value.chars().any(|c| META_CHARACTERS.contains(&c)) {
        return Err(ZerbError::InjectionRejected(value.to_string()));
    }
    Ok(())
}

/// Validate a tool name per `^[A-Za-z0-9_/-]+$`.
pub fn validate_tool_name(name: &str) -> Result<(), ZerbError> {
    reject_meta_characters(name)?;
    if NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ZerbError::InjectionRejected(name.to_string()))
    }
}

/// Validate a version string per `^[A-Za-z0-9._+-]+$`.
pub fn validate_version(version: &str) -> Result<(), ZerbError> {
    reject_meta_characters(version)?;
    if VERSION_RE.is_match(version) {
        Ok(())
    } else {
        Err(ZerbError::InjectionRejected(version.to_string()))
    }
}
