//! `ToolSpec` string grammar (spec §3): `[backend ":"] name ["@" version]`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Maximum total length of a tool spec string.
pub const MAX_TOOLSPEC_LEN: usize = 256;

static TOOLSPEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([a-z0-9_-]+):)?([a-z0-9_/-]+)(?:@([a-z0-9._-]+))?$").expect("valid regex")
});

/// A parsed `ToolSpec` (spec §3). The `name` field is the *full* declared
/// name (may contain `owner/repo`); `identity()` returns the segment after
/// the last `/`, which is what drift classification keys on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub backend: Option<String>,
    pub name: String,
    pub version: Option<String>,
}

impl ToolSpec {
    /// Parse a raw tool spec string, validating it against the grammar and
    /// the 256-character length cap. Does not check that the named tool or
    /// version actually exist (spec §3: "exact version existence is not
    /// checked").
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() || raw.len() > MAX_TOOLSPEC_LEN {
            return Err(format!(
                "tool spec length must be 1..={MAX_TOOLSPEC_LEN} characters"
            ));
        }
        let caps = TOOLSPEC_RE
            .captures(raw)
            .ok_or_else(|| format!("'{raw}' does not match the tool spec grammar"))?;
        Ok(ToolSpec {
            backend: caps.get(1).map(|m| m.as_str().to_string()),
            name: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
            version: caps.get(3).map(|m| m.as_str().to_string()),
        })
    }

    /// The identity used for diffing: the segment of `name` after the last
    /// `/`, or the whole name if there is none.
    pub fn identity(&self) -> &str {
        match self.name.rsplit_once('/') {
            Some((_, last)) => last,
            None => &self.name,
        }
    }

    /// Rebuild a spec string with the version replaced, preserving the
    /// backend prefix and the original pre-`@` name segment (P5, used by
    /// the adopt pipeline's `VersionMismatch` rewrite).
    pub fn with_version(&self, version: &str) -> ToolSpec {
        ToolSpec {
            backend: self.backend.clone(),
            name: self.name.clone(),
            version: Some(version.to_string()),
        }
    }
}

impl fmt::Display for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(backend) = &self.backend {
            write!(f, "{backend}:")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}
