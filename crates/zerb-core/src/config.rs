//! The `Config` data model and its validator (spec §3, §4.2).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ZerbError;
use crate::toolspec::ToolSpec;

pub const MAX_TOOLS: usize = 1000;
pub const MAX_CONFIGS: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub template: bool,
    #[serde(default)]
    pub secrets: bool,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default)]
    pub remote: String,
    #[serde(default)]
    pub branch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub backup_retention: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub configs: Vec<ConfigFile>,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub options: Options,
}

/// Normalize a tilde/absolute path string for equality and home-containment
/// checks, without touching the filesystem. `~` expands against `home`;
/// relative components are not resolved (the spec's "no `..` segment"
/// invariant is checked lexically, independent of this).
fn normalize(raw: &str, home: &Path) -> PathBuf {
    let expanded = if let Some(rest) = raw.strip_prefix("~/") {
        home.join(rest)
    } else if raw == "~" {
        home.to_path_buf()
    } else {
        PathBuf::from(raw)
    };

    let mut normalized = PathBuf::new();
    for component in expanded.components() {
        normalized.push(component);
    }
    normalized
}

/// Validate a single config-file path per spec §3/§4.2: non-empty, no `..`
/// segment, and when absolute must resolve under `home`.
fn validate_path(raw: &str, home: &Path) -> Result<(), String> {
    if raw.is_empty() {
        return Err("path must not be empty".to_string());
    }
    if raw.split('/').any(|segment| segment == "..") {
        return Err("path must not contain a '..' segment".to_string());
    }
    let normalized = normalize(raw, home);
    if normalized.is_absolute() && !normalized.starts_with(home) {
        return Err("absolute path must be inside the home directory".to_string());
    }
    Ok(())
}

/// Validate `Git.Remote`: `https://`/`http://` URL, or SSH shorthand
/// `user@host:path`.
fn validate_remote(remote: &str) -> bool {
    if remote.is_empty() {
        return true;
    }
    if remote.starts_with("https://") || remote.starts_with("http://") {
        return true;
    }
    // SSH shorthand: user@host:path, no whitespace, exactly one '@' and at
    // least one ':' after it.
    let Some((user, rest)) = remote.split_once('@') else {
        return false;
    };
    if user.is_empty() || remote.contains(' ') {
        return false;
    }
    match rest.split_once(':') {
        Some((host, path)) => !host.is_empty() && !path.is_empty(),
        None => false,
    }
}

impl Config {
    /// Run the ordered validation checks from spec §4.2, returning the
    /// *first* failure as a `ValidationError` with an indexed field address.
    pub fn validate(&self, home: &Path) -> Result<(), ZerbError> {
        if self.tools.len() > MAX_TOOLS {
            return Err(ZerbError::validation(
                "tools",
                format!("must contain at most {MAX_TOOLS} entries"),
            ));
        }
        for (i, raw) in self.tools.iter().enumerate() {
            if let Err(message) = ToolSpec::parse(raw) {
                return Err(ZerbError::validation(format!("tools[{i}]"), message));
            }
        }

        if self.configs.len() > MAX_CONFIGS {
            return Err(ZerbError::validation(
                "configs",
                format!("must contain at most {MAX_CONFIGS} entries"),
            ));
        }
        for (i, cfg) in self.configs.iter().enumerate() {
            if let Err(message) = validate_path(&cfg.path, home) {
                return Err(ZerbError::validation(format!("configs[{i}].path"), message));
            }
        }

        if !validate_remote(&self.git.remote) {
            return Err(ZerbError::validation(
                "git.remote",
                "must be an https(s):// URL or SSH shorthand user@host:path",
            ));
        }

        Ok(())
    }

    /// First `ConfigFile` whose normalized path equals the normalized
    /// argument, if any.
    pub fn find_config(&self, path: &str, home: &Path) -> Option<&ConfigFile> {
        let target = normalize(path, home);
        self.configs
            .iter()
            .find(|cfg| normalize(&cfg.path, home) == target)
    }

    /// A copy of `configs` without the entry matching `path`, plus whether
    /// anything was actually removed.
    pub fn remove_config(&self, path: &str, home: &Path) -> (Vec<ConfigFile>, bool) {
        let target = normalize(path, home);
        let mut removed = false;
        let remaining = self
            .configs
            .iter()
            .filter(|cfg| {
                let matches = normalize(&cfg.path, home) == target;
                if matches {
                    removed = true;
                }
                !matches
            })
            .cloned()
            .collect();
        (remaining, removed)
    }

    /// True iff `path`, once normalized, lives under `home`.
    pub fn is_within_home(path: &str, home: &Path) -> bool {
        normalize(path, home).starts_with(home)
    }
}

/// Stable-preserve-first-occurrence dedup of path strings, comparing by
/// normalized form (spec §4.2 `DeduplicatePaths`).
pub fn deduplicate_paths(paths: &[String], home: &Path) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::with_capacity(paths.len());
    for path in paths {
        let key = normalize(path, home);
        if seen.insert(key) {
            result.push(path.clone());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> PathBuf {
        PathBuf::from("/home/u")
    }

    fn valid_config() -> Config {
        Config {
            meta: Meta {
                name: "dev".to_string(),
                description: "my machine".to_string(),
            },
            tools: vec!["node@20.11.0".to_string(), "cargo:ripgrep@13.0.0".to_string()],
            configs: vec![ConfigFile {
                path: "~/.bashrc".to_string(),
                recursive: false,
                template: false,
                secrets: false,
                private: false,
            }],
            git: GitConfig {
                remote: "git@github.com:me/dotfiles.git".to_string(),
                branch: "main".to_string(),
            },
            options: Options { backup_retention: 5 },
        }
    }

    #[test]
    fn validate_accepts_well_formed_config() {
        assert!(valid_config().validate(&home()).is_ok());
    }

    #[test]
    fn validate_rejects_too_many_tools() {
        let mut config = valid_config();
        config.tools = (0..MAX_TOOLS + 1).map(|i| format!("tool{i}")).collect();
        let err = config.validate(&home()).unwrap_err();
        match err {
            ZerbError::ValidationError { field, .. } => assert_eq!(field, "tools"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn validate_rejects_bad_toolspec_with_indexed_field() {
        let mut config = valid_config();
        config.tools.push("bad spec!".to_string());
        let err = config.validate(&home()).unwrap_err();
        match err {
            ZerbError::ValidationError { field, .. } => assert_eq!(field, "tools[2]"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn validate_rejects_dotdot_path() {
        let mut config = valid_config();
        config.configs.push(ConfigFile {
            path: "../etc/passwd".to_string(),
            recursive: false,
            template: false,
            secrets: false,
            private: false,
        });
        let err = config.validate(&home()).unwrap_err();
        match err {
            ZerbError::ValidationError { field, .. } => assert_eq!(field, "configs[1].path"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn validate_rejects_absolute_path_outside_home() {
        let mut config = valid_config();
        config.configs.push(ConfigFile {
            path: "/etc/passwd".to_string(),
            recursive: false,
            template: false,
            secrets: false,
            private: false,
        });
        assert!(config.validate(&home()).is_err());
    }

    #[test]
    fn validate_accepts_https_remote() {
        let mut config = valid_config();
        config.git.remote = "https://github.com/me/dotfiles.git".to_string();
        assert!(config.validate(&home()).is_ok());
    }

    #[test]
    fn validate_rejects_malformed_remote() {
        let mut config = valid_config();
        config.git.remote = "not-a-remote".to_string();
        let err = config.validate(&home()).unwrap_err();
        match err {
            ZerbError::ValidationError { field, .. } => assert_eq!(field, "git.remote"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn validate_checks_run_in_order_first_failure_wins() {
        // Both tools and configs are invalid; tools must be reported first.
        let mut config = valid_config();
        config.tools.push("bad spec!".to_string());
        config.configs.push(ConfigFile {
            path: "../etc/passwd".to_string(),
            recursive: false,
            template: false,
            secrets: false,
            private: false,
        });
        let err = config.validate(&home()).unwrap_err();
        match err {
            ZerbError::ValidationError { field, .. } => assert_eq!(field, "tools[2]"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn find_config_matches_normalized_tilde_path() {
        let config = valid_config();
        let found = config.find_config("/home/u/.bashrc", &home());
        assert!(found.is_some());
    }

    #[test]
    fn find_config_returns_none_when_absent() {
        let config = valid_config();
        assert!(config.find_config("~/.zshrc", &home()).is_none());
    }

    #[test]
    fn remove_config_reports_removed_true() {
        let config = valid_config();
        let (remaining, removed) = config.remove_config("~/.bashrc", &home());
        assert!(removed);
        assert!(remaining.is_empty());
    }

    #[test]
    fn remove_config_reports_removed_false_when_absent() {
        let config = valid_config();
        let (remaining, removed) = config.remove_config("~/.zshrc", &home());
        assert!(!removed);
        assert_eq!(remaining.len(), 1);
    }

    #[test]
    fn deduplicate_paths_preserves_first_occurrence_order() {
        let paths = vec![
            "~/.bashrc".to_string(),
            "~/.zshrc".to_string(),
            "/home/u/.bashrc".to_string(),
        ];
        let result = deduplicate_paths(&paths, &home());
        assert_eq!(result, vec!["~/.bashrc".to_string(), "~/.zshrc".to_string()]);
    }

    #[test]
    fn is_within_home_true_for_tilde_path() {
        assert!(Config::is_within_home("~/.bashrc", &home()));
    }

    #[test]
    fn is_within_home_false_for_outside_path() {
        assert!(!Config::is_within_home("/etc/passwd", &home()));
    }

    // P6: path equality for find/remove is by normalized form, not raw string.
    #[test]
    fn property_path_equality_is_normalized() {
        let config = valid_config();
        let by_tilde = config.find_config("~/.bashrc", &home());
        let by_absolute = config.find_config("/home/u/.bashrc", &home());
        assert_eq!(by_tilde, by_absolute);
    }
}
