//! Generator (C4, spec §4.4): emits a deterministic, round-trippable Lua
//! script representation of a `Config`.

use zerb_core::{Config, ConfigFile};

const HEADER: &str = "-- generated by zerb; edit with care\n";

/// Quote a string per the fixed escape order: backslash, double-quote,
/// newline, carriage return, tab.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn write_tools(out: &mut String, tools: &[String]) {
    if tools.is_empty() {
        return;
    }
    out.push_str("  tools = {\n");
    for tool in tools {
        out.push_str("    ");
        out.push_str(&quote(tool));
        out.push_str(",\n");
    }
    out.push_str("  },\n");
}

fn write_configs(out: &mut String, configs: &[ConfigFile]) {
    if configs.is_empty() {
        return;
    }
    out.push_str("  configs = {\n");
    for cfg in configs {
        out.push_str("    ");
        if !cfg.recursive && !cfg.template && !cfg.secrets && !cfg.private {
            out.push_str(&quote(&cfg.path));
        } else {
            out.push('{');
            out.push_str(&format!(" path = {}", quote(&cfg.path)));
            if cfg.recursive {
                out.push_str(", recursive = true");
            }
            if cfg.template {
                out.push_str(", template = true");
            }
            if cfg.secrets {
                out.push_str(", secrets = true");
            }
            if cfg.private {
                out.push_str(", private = true");
            }
            out.push_str(" }");
        }
        out.push_str(",\n");
    }
    out.push_str("  },\n");
}

fn write_meta(out: &mut String, config: &Config) {
    if config.meta.name.is_empty() && config.meta.description.is_empty() {
        return;
    }
    out.push_str("  meta = {\n");
    if !config.meta.name.is_empty() {
        out.push_str(&format!("    name = {},\n", quote(&config.meta.name)));
    }
    if !config.meta.description.is_empty() {
        out.push_str(&format!(
            "    description = {},\n",
            quote(&config.meta.description)
        ));
    }
    out.push_str("  },\n");
}

fn write_git(out: &mut String, config: &Config) {
    if config.git.remote.is_empty() && config.git.branch.is_empty() {
        return;
    }
    out.push_str("  git = {\n");
    if !config.git.remote.is_empty() {
        out.push_str(&format!("    remote = {},\n", quote(&config.git.remote)));
    }
    if !config.git.branch.is_empty() {
        out.push_str(&format!("    branch = {},\n", quote(&config.git.branch)));
    }
    out.push_str("  },\n");
}

fn write_options(out: &mut String, config: &Config) {
    if config.options.backup_retention == 0 {
        return;
    }
    out.push_str("  options = {\n");
    out.push_str(&format!(
        "    backup_retention = {},\n",
        config.options.backup_retention
    ));
    out.push_str("  },\n");
}

/// Generate the plain (non-timestamped) script body for `config`.
pub fn generate(config: &Config) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push_str("zerb = {\n");
    write_meta(&mut out, config);
    write_tools(&mut out, &config.tools);
    write_configs(&mut out, &config.configs);
    write_git(&mut out, config);
    write_options(&mut out, config);
    out.push_str("}\n");
    out
}

/// Generate a timestamped snapshot: a local metadata block followed by the
/// same body, trailing `return zerb` so the file is itself loadable
/// (spec §4.4).
pub fn generate_timestamped(config: &Config, timestamp: &str, git_commit: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push_str("local metadata = {\n");
    out.push_str("  version = 1,\n");
    out.push_str(&format!("  timestamp = {},\n", quote(timestamp)));
    if let Some(commit) = git_commit {
        out.push_str(&format!("  git_commit = {},\n", quote(commit)));
    }
    out.push_str("}\n\n");
    out.push_str("zerb = {\n");
    write_meta(&mut out, config);
    write_tools(&mut out, &config.tools);
    write_configs(&mut out, &config.configs);
    write_git(&mut out, config);
    write_options(&mut out, config);
    out.push_str("}\n\n");
    out.push_str("return zerb\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use std::path::PathBuf;
    use zerb_core::{GitConfig, Meta, Options};
    use zerb_platform::PlatformInfo;

    fn platform() -> PlatformInfo {
        PlatformInfo {
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
            arch_raw: "x86_64".to_string(),
            platform: "linux-x86_64".to_string(),
            family: "unix".to_string(),
            version: None,
            is_linux: true,
            is_macos: false,
            is_windows: false,
        }
    }

    fn home() -> PathBuf {
        PathBuf::from("/home/u")
    }

    #[test]
    fn quote_escapes_in_fixed_order() {
        let quoted = quote("a\\b\"c\nd\re\tf");
        assert_eq!(quoted, "\"a\\\\b\\\"c\\nd\\re\\tf\"");
    }

    #[test]
    fn empty_sections_are_omitted() {
        let config = Config::default();
        let script = generate(&config);
        assert!(!script.contains("tools"));
        assert!(!script.contains("configs"));
        assert!(!script.contains("git"));
        assert!(!script.contains("meta"));
        assert!(!script.contains("options"));
    }

    #[test]
    fn bare_config_file_has_no_booleans_emits_as_string() {
        let mut config = Config::default();
        config.configs.push(ConfigFile {
            path: "~/.zshrc".to_string(),
            recursive: false,
            template: false,
            secrets: false,
            private: false,
        });
        let script = generate(&config);
        assert!(script.contains("\"~/.zshrc\","));
        assert!(!script.contains("path ="));
    }

    #[test]
    fn config_file_with_options_emits_as_subtable() {
        let mut config = Config::default();
        config.configs.push(ConfigFile {
            path: "~/.config/nvim".to_string(),
            recursive: true,
            template: false,
            secrets: false,
            private: false,
        });
        let script = generate(&config);
        assert!(script.contains("path = \"~/.config/nvim\""));
        assert!(script.contains("recursive = true"));
        assert!(!script.contains("template = true"));
    }

    #[test]
    fn timestamped_snapshot_trails_return_zerb() {
        let config = Config::default();
        let script = generate_timestamped(&config, "20260728T120000.000Z", None);
        assert!(script.trim_end().ends_with("return zerb"));
        assert!(script.contains("version = 1"));
        assert!(!script.contains("git_commit"));
    }

    #[test]
    fn timestamped_snapshot_includes_git_commit_when_present() {
        let config = Config::default();
        let script = generate_timestamped(&config, "20260728T120000.000Z", Some("abc123"));
        assert!(script.contains("git_commit = \"abc123\""));
    }

    // P1 / scenario 1: round-trip minimal config through parse(generate(c)).
    #[test]
    fn round_trip_minimal_config() {
        let config = Config {
            meta: Meta::default(),
            tools: vec!["node@20.11.0".to_string()],
            configs: vec![ConfigFile {
                path: "~/.zshrc".to_string(),
                recursive: false,
                template: false,
                secrets: false,
                private: false,
            }],
            git: GitConfig::default(),
            options: Options::default(),
        };
        let script = generate(&config);
        let reparsed = parser::parse(&script, &platform(), None, &home()).unwrap();
        assert_eq!(reparsed.tools, config.tools);
        assert_eq!(reparsed.configs, config.configs);
    }

    // P1: round-trip with every optional ConfigFile flag and git/options set.
    #[test]
    fn round_trip_full_config() {
        let config = Config {
            meta: Meta {
                name: "dev box".to_string(),
                description: "primary workstation".to_string(),
            },
            tools: vec!["cargo:ripgrep@13.0.0".to_string(), "node@20.11.0".to_string()],
            configs: vec![ConfigFile {
                path: "~/.config/nvim".to_string(),
                recursive: true,
                template: true,
                secrets: false,
                private: true,
            }],
            git: GitConfig {
                remote: "git@github.com:me/dotfiles.git".to_string(),
                branch: "main".to_string(),
            },
            options: Options { backup_retention: 3 },
        };
        let script = generate(&config);
        let reparsed = parser::parse(&script, &platform(), None, &home()).unwrap();
        assert_eq!(reparsed.tools, config.tools);
        assert_eq!(reparsed.configs, config.configs);
        assert_eq!(reparsed.git, config.git);
        assert_eq!(reparsed.options.backup_retention, config.options.backup_retention);
    }
}
