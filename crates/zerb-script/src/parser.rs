//! Parser (C3, spec §4.3): drives the sandbox VM and performs a typed,
//! tolerant extraction of `Config` from the `zerb` global.

use std::time::{Duration, Instant};

use mlua::{Lua, Value};
use zerb_core::{Config, ConfigFile, GitConfig, Meta, Options, ZerbError};
use zerb_platform::PlatformInfo;

const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

/// Parse `source` into a validated `Config`. `deadline` is the evaluation
/// budget; pass `None` to get the 5-second default. Fails fast if `deadline`
/// is already elapsed relative to `Instant::now()` plus zero (there is no
/// separate external cancellation token at this layer — callers cancel by
/// not calling this function).
pub fn parse(
    source: &str,
    platform: &PlatformInfo,
    deadline: Option<Duration>,
    home: &std::path::Path,
) -> Result<Config, ZerbError> {
    let deadline = deadline.unwrap_or(DEFAULT_DEADLINE);
    let start = Instant::now();
    if start.elapsed() >= deadline {
        return Err(ZerbError::Timeout("deadline already elapsed".to_string()));
    }

    let config = zerb_sandbox::evaluate(source, platform, deadline, |lua, zerb| {
        extract_config(lua, zerb)
    })?;

    config
        .validate(home)
        .map_err(|err| match err {
            ZerbError::ValidationError { field, message } => ZerbError::parse_with_detail(
                "config validation failed",
                format!("{field}: {message}"),
            ),
            other => other,
        })?;

    Ok(config)
}

fn extract_config(lua: &Lua, zerb: Value) -> Result<Config, ZerbError> {
    let table = match zerb {
        Value::Table(t) => t,
        _ => return Err(ZerbError::parse("missing or invalid 'zerb' table")),
    };

    let meta = extract_meta(&table)?;
    let tools = extract_tools(&table)?;
    let configs = extract_configs(&table)?;
    let git = extract_git(&table)?;
    let options = extract_options(&table)?;
    let _ = lua;

    Ok(Config {
        meta,
        tools,
        configs,
        git,
        options,
    })
}

fn extract_meta(table: &mlua::Table) -> Result<Meta, ZerbError> {
    let Ok(Value::Table(meta_table)) = table.get::<Value>("meta") else {
        return Ok(Meta::default());
    };
    let name: String = meta_table.get("name").unwrap_or_default();
    let description: String = meta_table.get("description").unwrap_or_default();
    Ok(Meta { name, description })
}

fn extract_tools(table: &mlua::Table) -> Result<Vec<String>, ZerbError> {
    let Ok(Value::Table(tools_table)) = table.get::<Value>("tools") else {
        return Ok(Vec::new());
    };
    let mut tools = Vec::new();
    // Iterate the numeric sequence; skip nil holes (platform conditionals)
    // and drop non-string values silently (spec §4.3).
    let len = tools_table.raw_len();
    for i in 1..=len {
        match tools_table.get::<Value>(i) {
            Ok(Value::String(s)) => {
                if let Ok(s) = s.to_str() {
                    tools.push(s.to_string());
                }
            }
            _ => continue,
        }
    }
    Ok(tools)
}

fn extract_configs(table: &mlua::Table) -> Result<Vec<ConfigFile>, ZerbError> {
    let Ok(Value::Table(configs_table)) = table.get::<Value>("configs") else {
        return Ok(Vec::new());
    };
    let mut configs = Vec::new();
    let len = configs_table.raw_len();
    for i in 1..=len {
        match configs_table.get::<Value>(i) {
            Ok(Value::String(s)) => {
                if let Ok(path) = s.to_str() {
                    configs.push(ConfigFile {
                        path: path.to_string(),
                        recursive: false,
                        template: false,
                        secrets: false,
                        private: false,
                    });
                }
            }
            Ok(Value::Table(entry)) => {
                let path: Option<String> = entry.get("path").ok();
                let Some(path) = path else { continue };
                configs.push(ConfigFile {
                    path,
                    recursive: entry.get("recursive").unwrap_or(false),
                    template: entry.get("template").unwrap_or(false),
                    secrets: entry.get("secrets").unwrap_or(false),
                    private: entry.get("private").unwrap_or(false),
                });
            }
            _ => continue,
        }
    }
    Ok(configs)
}

fn extract_git(table: &mlua::Table) -> Result<GitConfig, ZerbError> {
    let Ok(Value::Table(git_table)) = table.get::<Value>("git") else {
        return Ok(GitConfig::default());
    };
    Ok(GitConfig {
        remote: git_table.get("remote").unwrap_or_default(),
        branch: git_table.get("branch").unwrap_or_default(),
    })
}

fn extract_options(table: &mlua::Table) -> Result<Options, ZerbError> {
    let Ok(Value::Table(options_table)) = table.get::<Value>("options") else {
        return Ok(Options::default());
    };
    Ok(Options {
        backup_retention: options_table.get("backup_retention").unwrap_or(0),
    })
}
