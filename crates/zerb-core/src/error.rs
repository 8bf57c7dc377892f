//! The closed error taxonomy (spec §7). Every fallible call in the tree
//! returns `Result<_, ZerbError>` and call sites that only propagate use
//! `?`; nothing downcasts or boxes into a looser error type.

#[derive(thiserror::Error, Debug)]
pub enum ZerbError {
    #[error("config script exceeds maximum size")]
    PayloadTooLarge,

    #[error("{message}")]
    ParseError { message: String, detail: String },

    #[error("{message}")]
    ValidationError { field: String, message: String },

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("config is locked by another process (pid {pid}, since {since})")]
    LockExists { pid: u32, since: String },

    #[error("{message}")]
    SubprocessError { message: String, detail: String },

    #[error("rejected unsafe value crossing subprocess boundary: {0}")]
    InjectionRejected(String),

    #[error("path is outside $HOME: {0}")]
    OutsideHome(String),

    #[error("no active zerb configuration found; run `zerb config list` after creating one")]
    NotInitialized,
}

impl ZerbError {
    pub fn parse(message: impl Into<String>) -> Self {
        ZerbError::ParseError {
            message: message.into(),
            detail: String::new(),
        }
    }

    pub fn parse_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        ZerbError::ParseError {
            message: message.into(),
            detail: sanitize_detail(&detail.into()),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ZerbError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Sanitize interpreter error detail per spec §4.1: truncate tracebacks and
/// replace internal engine names with the neutral word "config".
pub fn sanitize_detail(detail: &str) -> String {
    const MAX_DETAIL_LEN: usize = 2000;
    let replaced = detail
        .replace("mlua::", "config::")
        .replace("lua_", "config_")
        .replace("Lua error", "config error")
        .replace("runtime error", "config error");
    if replaced.len() > MAX_DETAIL_LEN {
        let mut truncated: String = replaced.chars().take(MAX_DETAIL_LEN).collect();
        truncated.push_str(" ... [truncated]");
        truncated
    } else {
        replaced
    }
}

/// Translate a raw external-tool error message to the boundary-safe phrasing
/// required by spec §6 ("Error-message discipline at the boundary").
pub fn translate_boundary_message(raw: &str) -> String {
    if raw.contains("no such file or directory") {
        "file not found".to_string()
    } else if raw.contains("permission denied") {
        "permission denied".to_string()
    } else if raw.contains("is a directory") {
        "path is a directory".to_string()
    } else {
        raw.to_string()
    }
}
