//! Runtime configuration from the environment.
//!
//! # Responsibility
//! - Collect notes ref, recovery search limit, editor and logging settings.
//! - Keep environment access behind a lookup function so callers can test it.
//!
//! # Invariants
//! - Unset or blank variables fall back to defaults.
//! - Malformed values are rejected, never silently replaced.

use crate::graph::DEFAULT_NOTES_REF;
use crate::logging::default_log_level;
use crate::service::recovery_service::DEFAULT_SEARCH_LIMIT;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_NOTES_REF: &str = "GIT_REMARKS_REF";
pub const ENV_SEARCH_LIMIT: &str = "GIT_REMARKS_SEARCH_LIMIT";
pub const ENV_EDITOR: &str = "GIT_REMARKS_EDITOR";
pub const ENV_LOG_LEVEL: &str = "GIT_REMARKS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "GIT_REMARKS_LOG_DIR";

const FALLBACK_EDITOR: &str = "vi";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}=`{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemarksConfig {
    /// Notes ref name under `refs/notes/`.
    pub notes_ref: String,
    /// Ancestors fingerprinted per orphan during recovery.
    pub recovery_search_limit: usize,
    /// Editor command line, possibly with arguments.
    pub editor: String,
    pub log_level: String,
    /// Absolute log directory; `None` means `<git-dir>/remarks/logs`.
    pub log_dir: Option<PathBuf>,
}

impl Default for RemarksConfig {
    fn default() -> Self {
        Self {
            notes_ref: DEFAULT_NOTES_REF.to_string(),
            recovery_search_limit: DEFAULT_SEARCH_LIMIT,
            editor: FALLBACK_EDITOR.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl RemarksConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(notes_ref) = get(ENV_NOTES_REF) {
            if notes_ref.chars().any(char::is_whitespace) || notes_ref.starts_with('-') {
                return Err(ConfigError::InvalidValue {
                    key: ENV_NOTES_REF,
                    value: notes_ref,
                    reason: "must be a single ref name",
                });
            }
            config.notes_ref = notes_ref;
        }

        if let Some(limit) = get(ENV_SEARCH_LIMIT) {
            config.recovery_search_limit =
                limit.parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_SEARCH_LIMIT,
                    value: limit.clone(),
                    reason: "expected a non-negative integer",
                })?;
        }

        if let Some(editor) = get(ENV_EDITOR)
            .or_else(|| get("VISUAL"))
            .or_else(|| get("EDITOR"))
        {
            config.editor = editor;
        }

        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level = level;
        }

        if let Some(dir) = get(ENV_LOG_DIR) {
            let path = PathBuf::from(&dir);
            if !path.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_LOG_DIR,
                    value: dir,
                    reason: "must be an absolute path",
                });
            }
            config.log_dir = Some(path);
        }

        Ok(config)
    }
}
