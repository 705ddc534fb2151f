//! `post-rewrite` hook installation.
//!
//! # Responsibility
//! - Install the hook that feeds rewrite mappings to `migrate-rewrites`.
//! - Append to a foreign hook instead of replacing it.
//!
//! # Invariants
//! - Installing twice leaves the hook unchanged.

use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const HOOK_NAME: &str = "post-rewrite";
const HOOK_MARKERS: [&str; 2] = ["git-remarks", "git remarks"];

const POST_REWRITE_HOOK: &str = r#"#!/bin/sh
# git-remarks post-rewrite hook
# Migrates remarks when commits are rewritten (rebase, amend)

rewrite_type="$1"

if ! command -v git-remarks >/dev/null 2>&1; then
    exit 0
fi

git-remarks migrate-rewrites "$rewrite_type"
"#;

const APPENDED_HOOK: &str = r#"
# git-remarks hook (appended)
if command -v git-remarks >/dev/null 2>&1; then
    git-remarks migrate-rewrites "$1"
fi
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookInstall {
    Installed(PathBuf),
    /// Existing foreign hook got the call appended.
    Appended(PathBuf),
    AlreadyInstalled(PathBuf),
}

#[derive(Debug)]
pub enum HookError {
    Io { path: PathBuf, source: std::io::Error },
}

impl Display for HookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to write hook `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for HookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Installs the `post-rewrite` hook under `<git_dir>/hooks`.
pub fn install_post_rewrite_hook(git_dir: &Path) -> Result<HookInstall, HookError> {
    let hooks_dir = git_dir.join("hooks");
    let hook_path = hooks_dir.join(HOOK_NAME);
    let io_err = |source| HookError::Io {
        path: hook_path.clone(),
        source,
    };

    fs::create_dir_all(&hooks_dir).map_err(io_err)?;

    if hook_path.exists() {
        let existing = fs::read_to_string(&hook_path).map_err(io_err)?;
        if HOOK_MARKERS.iter().any(|marker| existing.contains(marker)) {
            return Ok(HookInstall::AlreadyInstalled(hook_path));
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&hook_path)
            .map_err(io_err)?;
        file.write_all(APPENDED_HOOK.as_bytes()).map_err(io_err)?;
        info!("event=hook_install module=hook status=ok mode=append");
        return Ok(HookInstall::Appended(hook_path));
    }

    fs::write(&hook_path, POST_REWRITE_HOOK).map_err(io_err)?;
    make_executable(&hook_path).map_err(io_err)?;
    info!("event=hook_install module=hook status=ok mode=create");
    Ok(HookInstall::Installed(hook_path))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
